use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rust_htslib::bam;
use rust_htslib::bam::record::{Cigar, CigarString};

use delfies::{AlignedRead, AlignmentSource, Interval, Orientation, Softclip};

pub const BACKGROUND: &[u8] = b"ACGATCGATCGGATCCATGCAAGT";

pub fn background(len: usize) -> Vec<u8> {
    BACKGROUND.repeat(len / BACKGROUND.len() + 1)[..len].to_vec()
}

/// A read given by its aligned block `[start, end)` and optional clips.
#[derive(Debug, Clone)]
pub struct SimRead {
    pub start: u64,
    pub end: u64,
    pub mapq: u8,
    pub flags: u16,
    pub left_clip: Option<Vec<u8>>,
    pub right_clip: Option<Vec<u8>>,
}

impl SimRead {
    pub fn right_clipped(end: u64, clip: &[u8]) -> Self {
        SimRead {
            start: end.saturating_sub(100),
            end,
            mapq: 60,
            flags: 0,
            left_clip: None,
            right_clip: Some(clip.to_vec()),
        }
    }

    pub fn left_clipped(start: u64, clip: &[u8]) -> Self {
        SimRead {
            start,
            end: start + 100,
            mapq: 60,
            flags: 0,
            left_clip: Some(clip.to_vec()),
            right_clip: None,
        }
    }
}

impl AlignedRead for SimRead {
    fn mapq(&self) -> u8 {
        self.mapq
    }

    fn flags(&self) -> u16 {
        self.flags
    }

    fn softclip(&self, orientation: Orientation) -> Option<Softclip> {
        match orientation {
            Orientation::Forward => self
                .right_clip
                .clone()
                .map(|seq| Softclip::new(self.end, orientation, seq)),
            Orientation::Reverse if self.start > 0 => self
                .left_clip
                .clone()
                .map(|seq| Softclip::new(self.start - 1, orientation, seq)),
            Orientation::Reverse => None,
        }
    }
}

/// Reads per contig, held in memory.
#[derive(Debug, Clone, Default)]
pub struct SimSource {
    pub reads: HashMap<String, Vec<SimRead>>,
}

impl SimSource {
    pub fn push(&mut self, contig: &str, read: SimRead) {
        self.reads
            .entry(contig.to_owned())
            .or_insert_with(Vec::new)
            .push(read);
    }
}

impl AlignmentSource for SimSource {
    type Read = SimRead;

    fn has_contig(&self, contig: &str) -> bool {
        self.reads.contains_key(contig)
    }

    fn visit<F>(&mut self, region: &Interval, mut f: F) -> Result<()>
    where
        F: FnMut(&SimRead),
    {
        if let Some(reads) = self.reads.get(region.contig().as_str()) {
            for read in reads {
                let overlaps = region.coordinates().map_or(true, |(start, end)| {
                    read.start <= end + 1 && read.end + 1 >= start
                });
                if overlaps {
                    f(read);
                }
            }
        }
        Ok(())
    }
}

/// Write a single line FASTA together with its index.
pub fn write_reference(dir: &Path, contigs: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.join("genome.fa");
    let mut fasta = String::new();
    let mut fai = String::new();
    for (name, seq) in contigs {
        let header = format!(">{}\n", name);
        let offset = fasta.len() + header.len();
        fai.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            name,
            seq.len(),
            offset,
            seq.len(),
            seq.len() + 1
        ));
        fasta.push_str(&header);
        fasta.push_str(std::str::from_utf8(seq).unwrap());
        fasta.push('\n');
    }
    fs::write(&path, fasta).unwrap();
    fs::write(dir.join("genome.fa.fai"), fai).unwrap();
    path
}

/// Write a coordinate sorted, indexed BAM file. Reads are given as (tid, pos, cigar, seq).
pub fn write_bam(
    dir: &Path,
    contigs: &[(&str, usize)],
    mut reads: Vec<(i32, i64, Vec<Cigar>, Vec<u8>)>,
) -> PathBuf {
    let path = dir.join("reads.bam");
    let sam_header: String = contigs
        .iter()
        .map(|(name, len)| format!("@SQ\tSN:{}\tLN:{}\n", name, len))
        .collect();
    let header =
        bam::Header::from_template(&bam::HeaderView::from_bytes(sam_header.as_bytes()));

    reads.sort_by_key(|(tid, pos, _, _)| (*tid, *pos));
    {
        let mut writer = bam::Writer::from_path(&path, &header, bam::Format::Bam).unwrap();
        for (i, (tid, pos, cigar, seq)) in reads.into_iter().enumerate() {
            let mut record = bam::Record::new();
            let qname = format!("read{}", i);
            let qual = vec![30; seq.len()];
            record.set(qname.as_bytes(), Some(&CigarString(cigar)), &seq, &qual);
            record.set_tid(tid);
            record.set_pos(pos);
            record.set_mtid(-1);
            record.set_mpos(-1);
            record.set_mapq(60);
            record.set_flags(0);
            writer.write(&record).unwrap();
        }
    }
    bam::index::build(&path, None, bam::index::Type::Bai, 1).unwrap();
    path
}
