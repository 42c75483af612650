// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Access to aligned reads.
//!
//! The breakpoint detection only sees reads through the `AlignedRead` trait and fetches them
//! from an `AlignmentSource`. Both are implemented on top of rust-htslib.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_htslib::bam;
use rust_htslib::bam::record::Cigar;
use rust_htslib::bam::Read;

use crate::utils::intervals::Interval;
use crate::utils::seq::Orientation;

/// SAM flags excluded by default: unmapped, secondary, QC fail, duplicate, supplementary.
pub const DEFAULT_READ_FILTER_FLAG: u16 = 0x4 | 0x100 | 0x200 | 0x400 | 0x800;
pub const DEFAULT_MIN_MAPQ: u8 = 20;

/// A soft clip at one end of an alignment.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters, CopyGetters)]
pub struct Softclip {
    /// 0-based reference position of the boundary: the first position after the aligned
    /// block for forward clips, the last position before it for reverse clips.
    #[getset(get_copy = "pub")]
    position: u64,
    #[getset(get_copy = "pub")]
    orientation: Orientation,
    /// Clipped bases, in reference strand orientation.
    #[getset(get = "pub")]
    seq: Vec<u8>,
}

pub trait AlignedRead {
    fn mapq(&self) -> u8;

    fn flags(&self) -> u16;

    /// The soft clip on the side given by `orientation`, if any.
    fn softclip(&self, orientation: Orientation) -> Option<Softclip>;
}

/// Length of the first soft clip yielded by `ops`, skipping hard clips.
fn softclip_len<'a, I>(ops: I) -> Option<usize>
where
    I: Iterator<Item = &'a Cigar>,
{
    for op in ops {
        match op {
            Cigar::HardClip(_) => continue,
            Cigar::SoftClip(l) if *l > 0 => return Some(*l as usize),
            _ => return None,
        }
    }
    None
}

impl AlignedRead for bam::Record {
    fn mapq(&self) -> u8 {
        bam::Record::mapq(self)
    }

    fn flags(&self) -> u16 {
        bam::Record::flags(self)
    }

    fn softclip(&self, orientation: Orientation) -> Option<Softclip> {
        if self.is_unmapped() {
            return None;
        }
        let cigar = self.cigar();
        let seq = self.seq().as_bytes();
        match orientation {
            Orientation::Forward => {
                let len = softclip_len(cigar.iter().rev())?.min(seq.len());
                Some(Softclip::new(
                    cigar.end_pos() as u64,
                    orientation,
                    seq[seq.len() - len..].to_vec(),
                ))
            }
            Orientation::Reverse => {
                let len = softclip_len(cigar.iter())?.min(seq.len());
                let start = self.pos();
                if start <= 0 {
                    return None;
                }
                Some(Softclip::new(
                    start as u64 - 1,
                    orientation,
                    seq[..len].to_vec(),
                ))
            }
        }
    }
}

/// Anything that can fetch the reads overlapping a region.
pub trait AlignmentSource {
    type Read: AlignedRead;

    /// Whether the source contains reads for the given contig at all.
    fn has_contig(&self, contig: &str) -> bool;

    /// Call `f` on every read overlapping `region`.
    fn visit<F>(&mut self, region: &Interval, f: F) -> Result<()>
    where
        F: FnMut(&Self::Read);
}

/// Indexed BAM/CRAM file.
pub struct BamSource {
    reader: bam::IndexedReader,
    path: PathBuf,
}

impl BamSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = bam::IndexedReader::from_path(path.as_ref()).with_context(|| {
            format!(
                "failed to open indexed alignment file {}",
                path.as_ref().display()
            )
        })?;
        Ok(BamSource {
            reader,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Names of all contigs in the header, in header order.
    pub fn contigs(&self) -> Vec<String> {
        self.reader
            .header()
            .target_names()
            .into_iter()
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect()
    }
}

impl AlignmentSource for BamSource {
    type Read = bam::Record;

    fn has_contig(&self, contig: &str) -> bool {
        self.reader.header().tid(contig.as_bytes()).is_some()
    }

    fn visit<F>(&mut self, region: &Interval, mut f: F) -> Result<()>
    where
        F: FnMut(&bam::Record),
    {
        let contig = region.contig().as_str();
        let fetched = match region.coordinates() {
            // pad by one base so that reverse boundaries at the region end are seen
            Some((start, end)) => self
                .reader
                .fetch((contig, start.saturating_sub(1) as i64, end as i64 + 2)),
            None => self.reader.fetch(contig),
        };
        fetched.with_context(|| {
            format!(
                "failed to fetch region {} from {}",
                region,
                self.path.display()
            )
        })?;

        let mut record = bam::Record::new();
        while let Some(result) = self.reader.read(&mut record) {
            result.with_context(|| {
                format!("invalid record in region {} of {}", region, self.path.display())
            })?;
            f(&record);
        }
        Ok(())
    }
}
