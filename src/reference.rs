// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::{Mutex, RwLock};

use anyhow::{Context, Result};
use bio::io::fasta;
use lru_time_cache::LruCache;

use crate::errors::Error;

/// Random access to reference contig sequences.
pub trait SequenceAccessor {
    /// Length of the given contig, `None` if the contig is unknown.
    fn contig_len(&self, contig: &str) -> Option<u64>;

    /// Full (upper-case) sequence of the given contig.
    fn seq(&self, contig: &str) -> Result<Arc<Vec<u8>>>;

    /// Upper-case sequence of the half-open window `[start, end)`, clipped to the contig.
    fn seq_window(&self, contig: &str, start: u64, end: u64) -> Result<Vec<u8>>;
}

fn contig_not_found(contig: &str) -> anyhow::Error {
    Error::ReferenceContigNotFound {
        contig: contig.to_owned(),
    }
    .into()
}

/// A lazy buffer for reference sequences.
pub struct Buffer {
    reader: RwLock<fasta::IndexedReader<fs::File>>,
    sequences: Mutex<LruCache<String, Arc<Vec<u8>>>>,
    contig_lens: HashMap<String, u64>,
    reference_path: PathBuf,
}

impl Buffer {
    pub fn from_path<P: AsRef<Path> + std::fmt::Debug>(path: P, capacity: usize) -> Result<Self> {
        let fasta: fasta::IndexedReader<fs::File> = fasta::IndexedReader::from_file(&path)
            .with_context(|| format!("failed to open indexed FASTA file {:?}", path))?;
        let contig_lens = fasta
            .index
            .sequences()
            .into_iter()
            .map(|sequence| (sequence.name, sequence.len))
            .collect();
        Ok(Buffer {
            reader: RwLock::new(fasta),
            sequences: Mutex::new(LruCache::with_capacity(capacity)),
            contig_lens,
            reference_path: path.as_ref().to_path_buf(),
        })
    }

    pub fn reference_path(&self) -> &Path {
        &self.reference_path
    }

    /// Load given contig and return it. This is O(1) if the contig was loaded before.
    fn load(&self, contig: &str) -> Result<Arc<Vec<u8>>> {
        let mut sequences = self.sequences.lock().unwrap();

        if let Some(sequence) = sequences.get(contig) {
            return Ok(Arc::clone(sequence));
        }

        let mut sequence = Vec::new();
        {
            let mut reader = self.reader.write().unwrap();
            reader.fetch_all(contig)?;
            reader.read(&mut sequence)?;
        }
        sequence.make_ascii_uppercase();
        let sequence = Arc::new(sequence);

        sequences.insert(contig.to_owned(), Arc::clone(&sequence));
        Ok(sequence)
    }

    /// Read `[start, end)` of the given contig from disk, without touching the contig cache.
    fn load_window(&self, contig: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        if let Some(sequence) = self.sequences.lock().unwrap().peek(contig) {
            return Ok(sequence[start as usize..end as usize].to_vec());
        }

        let mut sequence = Vec::new();
        {
            let mut reader = self.reader.write().unwrap();
            reader.fetch(contig, start, end)?;
            reader.read(&mut sequence)?;
        }
        sequence.make_ascii_uppercase();
        Ok(sequence)
    }
}

impl SequenceAccessor for Buffer {
    fn contig_len(&self, contig: &str) -> Option<u64> {
        self.contig_lens.get(contig).copied()
    }

    fn seq(&self, contig: &str) -> Result<Arc<Vec<u8>>> {
        if !self.contig_lens.contains_key(contig) {
            return Err(contig_not_found(contig));
        }
        self.load(contig)
    }

    fn seq_window(&self, contig: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let len = self
            .contig_len(contig)
            .ok_or_else(|| contig_not_found(contig))?;
        let end = end.min(len);
        if start >= end {
            return Ok(Vec::new());
        }
        self.load_window(contig, start, end)
    }
}

/// In-memory reference keyed by contig name.
impl SequenceAccessor for HashMap<String, Vec<u8>> {
    fn contig_len(&self, contig: &str) -> Option<u64> {
        self.get(contig).map(|seq| seq.len() as u64)
    }

    fn seq(&self, contig: &str) -> Result<Arc<Vec<u8>>> {
        self.get(contig)
            .map(|seq| Arc::new(seq.to_ascii_uppercase()))
            .ok_or_else(|| contig_not_found(contig))
    }

    fn seq_window(&self, contig: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let seq = self.get(contig).ok_or_else(|| contig_not_found(contig))?;
        let end = (end as usize).min(seq.len());
        let start = (start as usize).min(end);
        Ok(seq[start..end].to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_indexed_fasta(dir: &Path) -> PathBuf {
        let path = dir.join("genome.fa");
        let mut fasta = fs::File::create(&path).unwrap();
        write!(fasta, ">chr1\nACGTACGTAC\ngtac\n>chr2\nTTAGGC\n").unwrap();
        let mut fai = fs::File::create(dir.join("genome.fa.fai")).unwrap();
        write!(fai, "chr1\t14\t6\t10\t11\nchr2\t6\t28\t6\t7\n").unwrap();
        path
    }

    #[test]
    fn test_buffer_fetches_and_caches_contigs() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = Buffer::from_path(write_indexed_fasta(dir.path()), 1).unwrap();

        assert_eq!(buffer.contig_len("chr1"), Some(14));
        assert_eq!(buffer.contig_len("chr3"), None);
        assert_eq!(buffer.seq("chr1").unwrap().as_slice(), b"ACGTACGTACGTAC");
        assert_eq!(buffer.seq("chr2").unwrap().as_slice(), b"TTAGGC");
        // evicted from the single-slot cache and reloaded
        assert_eq!(buffer.seq("chr1").unwrap().as_slice(), b"ACGTACGTACGTAC");
    }

    #[test]
    fn test_buffer_windows_across_more_contigs_than_cached() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = Buffer::from_path(write_indexed_fasta(dir.path()), 1).unwrap();

        for _ in 0..3 {
            assert_eq!(buffer.seq_window("chr1", 8, 12).unwrap(), b"ACGT".to_vec());
            assert_eq!(buffer.seq_window("chr2", 2, 100).unwrap(), b"AGGC".to_vec());
            assert_eq!(buffer.seq_window("chr1", 12, 20).unwrap(), b"AC".to_vec());
        }
        assert_eq!(buffer.seq_window("chr2", 6, 10).unwrap(), Vec::<u8>::new());
        assert!(buffer.seq_window("chr3", 0, 1).is_err());
        assert_eq!(buffer.sequences.lock().unwrap().len(), 0);

        // a cached contig serves windows as well
        buffer.seq("chr1").unwrap();
        assert_eq!(buffer.seq_window("chr1", 0, 14).unwrap(), b"ACGTACGTACGTAC".to_vec());
    }

    #[test]
    fn test_buffer_unknown_contig() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = Buffer::from_path(write_indexed_fasta(dir.path()), 2).unwrap();
        assert_eq!(
            buffer.seq("chrUn").unwrap_err().downcast_ref::<Error>(),
            Some(&Error::ReferenceContigNotFound {
                contig: "chrUn".to_owned()
            })
        );
    }

    #[test]
    fn test_in_memory_reference() {
        let mut reference = HashMap::new();
        reference.insert("chr1".to_owned(), b"acgt".to_vec());
        assert_eq!(reference.contig_len("chr1"), Some(4));
        assert_eq!(reference.seq("chr1").unwrap().as_slice(), b"ACGT");
        assert_eq!(reference.seq_window("chr1", 1, 10).unwrap(), b"CGT".to_vec());
        assert_eq!(reference.seq_window("chr1", 5, 10).unwrap(), Vec::<u8>::new());
        assert!(reference.seq("chr2").is_err());
    }
}
