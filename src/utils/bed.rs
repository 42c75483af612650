//! bed.rs
//!
//! Loading of regions to analyse from BED files.

use std::path::Path;

use anyhow::{Context, Result};
use bio::io::bed;

use crate::errors::Error;
use crate::utils::intervals::Interval;

/// Read all regions of a BED file.
///
/// # Errors
/// Returns error if
/// - the file cannot be opened or parsed
/// - a record has start > end
/// - the file contains no records
pub fn read_bed_regions<P: AsRef<Path>>(path: P) -> Result<Vec<Interval>> {
    let path = path.as_ref();
    let mut reader = bed::Reader::from_file(path)
        .with_context(|| format!("failed to open BED file {}", path.display()))?;

    let mut regions = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("failed to read record of {}", path.display()))?;
        regions.push(Interval::from_bed_record(&record)?);
    }

    if regions.is_empty() {
        return Err(Error::BedFileEmpty {
            path: path.to_path_buf(),
        }
        .into());
    }
    info!("Loaded {} regions from {}.", regions.len(), path.display());
    Ok(regions)
}
