// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("invalid region string '{region}'. Use CONTIG or CONTIG:START-END syntax")]
    InvalidRegionString { region: String },
    #[error("invalid BED record at {contig}:{start}-{end}: {msg}")]
    InvalidBedRecord {
        contig: String,
        start: u64,
        end: u64,
        msg: String,
    },
    #[error("BED file {path} does not contain any regions")]
    BedFileEmpty { path: PathBuf },
    #[error("interval {region} has no coordinates; cannot query position {position}")]
    IntervalWithoutCoordinates { region: String, position: u64 },
    #[error("invalid interval {contig}:{start}-{end}: start must not exceed end")]
    InvalidIntervalBounds { contig: String, start: u64, end: u64 },
    #[error("invalid breakpoint type '{value}', must be one of G2S, S2G or all")]
    InvalidBreakpointType { value: String },
    #[error("invalid telomere sequence '{seq}', must be a non-empty sequence of A, C, G and T")]
    InvalidTelomereSequence { seq: String },
    #[error("contig {contig} not found in reference")]
    ReferenceContigNotFound { contig: String },
}
