// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

pub mod clustering;
pub mod foci;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::errors::Error;
use crate::utils::seq::{Orientation, TelomereSeqs};

pub use clustering::{cluster_breakpoint_foci, find_maximal_foci, Cluster, MaximalFocus};
pub use foci::{find_breakpoint_foci, BreakpointFocus, Tents};

/// Class of DNA elimination breakpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum BreakpointType {
    /// Germline to soma: the soft clip carries a newly added telomere repeat array.
    G2S,
    /// Soma to germline: the soft clip alone is the evidence.
    S2G,
}

/// Breakpoint types requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointTypeSelection {
    Single(BreakpointType),
    All,
}

impl BreakpointTypeSelection {
    /// Concrete breakpoint types to analyse, in processing order.
    pub fn breakpoint_types(self) -> Vec<BreakpointType> {
        match self {
            BreakpointTypeSelection::Single(breakpoint_type) => vec![breakpoint_type],
            BreakpointTypeSelection::All => BreakpointType::iter().collect(),
        }
    }
}

impl Default for BreakpointTypeSelection {
    fn default() -> Self {
        BreakpointTypeSelection::All
    }
}

impl FromStr for BreakpointTypeSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(BreakpointTypeSelection::All);
        }
        BreakpointType::from_str(s)
            .map(BreakpointTypeSelection::Single)
            .map_err(|_| Error::InvalidBreakpointType {
                value: s.to_owned(),
            })
    }
}

/// Parameters of a breakpoint detection run.
///
/// The value is immutable; per breakpoint type, a derived value is obtained via
/// `for_breakpoint_type`.
#[derive(Debug, Clone, Builder, Getters, CopyGetters)]
#[builder(pattern = "owned")]
pub struct DetectionParams {
    #[getset(get = "pub")]
    bam_path: PathBuf,
    #[getset(get = "pub")]
    telomere_seqs: TelomereSeqs,
    /// Minimum number of telomere units in a soft clip.
    #[getset(get_copy = "pub")]
    telo_array_size: usize,
    /// Maximum edit distance allowed when searching the telomere array.
    #[getset(get_copy = "pub")]
    max_edit_distance: usize,
    /// Foci at most this many bases apart are clustered together.
    #[getset(get_copy = "pub")]
    clustering_threshold: u64,
    #[getset(get_copy = "pub")]
    min_mapq: u8,
    /// Reads having any of these SAM flags are ignored.
    #[getset(get_copy = "pub")]
    read_filter_flag: u16,
    #[getset(get_copy = "pub")]
    min_supporting_reads: u32,
    #[builder(default = "BreakpointType::G2S")]
    #[getset(get_copy = "pub")]
    breakpoint_type: BreakpointType,
    /// Path prefix for per breakpoint type output files.
    #[builder(default)]
    #[getset(get = "pub")]
    ofname_base: PathBuf,
}

impl DetectionParams {
    /// Derive parameters for analysing the given breakpoint type, writing intermediate
    /// results below `ofname_base`.
    pub fn for_breakpoint_type<P: AsRef<Path>>(
        &self,
        breakpoint_type: BreakpointType,
        ofname_base: P,
    ) -> Self {
        DetectionParams {
            breakpoint_type,
            ofname_base: ofname_base.as_ref().to_path_buf(),
            ..self.clone()
        }
    }

    /// The telomere array searched in the reference: the forward unit repeated
    /// `telo_array_size` times.
    pub fn telomere_query(&self) -> Vec<u8> {
        self.telomere_seqs
            .array(Orientation::Forward, self.telo_array_size)
    }
}
