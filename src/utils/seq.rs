// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use bio::alphabets::dna;
use bio::pattern_matching::myers::{long, Myers};

use crate::errors::Error;

/// Telomere repeat unit of nematodes, in forward (5'->3') orientation.
pub const NEMATODA_TELOMERE_SEQ: &str = "TTAGGC";

/// Direction in which the breakpoint defining signal faces on the reference strand.
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
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Signal after the aligned block, i.e. a clip on the 3' side of the read.
    Forward,
    /// Signal before the aligned block, i.e. a clip on the 5' side of the read.
    Reverse,
}

impl Orientation {
    /// BED strand symbol.
    pub fn strand_symbol(self) -> char {
        match self {
            Orientation::Forward => '+',
            Orientation::Reverse => '-',
        }
    }
}

/// Telomere repeat unit per orientation. The reverse unit is the reverse complement of the
/// forward unit.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct TelomereSeqs {
    forward: Vec<u8>,
    reverse: Vec<u8>,
}

impl TelomereSeqs {
    /// Build from the forward (5'->3') repeat unit, which is validated and upper-cased.
    pub fn from_forward(forward: &str) -> Result<Self> {
        let forward = forward.to_ascii_uppercase().into_bytes();
        if forward.is_empty() || !forward.iter().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
            return Err(Error::InvalidTelomereSequence {
                seq: String::from_utf8_lossy(&forward).into_owned(),
            }
            .into());
        }
        let reverse = dna::revcomp(&forward);
        Ok(TelomereSeqs { forward, reverse })
    }

    pub fn get(&self, orientation: Orientation) -> &[u8] {
        match orientation {
            Orientation::Forward => &self.forward,
            Orientation::Reverse => &self.reverse,
        }
    }

    /// The unit of the given orientation, repeated `array_size` times.
    pub fn array(&self, orientation: Orientation, array_size: usize) -> Vec<u8> {
        self.get(orientation).repeat(array_size)
    }
}

/// Approximate substring search with bounded edit distance (Myers' bit-parallel algorithm).
///
/// Patterns of up to 128 bases use a single machine word, longer ones fall back to the
/// block-based variant.
pub enum ApproximateMatcher {
    Short { myers: Myers<u128>, max_dist: u8 },
    Long { myers: long::Myers<u64>, max_dist: usize },
}

impl ApproximateMatcher {
    pub fn new(pattern: &[u8], max_dist: usize) -> Self {
        if pattern.len() <= 128 {
            ApproximateMatcher::Short {
                myers: Myers::<u128>::new(pattern),
                max_dist: max_dist.min(u8::MAX as usize) as u8,
            }
        } else {
            ApproximateMatcher::Long {
                myers: long::Myers::<u64>::new(pattern),
                max_dist,
            }
        }
    }

    /// 0-based end positions (inclusive) of all hits in `text`, in ascending order.
    pub fn hit_ends(&self, text: &[u8]) -> Vec<usize> {
        match self {
            ApproximateMatcher::Short { myers, max_dist } => myers
                .find_all_end(text, *max_dist)
                .map(|(end, _)| end)
                .collect(),
            ApproximateMatcher::Long { myers, max_dist } => myers
                .find_all_end(text, *max_dist)
                .map(|(end, _)| end)
                .collect(),
        }
    }

    /// Whether `text` contains the pattern within the maximum edit distance.
    pub fn is_match(&self, text: &[u8]) -> bool {
        match self {
            ApproximateMatcher::Short { myers, max_dist } => {
                myers.find_all_end(text, *max_dist).next().is_some()
            }
            ApproximateMatcher::Long { myers, max_dist } => {
                myers.find_all_end(text, *max_dist).next().is_some()
            }
        }
    }
}
