//! intervals.rs
//!
//! Genomic intervals and contiguous range merging.
//!
//! This module provides:
//! 1. `Interval`, a contig range with optional coordinates
//! 2. Region string parsing (`CONTIG` or `CONTIG:START-END`)
//! 3. Merging of integer positions into contiguous ranges

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use bio::io::bed;
use itertools::Itertools;

use crate::errors::Error;

/// A range on a contig. Without coordinates, the interval denotes the whole contig.
///
/// Coordinates are taken as given, no conversion between 0- and 1-based systems is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Getters, CopyGetters)]
pub struct Interval {
    #[getset(get = "pub")]
    contig: String,
    #[getset(get_copy = "pub")]
    start: Option<u64>,
    #[getset(get_copy = "pub")]
    end: Option<u64>,
}

impl Interval {
    /// Create a new interval. Fails if both bounds are given and `start > end`.
    pub fn new(contig: impl Into<String>, start: Option<u64>, end: Option<u64>) -> Result<Self> {
        let contig = contig.into();
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Error::InvalidIntervalBounds { contig, start, end }.into());
            }
        }
        Ok(Interval { contig, start, end })
    }

    /// Interval covering the entire contig.
    pub fn whole_contig(contig: impl Into<String>) -> Self {
        Interval {
            contig: contig.into(),
            start: None,
            end: None,
        }
    }

    /// Interval from bounds known to satisfy `start <= end`.
    pub(crate) fn from_ordered(contig: impl Into<String>, start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Interval {
            contig: contig.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn from_region_string(region: &str) -> Result<Self> {
        let (contig, start, end) = parse_region_string(region)?;
        Interval::new(contig, start, end)
    }

    pub fn from_bed_record(record: &bed::Record) -> Result<Self> {
        let (start, end) = (record.start(), record.end());
        if start > end {
            return Err(Error::InvalidBedRecord {
                contig: record.chrom().to_owned(),
                start,
                end,
                msg: "start exceeds end".to_owned(),
            }
            .into());
        }
        Interval::new(record.chrom(), Some(start), Some(end))
    }

    pub fn has_coordinates(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Both bounds, if present.
    pub fn coordinates(&self) -> Option<(u64, u64)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Whether `position` lies within the interval, both bounds included.
    pub fn spans(&self, position: u64) -> Result<bool> {
        let (start, end) = self
            .coordinates()
            .ok_or_else(|| Error::IntervalWithoutCoordinates {
                region: self.to_region_string(),
                position,
            })?;
        Ok(start <= position && position <= end)
    }

    /// Whether `position` is covered, treating a coordinate-less interval as the whole contig.
    pub(crate) fn covers(&self, position: u64) -> bool {
        self.coordinates()
            .map_or(true, |(start, end)| start <= position && position <= end)
    }

    pub fn to_region_string(&self) -> String {
        match self.coordinates() {
            Some((start, end)) => format!("{}:{}-{}", self.contig, start, end),
            None => self.contig.clone(),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_region_string())
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Interval::from_region_string(s)
    }
}

/// Parse a region string of the form `CONTIG` or `CONTIG:START-END`.
///
/// # Errors
/// Returns `Error::InvalidRegionString` if
/// - the contig is empty
/// - there is more than one `:`, or the coordinate part does not contain exactly one `-`
/// - start or end are not plain non-negative integers (digits only, no sign)
/// - start exceeds end
///
/// # Example
/// assert_eq!(parse_region_string("chr1:2-200").unwrap(), ("chr1".to_owned(), Some(2), Some(200)));
pub fn parse_region_string(region: &str) -> Result<(String, Option<u64>, Option<u64>)> {
    let invalid = || Error::InvalidRegionString {
        region: region.to_owned(),
    };

    let mut fields = region.split(':');
    let contig = fields.next().filter(|c| !c.is_empty()).ok_or_else(invalid)?;
    let coordinates = match (fields.next(), fields.next()) {
        (None, _) => return Ok((contig.to_owned(), None, None)),
        (Some(coordinates), None) => coordinates,
        (Some(_), Some(_)) => return Err(invalid().into()),
    };

    let bounds: Vec<&str> = coordinates.split('-').collect();
    if bounds.len() != 2 {
        return Err(invalid().into());
    }
    if bounds
        .iter()
        .any(|bound| bound.is_empty() || !bound.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(invalid().into());
    }
    let start: u64 = bounds[0].parse().map_err(|_| invalid())?;
    let end: u64 = bounds[1].parse().map_err(|_| invalid())?;
    if start > end {
        return Err(invalid().into());
    }

    Ok((contig.to_owned(), Some(start), Some(end)))
}

/// Merge integer values into maximal ranges of neighbours that are at most `tolerance` apart.
///
/// Returns inclusive `(min, max)` pairs in ascending order. Duplicates are collapsed and
/// input order does not matter.
pub fn contiguous_ranges<I>(values: I, tolerance: u64) -> Vec<(u64, u64)>
where
    I: IntoIterator<Item = u64>,
{
    values
        .into_iter()
        .sorted()
        .dedup()
        .map(|value| (value, value))
        .coalesce(|(start, last), (next, next_last)| {
            if next - last <= tolerance {
                Ok((start, next_last))
            } else {
                Err(((start, last), (next, next_last)))
            }
        })
        .collect()
}

/// Merge overlapping or abutting intervals of the same contig.
///
/// An interval without coordinates covers its whole contig and absorbs every other interval
/// of that contig. The result is sorted by contig and start.
pub fn merge_overlapping(intervals: Vec<Interval>) -> Vec<Interval> {
    intervals
        .into_iter()
        .sorted()
        .coalesce(|a, b| {
            if a.contig != b.contig {
                return Err((a, b));
            }
            match (a.coordinates(), b.coordinates()) {
                (Some((a_start, a_end)), Some((b_start, b_end))) if b_start <= a_end => {
                    Ok(Interval::from_ordered(a.contig, a_start, a_end.max(b_end)))
                }
                (Some(_), Some(_)) => Err((a, b)),
                _ => Ok(Interval::whole_contig(a.contig)),
            }
        })
        .collect()
}
