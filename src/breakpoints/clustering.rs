// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::breakpoints::foci::{BreakpointFocus, Tents};
use crate::breakpoints::BreakpointType;
use crate::utils::intervals::{contiguous_ranges, Interval};
use crate::utils::seq::Orientation;

/// Foci of one contig, orientation and breakpoint type whose positions form a contiguous run.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Cluster {
    /// Members, in ascending position order.
    foci: Vec<BreakpointFocus>,
}

impl Cluster {
    /// Leftmost and rightmost member position.
    pub fn span(&self) -> (u64, u64) {
        (self.foci[0].position(), self.foci[self.foci.len() - 1].position())
    }

    /// The member with the highest support. On ties, the leftmost one wins.
    pub fn peak(&self) -> &BreakpointFocus {
        self.foci
            .iter()
            .fold(&self.foci[0], |peak, focus| {
                if focus.support_count() > peak.support_count() {
                    focus
                } else {
                    peak
                }
            })
    }

    pub fn find_peak_softclip_focus(&self) -> MaximalFocus {
        let peak = self.peak();
        let (start, end) = self.span();
        MaximalFocus {
            focus: Interval::from_ordered(peak.contig().as_str(), peak.position(), peak.position() + 1),
            interval: Interval::from_ordered(peak.contig().as_str(), start, end),
            orientation: peak.orientation(),
            max_value: peak.support_count(),
            breakpoint_type: peak.breakpoint_type(),
        }
    }
}

/// The representative of a cluster: its highest supported position.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct MaximalFocus {
    /// Peak position, as `[position, position + 1)`.
    #[getset(get = "pub")]
    focus: Interval,
    /// Leftmost and rightmost position of the cluster, both inclusive.
    #[getset(get = "pub")]
    interval: Interval,
    #[getset(get_copy = "pub")]
    orientation: Orientation,
    /// Support of the peak position alone.
    #[getset(get_copy = "pub")]
    max_value: u32,
    #[getset(get_copy = "pub")]
    breakpoint_type: BreakpointType,
}

impl MaximalFocus {
    pub fn contig(&self) -> &str {
        self.focus.contig()
    }

    /// 0-based peak position.
    pub fn position(&self) -> u64 {
        self.focus.start().unwrap_or_default()
    }

    /// Inclusive span of the cluster this focus represents.
    pub fn cluster_span(&self) -> (u64, u64) {
        self.interval.coordinates().unwrap_or_default()
    }
}

/// Group foci with the same contig and orientation whose positions are at most `tolerance`
/// apart (transitively) into clusters.
///
/// Clusters are returned ordered by contig, orientation and position.
pub fn cluster_breakpoint_foci(tents: &Tents, tolerance: u64) -> Vec<Cluster> {
    let mut groups: BTreeMap<(String, Orientation), Vec<BreakpointFocus>> = BTreeMap::new();
    for focus in tents.foci() {
        groups
            .entry((focus.contig().clone(), focus.orientation()))
            .or_insert_with(Vec::new)
            .push(focus);
    }

    let mut clusters = Vec::new();
    for (_, foci) in groups {
        let ranges = contiguous_ranges(foci.iter().map(|focus| focus.position()), tolerance);
        let mut foci = foci.into_iter().peekable();
        for (_, end) in ranges {
            let members: Vec<_> = foci
                .peeking_take_while(|focus| focus.position() <= end)
                .collect();
            clusters.push(Cluster { foci: members });
        }
    }
    clusters
}

/// Pick the peak of each cluster, dropping peaks supported by fewer than
/// `min_supporting_reads` reads. The result is sorted by support, descending; ties keep
/// cluster order.
pub fn find_maximal_foci(
    tents: &Tents,
    tolerance: u64,
    min_supporting_reads: u32,
) -> Vec<MaximalFocus> {
    let clusters = cluster_breakpoint_foci(tents, tolerance);
    let total = clusters.len();
    let mut maximal_foci: Vec<_> = clusters
        .iter()
        .map(Cluster::find_peak_softclip_focus)
        .filter(|maximal_focus| maximal_focus.max_value() >= min_supporting_reads)
        .collect();
    maximal_foci.sort_by(|a, b| b.max_value().cmp(&a.max_value()));
    debug!(
        "Kept {} of {} {} clusters with at least {} supporting reads.",
        maximal_foci.len(),
        total,
        tents.breakpoint_type(),
        min_supporting_reads
    );
    maximal_foci
}
