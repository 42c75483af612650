// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Search of telomere arrays in the reference genome.
//!
//! G2S breakpoints carry a telomere array that is absent from the reference at the
//! breakpoint itself, but reads only align there if the region flanks an existing array
//! in the assembly. Detection is therefore restricted to windows around such occurrences.

use anyhow::Result;
use bio::alphabets::dna;

use crate::reference::SequenceAccessor;
use crate::utils::intervals::{contiguous_ranges, Interval};
use crate::utils::seq::ApproximateMatcher;

/// Number of bases added on each side of a telomere array occurrence.
pub const TELOMERE_SEARCH_WINDOW: u64 = 20;

/// Find all occurrences of `query` (or its reverse complement) in the given regions,
/// allowing up to `max_edit_distance` edits.
///
/// Each occurrence is returned as an interval extended by `window_size` bases on both sides
/// and clipped to the contig. Occurrences whose hits overlap are reported once. Regions
/// without coordinates are searched on the whole contig, regions on contigs absent from the
/// reference are skipped. Results are ordered by region, then by position.
pub fn find_all_occurrences_in_genome<R: SequenceAccessor>(
    query: &[u8],
    reference: &R,
    regions: &[Interval],
    max_edit_distance: usize,
    window_size: u64,
) -> Result<Vec<Interval>> {
    let reverse_query = dna::revcomp(query);
    let mut matchers = vec![ApproximateMatcher::new(query, max_edit_distance)];
    if reverse_query != query {
        matchers.push(ApproximateMatcher::new(&reverse_query, max_edit_distance));
    }

    let mut occurrences = Vec::new();
    for region in regions {
        let contig_len = match reference.contig_len(region.contig()) {
            Some(len) => len,
            None => {
                warn!(
                    "Contig {} not found in reference, skipping region {}.",
                    region.contig(),
                    region
                );
                continue;
            }
        };
        let (start, end) = region
            .coordinates()
            .map_or((0, contig_len), |(start, end)| {
                (start.min(contig_len), end.min(contig_len))
            });
        let seq = reference.seq(region.contig())?;
        let text = &seq[start as usize..end as usize];

        let mut region_occurrences = Vec::new();
        for matcher in &matchers {
            let hit_ends = matcher.hit_ends(text).into_iter().map(|end| end as u64);
            // consecutive hit ends belong to the same occurrence
            for (first_end, last_end) in contiguous_ranges(hit_ends, 1) {
                let match_start = start + (first_end + 1).saturating_sub(query.len() as u64);
                let match_end = start + last_end + 1;
                region_occurrences.push(Interval::from_ordered(
                    region.contig().as_str(),
                    match_start.saturating_sub(window_size),
                    (match_end + window_size).min(contig_len),
                ));
            }
        }
        region_occurrences.sort();
        debug!(
            "Found {} telomere array occurrences in region {}.",
            region_occurrences.len(),
            region
        );
        occurrences.extend(region_occurrences);
    }

    Ok(occurrences)
}
