// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeMap;

use anyhow::Result;
use strum::IntoEnumIterator;

use crate::alignment::{AlignedRead, AlignmentSource};
use crate::breakpoints::{BreakpointType, DetectionParams};
use crate::utils::intervals::Interval;
use crate::utils::seq::{ApproximateMatcher, Orientation, TelomereSeqs};

/// Number of reads supporting a breakpoint at one position and orientation.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters, CopyGetters, Serialize)]
pub struct BreakpointFocus {
    #[getset(get = "pub")]
    contig: String,
    #[getset(get_copy = "pub")]
    position: u64,
    #[getset(get_copy = "pub")]
    orientation: Orientation,
    #[getset(get_copy = "pub")]
    support_count: u32,
    #[getset(get_copy = "pub")]
    breakpoint_type: BreakpointType,
}

/// Supporting read counts per (contig, position, orientation) for one breakpoint type.
///
/// Iteration order is by contig, then position, then orientation.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
pub struct Tents {
    #[getset(get_copy = "pub")]
    breakpoint_type: BreakpointType,
    counts: BTreeMap<(String, u64, Orientation), u32>,
}

impl Tents {
    pub fn new(breakpoint_type: BreakpointType) -> Self {
        Tents {
            breakpoint_type,
            counts: BTreeMap::new(),
        }
    }

    /// Register one supporting read.
    pub fn add(&mut self, contig: &str, position: u64, orientation: Orientation) {
        self.add_count(contig, position, orientation, 1);
    }

    fn add_count(&mut self, contig: &str, position: u64, orientation: Orientation, count: u32) {
        *self
            .counts
            .entry((contig.to_owned(), position, orientation))
            .or_insert(0) += count;
    }

    /// Merge the tents of another region, summing the counts of shared keys.
    pub fn extend(&mut self, other: Tents) {
        for ((contig, position, orientation), count) in other.counts {
            self.add_count(&contig, position, orientation, count);
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn support_count(&self, contig: &str, position: u64, orientation: Orientation) -> u32 {
        self.counts
            .get(&(contig.to_owned(), position, orientation))
            .copied()
            .unwrap_or(0)
    }

    pub fn foci(&self) -> impl Iterator<Item = BreakpointFocus> + '_ {
        self.counts
            .iter()
            .map(move |((contig, position, orientation), count)| {
                BreakpointFocus::new(
                    contig.clone(),
                    *position,
                    *orientation,
                    *count,
                    self.breakpoint_type,
                )
            })
    }
}

/// Telomere array matchers for both orientations.
struct TelomereArrayMatchers {
    forward: ApproximateMatcher,
    reverse: ApproximateMatcher,
}

impl TelomereArrayMatchers {
    fn new(telomere_seqs: &TelomereSeqs, array_size: usize, max_edit_distance: usize) -> Self {
        let matcher = |orientation| {
            ApproximateMatcher::new(
                &telomere_seqs.array(orientation, array_size),
                max_edit_distance,
            )
        };
        TelomereArrayMatchers {
            forward: matcher(Orientation::Forward),
            reverse: matcher(Orientation::Reverse),
        }
    }

    fn get(&self, orientation: Orientation) -> &ApproximateMatcher {
        match orientation {
            Orientation::Forward => &self.forward,
            Orientation::Reverse => &self.reverse,
        }
    }
}

/// Count soft clip boundaries supporting a breakpoint of the configured type in `region`.
///
/// Reads below the minimum MAPQ or having any of the filtered flags are ignored. For G2S
/// breakpoints the clipped sequence must additionally contain the telomere array of the
/// clip's orientation. Only boundaries inside `region` are counted. All tents are returned,
/// regardless of `min_supporting_reads`: filtering happens after regions have been merged.
///
/// Regions on contigs unknown to the alignment source yield no tents.
pub fn find_breakpoint_foci<S: AlignmentSource>(
    params: &DetectionParams,
    region: &Interval,
    source: &mut S,
) -> Result<Tents> {
    let mut tents = Tents::new(params.breakpoint_type());
    if !source.has_contig(region.contig()) {
        warn!(
            "Contig {} not found in alignments, skipping region {}.",
            region.contig(),
            region
        );
        return Ok(tents);
    }

    let telomere_matchers = match params.breakpoint_type() {
        BreakpointType::G2S => Some(TelomereArrayMatchers::new(
            params.telomere_seqs(),
            params.telo_array_size(),
            params.max_edit_distance(),
        )),
        BreakpointType::S2G => None,
    };
    let min_mapq = params.min_mapq();
    let read_filter_flag = params.read_filter_flag();

    source.visit(region, |read| {
        if read.mapq() < min_mapq || read.flags() & read_filter_flag != 0 {
            return;
        }
        for orientation in Orientation::iter() {
            let clip = match read.softclip(orientation) {
                Some(clip) => clip,
                None => continue,
            };
            if !region.covers(clip.position()) {
                continue;
            }
            if let Some(ref matchers) = telomere_matchers {
                if !matchers.get(orientation).is_match(clip.seq()) {
                    continue;
                }
            }
            tents.add(region.contig(), clip.position(), orientation);
        }
    })?;

    debug!(
        "Found {} {} tents in region {}.",
        tents.len(),
        params.breakpoint_type(),
        region
    );
    Ok(tents)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::alignment::Softclip;
    use crate::breakpoints::tests::params;

    /// A read reduced to what breakpoint detection looks at.
    #[derive(Debug, Clone)]
    pub(crate) struct MockRead {
        pub(crate) start: u64,
        pub(crate) end: u64,
        pub(crate) mapq: u8,
        pub(crate) flags: u16,
        pub(crate) left_clip: Option<Vec<u8>>,
        pub(crate) right_clip: Option<Vec<u8>>,
    }

    impl MockRead {
        pub(crate) fn right_clipped(end: u64, clip: &[u8]) -> Self {
            MockRead {
                start: end.saturating_sub(50),
                end,
                mapq: 60,
                flags: 0,
                left_clip: None,
                right_clip: Some(clip.to_vec()),
            }
        }

        pub(crate) fn left_clipped(start: u64, clip: &[u8]) -> Self {
            MockRead {
                start,
                end: start + 50,
                mapq: 60,
                flags: 0,
                left_clip: Some(clip.to_vec()),
                right_clip: None,
            }
        }
    }

    impl AlignedRead for MockRead {
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

    /// Reads of a single contig, held in memory.
    #[derive(Debug, Clone)]
    pub(crate) struct MockSource {
        pub(crate) contig: String,
        pub(crate) reads: Vec<MockRead>,
    }

    impl AlignmentSource for MockSource {
        type Read = MockRead;

        fn has_contig(&self, contig: &str) -> bool {
            self.contig == contig
        }

        fn visit<F>(&mut self, region: &Interval, mut f: F) -> Result<()>
        where
            F: FnMut(&MockRead),
        {
            for read in &self.reads {
                let overlaps = region
                    .coordinates()
                    .map_or(true, |(start, end)| read.start <= end + 1 && read.end + 1 >= start);
                if overlaps {
                    f(read);
                }
            }
            Ok(())
        }
    }

    fn telomere_clip() -> Vec<u8> {
        let mut clip = b"TTAGGC".repeat(4);
        clip.extend_from_slice(b"ACGTAC");
        clip
    }

    fn source(reads: Vec<MockRead>) -> MockSource {
        MockSource {
            contig: "chr1".to_owned(),
            reads,
        }
    }

    #[test]
    fn test_s2g_counts_every_softclip() {
        let mut source = source(vec![
            MockRead::right_clipped(1000, b"ACGTTGCA"),
            MockRead::right_clipped(1000, b"GGGG"),
            MockRead::left_clipped(2000, b"CCCC"),
        ]);
        let params = params().for_breakpoint_type(BreakpointType::S2G, "");
        let tents =
            find_breakpoint_foci(&params, &Interval::whole_contig("chr1"), &mut source).unwrap();

        assert_eq!(tents.len(), 2);
        assert_eq!(tents.breakpoint_type(), BreakpointType::S2G);
        assert_eq!(tents.support_count("chr1", 1000, Orientation::Forward), 2);
        assert_eq!(tents.support_count("chr1", 1999, Orientation::Reverse), 1);
    }

    #[test]
    fn test_g2s_requires_telomere_array() {
        let reverse_clip = TelomereSeqs::from_forward("TTAGGC")
            .unwrap()
            .array(Orientation::Reverse, 3);
        let mut source = source(vec![
            MockRead::right_clipped(1000, &telomere_clip()),
            MockRead::right_clipped(1000, b"ACGTTGCAACGTTGCAACGT"),
            // telomere unit in the wrong orientation for a right clip
            MockRead::right_clipped(1500, &reverse_clip),
            MockRead::left_clipped(2000, &reverse_clip),
        ]);
        let params = params().for_breakpoint_type(BreakpointType::G2S, "");
        let tents =
            find_breakpoint_foci(&params, &Interval::whole_contig("chr1"), &mut source).unwrap();

        let foci: Vec<_> = tents.foci().collect();
        assert_eq!(
            foci,
            vec![
                BreakpointFocus::new(
                    "chr1".to_owned(),
                    1000,
                    Orientation::Forward,
                    1,
                    BreakpointType::G2S
                ),
                BreakpointFocus::new(
                    "chr1".to_owned(),
                    1999,
                    Orientation::Reverse,
                    1,
                    BreakpointType::G2S
                ),
            ]
        );
    }

    #[test]
    fn test_g2s_tolerates_edits() {
        let mut clip = telomere_clip();
        // single substitution within the array
        clip[7] = b'G';
        let mut source = source(vec![MockRead::right_clipped(1000, &clip)]);
        let params = params().for_breakpoint_type(BreakpointType::G2S, "");
        let tents =
            find_breakpoint_foci(&params, &Interval::whole_contig("chr1"), &mut source).unwrap();
        assert_eq!(tents.support_count("chr1", 1000, Orientation::Forward), 1);
    }

    #[test]
    fn test_read_filters() {
        let mut low_mapq = MockRead::right_clipped(1000, b"ACGT");
        low_mapq.mapq = 5;
        let mut duplicate = MockRead::right_clipped(1000, b"ACGT");
        duplicate.flags = 0x400;
        let mut paired = MockRead::right_clipped(1000, b"ACGT");
        paired.flags = 0x1 | 0x2;
        let mut source = source(vec![low_mapq, duplicate, paired]);
        let params = params().for_breakpoint_type(BreakpointType::S2G, "");
        let tents =
            find_breakpoint_foci(&params, &Interval::whole_contig("chr1"), &mut source).unwrap();
        assert_eq!(tents.support_count("chr1", 1000, Orientation::Forward), 1);
    }

    #[test]
    fn test_only_boundaries_inside_region_are_counted() {
        let mut source = source(vec![
            MockRead::right_clipped(1000, b"ACGT"),
            MockRead::right_clipped(1100, b"ACGT"),
        ]);
        let params = params().for_breakpoint_type(BreakpointType::S2G, "");
        let region = Interval::new("chr1", Some(990), Some(1050)).unwrap();
        let tents = find_breakpoint_foci(&params, &region, &mut source).unwrap();
        assert_eq!(tents.len(), 1);
        assert_eq!(tents.support_count("chr1", 1000, Orientation::Forward), 1);
    }

    #[test]
    fn test_unknown_contig_yields_no_tents() {
        let mut source = source(vec![MockRead::right_clipped(1000, b"ACGT")]);
        let params = params().for_breakpoint_type(BreakpointType::S2G, "");
        let tents =
            find_breakpoint_foci(&params, &Interval::whole_contig("chr2"), &mut source).unwrap();
        assert!(tents.is_empty());
    }

    #[test]
    fn test_extend_sums_counts() {
        let mut tents = Tents::new(BreakpointType::S2G);
        tents.add("chr1", 10, Orientation::Forward);
        let mut other = Tents::new(BreakpointType::S2G);
        other.add("chr1", 10, Orientation::Forward);
        other.add("chr1", 10, Orientation::Reverse);
        tents.extend(other);
        assert_eq!(tents.support_count("chr1", 10, Orientation::Forward), 2);
        assert_eq!(tents.support_count("chr1", 10, Orientation::Reverse), 1);
        assert_eq!(tents.len(), 2);
    }
}
