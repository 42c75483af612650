// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Scheduling of breakpoint detection over regions and breakpoint types.
//!
//! # Pipeline
//!
//! For each requested breakpoint type:
//! 1. Determine the region universe (for G2S: windows around telomere arrays in the reference)
//! 2. Merge overlapping regions and scan them in parallel, each worker with its own readers
//! 3. Merge the per region tents and dump them to `<ofname_base>.tsv`
//! 4. Cluster the tents and keep the well supported peaks
//!
//! The maximal foci of all types are finally sorted by support.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;

use crate::alignment::AlignmentSource;
use crate::breakpoints::{
    find_breakpoint_foci, find_maximal_foci, BreakpointType, DetectionParams, MaximalFocus, Tents,
};
use crate::output;
use crate::reference::SequenceAccessor;
use crate::telomeres::{find_all_occurrences_in_genome, TELOMERE_SEARCH_WINDOW};
use crate::utils::bed::read_bed_regions;
use crate::utils::intervals::{merge_overlapping, Interval};
use crate::utils::ID_DELIM;

/// Where to look for breakpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSelection {
    /// Regions listed in a BED file.
    Bed(PathBuf),
    /// A single region.
    Region(Interval),
    /// Every contig of the alignment file.
    WholeGenome,
}

impl RegionSelection {
    /// Resolve into concrete regions. `contigs` is only consulted for the whole genome.
    pub fn resolve(&self, contigs: &[String]) -> Result<Vec<Interval>> {
        Ok(match self {
            RegionSelection::Bed(path) => read_bed_regions(path)?,
            RegionSelection::Region(region) => vec![region.clone()],
            RegionSelection::WholeGenome => contigs
                .iter()
                .map(|contig| Interval::whole_contig(contig.as_str()))
                .collect(),
        })
    }

    /// A single region is a single unit of work, so it is always scanned by one thread.
    pub fn effective_threads(&self, threads: usize) -> usize {
        match self {
            RegionSelection::Region(_) => 1,
            _ => threads,
        }
    }
}

/// Path prefix of the intermediate output of one breakpoint type.
pub fn ofname_base(odir: &Path, breakpoint_type: BreakpointType) -> PathBuf {
    odir.join(format!("breakpoint_foci{}{}", ID_DELIM, breakpoint_type))
}

fn tents_path(ofname_base: &Path) -> PathBuf {
    let mut path: OsString = ofname_base.as_os_str().to_owned();
    path.push(".tsv");
    PathBuf::from(path)
}

/// Scan all regions on a pool of `threads` workers and merge their tents.
///
/// Overlapping regions are merged beforehand, so each read boundary is counted at most once.
/// `open_source` is called each time rayon starts a new work split, so at least once per busy
/// worker thread and possibly more often. A failing region fails the whole scan.
pub fn collect_tents<S, F>(
    params: &DetectionParams,
    regions: &[Interval],
    threads: usize,
    open_source: F,
) -> Result<Tents>
where
    S: AlignmentSource,
    F: Fn() -> Result<S> + Sync + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("failed to build thread pool")?;

    let regions = merge_overlapping(regions.to_vec());
    debug!("Scanning {} merged regions.", regions.len());

    let per_region = pool.install(|| {
        regions
            .par_iter()
            .map_init(
                || open_source(),
                |source, region| match source {
                    Ok(source) => find_breakpoint_foci(params, region, source),
                    Err(e) => Err(anyhow!("failed to open alignment source: {:#}", e)),
                },
            )
            .collect::<Result<Vec<_>>>()
    })?;

    let mut tents = Tents::new(params.breakpoint_type());
    for region_tents in per_region {
        tents.extend(region_tents);
    }
    Ok(tents)
}

/// Detect the breakpoints of the type configured in `params` in the given regions.
///
/// All tents are written to `<ofname_base>.tsv` before clustering.
pub fn run_breakpoint_detection<S, F>(
    params: &DetectionParams,
    regions: &[Interval],
    threads: usize,
    open_source: F,
) -> Result<Vec<MaximalFocus>>
where
    S: AlignmentSource,
    F: Fn() -> Result<S> + Sync + Send,
{
    info!(
        "Scanning {} regions for {} breakpoints.",
        regions.len(),
        params.breakpoint_type()
    );
    let tents = collect_tents(params, regions, threads, open_source)?;
    info!("Found {} {} tents.", tents.len(), params.breakpoint_type());

    let path = tents_path(params.ofname_base());
    output::write_tents(&tents, &path)?;
    info!("Wrote tents to {}.", path.display());

    Ok(find_maximal_foci(
        &tents,
        params.clustering_threshold(),
        params.min_supporting_reads(),
    ))
}

/// Detect breakpoints of all given types and return their maximal foci, sorted by support
/// (descending). Ties keep the order of `breakpoint_types`, then cluster order.
///
/// G2S detection is restricted to windows around telomere arrays found in `regions` of the
/// reference. The other types scan `regions` as given.
pub fn detect_breakpoints<R, S, F>(
    params: &DetectionParams,
    breakpoint_types: &[BreakpointType],
    regions: &[Interval],
    reference: &R,
    threads: usize,
    odir: &Path,
    open_source: F,
) -> Result<Vec<MaximalFocus>>
where
    R: SequenceAccessor,
    S: AlignmentSource,
    F: Fn() -> Result<S> + Sync + Send,
{
    let mut maximal_foci = Vec::new();
    for &breakpoint_type in breakpoint_types {
        let type_params =
            params.for_breakpoint_type(breakpoint_type, ofname_base(odir, breakpoint_type));
        let type_foci = match breakpoint_type {
            BreakpointType::G2S => {
                let windows = find_all_occurrences_in_genome(
                    &type_params.telomere_query(),
                    reference,
                    regions,
                    type_params.max_edit_distance(),
                    TELOMERE_SEARCH_WINDOW,
                )?;
                let windows = merge_overlapping(windows);
                info!(
                    "Found {} telomere array windows in the reference.",
                    windows.len()
                );
                run_breakpoint_detection(&type_params, &windows, threads, &open_source)?
            }
            BreakpointType::S2G => {
                run_breakpoint_detection(&type_params, regions, threads, &open_source)?
            }
        };
        info!("Kept {} {} breakpoints.", type_foci.len(), breakpoint_type);
        maximal_foci.extend(type_foci);
    }

    maximal_foci.sort_by(|a, b| b.max_value().cmp(&a.max_value()));
    Ok(maximal_foci)
}
