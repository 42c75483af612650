// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;

use crate::alignment::BamSource;
use crate::breakpoints::{BreakpointTypeSelection, DetectionParams, DetectionParamsBuilder};
use crate::output;
use crate::reference;
use crate::scheduler::{detect_breakpoints, RegionSelection};
use crate::utils::intervals::Interval;
use crate::utils::seq::TelomereSeqs;

/// Number of contigs kept in memory when extracting reference sequences.
const REFERENCE_BUFFER_CAPACITY: usize = 3;

pub const BREAKPOINT_BED_NAME: &str = "breakpoint_locations.bed";
pub const BREAKPOINT_SEQUENCES_NAME: &str = "breakpoint_sequences.fasta";

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "delfies",
    about = "Detection of DNA elimination breakpoints from reads aligned to a reference genome."
)]
#[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
pub struct Delfies {
    #[structopt(
        parse(from_os_str),
        help = "FASTA file with reference genome. Has to be indexed with samtools faidx."
    )]
    pub genome: PathBuf,
    #[structopt(
        parse(from_os_str),
        help = "Indexed BAM/CRAM file with reads aligned to the reference genome."
    )]
    pub bam: PathBuf,
    #[structopt(parse(from_os_str), help = "Output directory (created if missing).")]
    pub odirname: PathBuf,
    #[structopt(
        long = "seq-region",
        help = "Restrict analysis to this region, given as CONTIG or CONTIG:START-END \
                (0-based, end-inclusive)."
    )]
    pub seq_region: Option<Interval>,
    #[structopt(
        long,
        parse(from_os_str),
        help = "Restrict analysis to the regions of this BED file. Takes precedence over \
                --seq-region."
    )]
    pub bed: Option<PathBuf>,
    #[structopt(
        long = "telo-forward-seq",
        default_value = "TTAGGC",
        help = "Telomere repeat unit, in forward orientation (default: Nematoda)."
    )]
    pub telo_forward_seq: String,
    #[structopt(
        long = "telo-array-size",
        default_value = "10",
        help = "Minimum number of telomere units a soft clip must contain for G2S breakpoints."
    )]
    pub telo_array_size: usize,
    #[structopt(
        long = "telo-max-edit-distance",
        default_value = "3",
        help = "Maximum number of edits allowed when searching telomere arrays."
    )]
    pub telo_max_edit_distance: usize,
    #[structopt(
        long = "clustering-threshold",
        default_value = "5",
        allow_hyphen_values = true,
        help = "Breakpoint positions at most this many bases apart are merged into one \
                breakpoint. Negative values are treated as 0."
    )]
    pub clustering_threshold: i64,
    #[structopt(long = "min-mapq", default_value = "20", help = "Minimum mapping quality of reads.")]
    pub min_mapq: u8,
    #[structopt(
        long = "read-filter-flag",
        default_value = "3844",
        help = "Ignore reads having any of these SAM flags \
                (default: UNMAP, SECONDARY, QCFAIL, DUP, SUPPLEMENTARY)."
    )]
    pub read_filter_flag: u16,
    #[structopt(
        long = "min-supporting-reads",
        default_value = "10",
        help = "Minimum number of reads supporting a breakpoint."
    )]
    pub min_supporting_reads: u32,
    #[structopt(
        long = "seq-window-size",
        default_value = "350",
        allow_hyphen_values = true,
        help = "Number of bases extracted on each side of a breakpoint. Values below 1 are \
                treated as 1."
    )]
    pub seq_window_size: i64,
    #[structopt(
        short,
        long = "breakpoint-type",
        default_value = "all",
        help = "Breakpoint type to detect: G2S, S2G or all."
    )]
    pub breakpoint_type: BreakpointTypeSelection,
    #[structopt(short, long, default_value = "1", help = "Number of threads to use.")]
    pub threads: usize,
    #[structopt(long, help = "Print debug information.")]
    pub verbose: bool,
}

impl Delfies {
    pub fn clustering_threshold(&self) -> u64 {
        self.clustering_threshold.max(0) as u64
    }

    pub fn seq_window_size(&self) -> u64 {
        self.seq_window_size.max(1) as u64
    }

    pub fn detection_params(&self) -> Result<DetectionParams> {
        Ok(DetectionParamsBuilder::default()
            .bam_path(self.bam.clone())
            .telomere_seqs(TelomereSeqs::from_forward(&self.telo_forward_seq)?)
            .telo_array_size(self.telo_array_size.max(1))
            .max_edit_distance(self.telo_max_edit_distance)
            .clustering_threshold(self.clustering_threshold())
            .min_mapq(self.min_mapq)
            .read_filter_flag(self.read_filter_flag)
            .min_supporting_reads(self.min_supporting_reads)
            .build()?)
    }

    pub fn region_selection(&self) -> RegionSelection {
        match (&self.seq_region, &self.bed) {
            (_, Some(bed)) => RegionSelection::Bed(bed.clone()),
            (Some(region), None) => RegionSelection::Region(region.clone()),
            (None, None) => RegionSelection::WholeGenome,
        }
    }
}

pub fn run(opt: Delfies) -> Result<()> {
    fs::create_dir_all(&opt.odirname).with_context(|| {
        format!(
            "failed to create output directory {}",
            opt.odirname.display()
        )
    })?;

    let params = opt.detection_params()?;
    let region_selection = opt.region_selection();
    let threads = region_selection.effective_threads(opt.threads);

    let contigs = BamSource::from_path(&opt.bam)?.contigs();
    let regions = region_selection.resolve(&contigs)?;
    info!("Analysing {} regions using {} threads.", regions.len(), threads);

    let reference = reference::Buffer::from_path(&opt.genome, REFERENCE_BUFFER_CAPACITY)?;

    let bam_path = opt.bam.clone();
    let maximal_foci = detect_breakpoints(
        &params,
        &opt.breakpoint_type.breakpoint_types(),
        &regions,
        &reference,
        threads,
        &opt.odirname,
        || BamSource::from_path(&bam_path),
    )?;
    info!("Found {} breakpoints in total.", maximal_foci.len());

    let bed_path = opt.odirname.join(BREAKPOINT_BED_NAME);
    output::write_breakpoint_bed(&maximal_foci, &bed_path)?;
    info!("Wrote breakpoint locations to {}.", bed_path.display());

    let fasta_path = opt.odirname.join(BREAKPOINT_SEQUENCES_NAME);
    output::write_breakpoint_sequences(
        &reference,
        &maximal_foci,
        &fasta_path,
        opt.seq_window_size(),
    )?;
    info!("Wrote breakpoint sequences to {}.", fasta_path.display());

    Ok(())
}
