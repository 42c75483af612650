//! output.rs
//!
//! Output generation:
//! 1. Raw tents per breakpoint type (TSV)
//! 2. Breakpoint locations (BED)
//! 3. Reference sequence around each breakpoint (FASTA)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::fasta;

use crate::breakpoints::{MaximalFocus, Tents};
use crate::reference::SequenceAccessor;

/// Write all tents as tab separated table with header.
///
/// # Example Output
/// ```text
/// contig	position	orientation	support_count	breakpoint_type
/// chr1	1000	forward	4	G2S
/// ```
pub fn write_tents(tents: &Tents, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("failed to create tent file {}", path.display()))?;
    for focus in tents.foci() {
        writer.serialize(focus)?;
    }
    writer.flush()?;
    Ok(())
}

/// Name column of the breakpoint BED: breakpoint type and cluster span.
fn breakpoint_name(maximal_focus: &MaximalFocus) -> String {
    let (start, end) = maximal_focus.cluster_span();
    format!(
        "Type:{};breakpoint_window:{}-{}",
        maximal_focus.breakpoint_type(),
        start,
        end
    )
}

/// Write one BED line per maximal focus, in the given order.
///
/// # Example Output
/// ```text
/// chr1	1003	1004	Type:G2S;breakpoint_window:1000-1003	6	+
/// ```
pub fn write_breakpoint_bed(maximal_foci: &[MaximalFocus], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create BED file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for maximal_focus in maximal_foci {
        let (start, end) = maximal_focus.focus().coordinates().unwrap_or_default();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            maximal_focus.contig(),
            start,
            end,
            breakpoint_name(maximal_focus),
            maximal_focus.max_value(),
            maximal_focus.orientation().strand_symbol(),
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the reference sequence `[peak - window, peak + window)` of each maximal focus,
/// clipped to the contig.
///
/// Record ids are the extracted region, the description holds type, strand and support.
/// Foci on contigs absent from the reference are skipped.
pub fn write_breakpoint_sequences<R: SequenceAccessor>(
    reference: &R,
    maximal_foci: &[MaximalFocus],
    path: &Path,
    window_size: u64,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create FASTA file {}", path.display()))?;
    let mut writer = fasta::Writer::new(BufWriter::new(file));

    for maximal_focus in maximal_foci {
        let contig_len = match reference.contig_len(maximal_focus.contig()) {
            Some(len) => len,
            None => {
                warn!(
                    "Contig {} not found in reference, no sequence written for breakpoint at {}.",
                    maximal_focus.contig(),
                    maximal_focus.position()
                );
                continue;
            }
        };
        let position = maximal_focus.position();
        let start = position.saturating_sub(window_size).min(contig_len);
        let end = (position + window_size).min(contig_len);
        let seq = reference.seq_window(maximal_focus.contig(), start, end)?;

        let id = format!("{}:{}-{}", maximal_focus.contig(), start, end);
        let description = format!(
            "breakpoint_type={};strand={};support={}",
            maximal_focus.breakpoint_type(),
            maximal_focus.orientation().strand_symbol(),
            maximal_focus.max_value()
        );
        writer.write(&id, Some(description.as_str()), &seq)?;
    }
    writer.flush()?;
    Ok(())
}
