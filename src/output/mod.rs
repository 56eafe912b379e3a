// mod.rs - Output formatters module

use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::stats::CognateReport;
use crate::tree::RankedTree;

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<(), String> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                e
            )
        })?;
    }
    Ok(())
}

/// Buffered writer for `path`, or standard output when `None`.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, String> {
    match path {
        Some(path) => {
            ensure_parent_dir(path)?;
            let file = File::create(path).map_err(|e| {
                format!("Failed to create output file '{}': {}", path.display(), e)
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

fn write_error(e: io::Error) -> String {
    format!("Write error: {}", e)
}

/// Run description written alongside the centroid.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub trees_file: String,
    pub tree_count: usize,
    pub taxon_count: usize,
    pub burnin: usize,
    pub algorithm: String,
    pub trials: usize,
    pub improvements: usize,
    pub seed: Option<u64>,
    pub sum_of_squares: f64,
    pub newick: String,
    pub generated: String,
    pub version: String,
}

/// Centroid as a Newick line followed by a NEXUS trees block with a
/// translate table.
pub fn write_centroid<W: Write>(
    writer: &mut W,
    tree: &RankedTree,
    summary: &RunSummary,
    command_line: &str,
) -> Result<(), String> {
    writeln!(writer, "{}", tree.to_newick()).map_err(write_error)?;
    writeln!(writer).map_err(write_error)?;

    let taxa = tree.taxa();
    writeln!(writer, "#NEXUS").map_err(write_error)?;
    writeln!(writer, "[Command: {}]", command_line).map_err(write_error)?;
    writeln!(writer, "[Generated: {}]", summary.generated).map_err(write_error)?;
    writeln!(
        writer,
        "[babelkit v{}; algorithm {}; trials {}; sum of squared distances {}]",
        summary.version, summary.algorithm, summary.trials, summary.sum_of_squares
    )
    .map_err(write_error)?;
    writeln!(writer).map_err(write_error)?;

    writeln!(writer, "Begin taxa;").map_err(write_error)?;
    writeln!(writer, "\tDimensions ntax={};", taxa.len()).map_err(write_error)?;
    writeln!(writer, "\tTaxlabels").map_err(write_error)?;
    for name in taxa.names() {
        writeln!(writer, "\t\t{}", crate::tree::newick::quote_name(name)).map_err(write_error)?;
    }
    writeln!(writer, "\t\t;").map_err(write_error)?;
    writeln!(writer, "End;").map_err(write_error)?;
    writeln!(writer).map_err(write_error)?;

    writeln!(writer, "Begin trees;").map_err(write_error)?;
    writeln!(writer, "\tTranslate").map_err(write_error)?;
    for (i, name) in taxa.names().iter().enumerate() {
        let sep = if i + 1 == taxa.len() { "" } else { "," };
        writeln!(
            writer,
            "\t\t{} {}{}",
            i + 1,
            crate::tree::newick::quote_name(name),
            sep
        )
        .map_err(write_error)?;
    }
    writeln!(writer, "\t\t;").map_err(write_error)?;
    let numbered = tree.to_newick_with(&|leaf| (leaf + 1).to_string());
    writeln!(writer, "tree CENTROID = [&R] {}", numbered).map_err(write_error)?;
    writeln!(writer, "End;").map_err(write_error)?;

    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

/// One `index<TAB>sum` line per focal tree (1-based).
pub fn write_focal_report<W: Write>(writer: &mut W, sums: &[f64]) -> Result<(), String> {
    writeln!(writer, "focal_index\tsum_of_squared_distances").map_err(write_error)?;
    for (i, sum) in sums.iter().enumerate() {
        writeln!(writer, "{}\t{}", i + 1, sum).map_err(write_error)?;
    }
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), String> {
    let mut writer = open_output(Some(path))?;
    serde_json::to_writer_pretty(&mut writer, summary)
        .map_err(|e| format!("Failed to serialize summary: {}", e))?;
    writeln!(writer).map_err(write_error)?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

/// Plain-text tables: singletons, presence histogram, duplicates.
pub fn write_stats_text<W: Write>(writer: &mut W, report: &CognateReport) -> Result<(), String> {
    writeln!(
        writer,
        "# {} taxa, {} sites",
        report.taxon_count, report.site_count
    )
    .map_err(write_error)?;
    writeln!(writer).map_err(write_error)?;

    writeln!(writer, "## Singletons ({})", report.singletons.len()).map_err(write_error)?;
    writeln!(writer, "taxon_index\ttaxon\tsite\tlabel").map_err(write_error)?;
    for s in &report.singletons {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            s.taxon,
            s.taxon_name,
            s.site + 1,
            s.site_label
        )
        .map_err(write_error)?;
    }
    writeln!(writer).map_err(write_error)?;

    writeln!(writer, "## Singletons per taxon").map_err(write_error)?;
    for (taxon, count) in report.singletons_per_taxon.iter().enumerate() {
        writeln!(writer, "{}\t{}", taxon, count).map_err(write_error)?;
    }
    writeln!(writer).map_err(write_error)?;

    writeln!(writer, "## Cognate counts (taxa present -> sites)").map_err(write_error)?;
    for (k, count) in report.cognate_counts.iter().enumerate() {
        writeln!(writer, "{}\t{}", k, count).map_err(write_error)?;
    }
    writeln!(writer).map_err(write_error)?;

    writeln!(writer, "## Duplicate site patterns").map_err(write_error)?;
    writeln!(writer, "partition\tsites\tduplicate_pairs").map_err(write_error)?;
    for p in &report.partitions {
        writeln!(writer, "{}\t{}\t{}", p.name, p.sites, p.duplicates).map_err(write_error)?;
    }
    writeln!(writer, "total\t{}\t{}", report.site_count, report.duplicates)
        .map_err(write_error)?;

    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

pub fn write_stats_json<W: Write>(writer: &mut W, report: &CognateReport) -> Result<(), String> {
    serde_json::to_writer_pretty(&mut *writer, report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    writeln!(writer).map_err(write_error)?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}
