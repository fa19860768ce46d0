use super::models::NormalizeArgs;
use crate::aggregator::{find_root, normalize};
use crate::output::{read_stats, render_normalized};
use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

/// Validate a statistics file and summarize it
///
/// # Returns
/// The summary to print on stdout
pub fn validate_stats_file(file_path: &Path) -> Result<String> {
    let stats = read_stats(file_path)
        .with_context(|| format!("Invalid statistics file {}", file_path.display()))?;

    let total_calls: u64 = stats.iter().map(|s| s.call_count).sum();
    let root = find_root(&stats).map(|s| s.name.as_str()).unwrap_or("-");

    let mut out = String::new();
    out.push_str(&format!("Validating statistics: {}\n", file_path.display()));
    out.push_str(&format!("{}\n", "✓ Valid statistics file".green()));
    out.push_str(&format!("  Functions: {}\n", stats.len()));
    out.push_str(&format!("  Calls: {}\n", total_calls));
    out.push_str(&format!("  Root: {}\n", root.cyan()));
    Ok(out)
}

/// Normalize a statistics file
///
/// # Returns
/// The normalized records to print on stdout
pub fn execute_normalize(args: &NormalizeArgs) -> Result<String> {
    let stats = read_stats(&args.stats_file)
        .with_context(|| format!("Invalid statistics file {}", args.stats_file.display()))?;
    let normalized = normalize(&stats).context("Failed to normalize statistics")?;
    Ok(render_normalized(&normalized, args.output_format)?)
}

/// Display version information
pub fn display_version() {
    println!("Topo Trace v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Call tree reconstruction and per-function timing statistics from DTrace traces.");
}
