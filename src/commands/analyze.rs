//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Reads a saved raw trace
//! 2. Rebuilds one call tree per run
//! 3. Aggregates per-function statistics
//! 4. Prints and optionally persists them

use super::models::{AnalyzeArgs, ReportArgs};
use crate::aggregator::{aggregate_trees, build_run_trees, AggregateOptions};
use crate::output::{render_stats, write_stats};
use crate::parser::{read_trace_file, TraceEvent};
use anyhow::{bail, Context, Result};
use log::info;
use std::time::Instant;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The text to print on stdout
pub fn execute_analyze(args: &AnalyzeArgs) -> Result<String> {
    let start_time = Instant::now();

    info!("Analyzing trace file: {}", args.trace_file.display());
    let events = read_trace_file(&args.trace_file)?;

    let report = report_events(events, &args.report)?;

    info!(
        "Analysis completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Aggregate decoded events and produce the stdout report
///
/// **Public** - shared with the collect command
pub fn report_events(events: Vec<TraceEvent>, args: &ReportArgs) -> Result<String> {
    if events.is_empty() {
        bail!("Trace contains no events");
    }

    let options = AggregateOptions {
        skip_invalid_runs: args.skip_invalid_runs,
    };
    let trees = build_run_trees(events, options).context("Failed to rebuild call trees")?;
    if trees.is_empty() {
        bail!("No run could be rebuilt from the trace");
    }

    let stats = aggregate_trees(&trees).context("Failed to aggregate statistics")?;
    info!(
        "Aggregated {} functions from {} runs",
        stats.len(),
        trees.len()
    );

    if let Some(path) = &args.stats_out {
        write_stats(&stats, path).context("Failed to write statistics file")?;
    }

    let mut out = String::new();
    if args.show_trees {
        for tree in &trees {
            out.push_str(&format!("run {}\n{}\n", tree.run_id(), tree));
        }
    }
    out.push_str(&render_stats(&stats, args.output_format)?);

    Ok(out)
}
