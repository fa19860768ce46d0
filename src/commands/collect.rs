//! Collect command implementation.
//!
//! The collect command:
//! 1. Runs DTrace with a generated script
//! 2. Optionally saves the raw trace
//! 3. Decodes and aggregates it like `analyze`

use super::analyze::report_events;
use super::models::CollectArgs;
use crate::collector::DtraceCollector;
use crate::parser::parse_trace_text;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the collect command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The text to print on stdout
///
/// # Errors
/// * Invalid collector configuration
/// * DTrace launch or run failures
/// * Trace decoding and tree rebuilding errors
/// * File write errors
pub fn execute_collect(args: &CollectArgs) -> Result<String> {
    let start_time = Instant::now();

    let collector = DtraceCollector::new(&args.dtrace_path);
    let raw_trace = collector
        .collect(&args.config)
        .context("Failed to collect trace")?;

    if let Some(path) = &args.save_trace {
        info!("Saving raw trace to: {}", path.display());
        std::fs::write(path, &raw_trace)
            .with_context(|| format!("Failed to save trace to {}", path.display()))?;
    }

    let events = parse_trace_text(&raw_trace).context("Failed to decode collected trace")?;
    debug!("Decoded {} events", events.len());

    let report = report_events(events, &args.report)?;

    info!(
        "Collection completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Validate collect arguments before launching DTrace
///
/// **Public** - called before execute_collect
pub fn validate_args(args: &CollectArgs) -> Result<()> {
    args.config.validate()?;

    if args.dtrace_path.as_os_str().is_empty() {
        anyhow::bail!("DTrace path cannot be empty");
    }

    Ok(())
}
