//! Cross-run aggregation of per-function statistics.
//!
//! Events are partitioned by run id, each run is rebuilt into its own
//! call tree, and the per-run records are merged by function name.
//! Merging is associative and commutative, so the order runs are
//! processed in does not affect the result.

use super::run_tree::RunTree;
use super::stats::FuncStats;
use super::tree_builder::build_run_tree;
use crate::parser::TraceEvent;
use crate::utils::error::TraceError;
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Knobs for a batch aggregation
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    /// Drop runs whose tree cannot be rebuilt instead of failing the batch
    pub skip_invalid_runs: bool,
}

/// Partition events by run id, keeping arrival order within each run
///
/// **Public** - first step of aggregation
pub fn group_by_run(events: Vec<TraceEvent>) -> BTreeMap<u64, Vec<TraceEvent>> {
    let mut runs: BTreeMap<u64, Vec<TraceEvent>> = BTreeMap::new();
    for event in events {
        runs.entry(event.run_id()).or_default().push(event);
    }
    runs
}

/// Build one call tree per run
///
/// **Public** - used by `aggregate` and by callers that want the trees
///
/// # Errors
/// The first run that fails to rebuild, unless `skip_invalid_runs` is set,
/// in which case the failure is logged and the run left out.
pub fn build_run_trees(
    events: Vec<TraceEvent>,
    options: AggregateOptions,
) -> Result<Vec<RunTree>, TraceError> {
    let runs = group_by_run(events);
    info!("Rebuilding call trees for {} runs", runs.len());

    let mut trees = Vec::with_capacity(runs.len());
    for (run_id, run_events) in runs {
        match build_run_tree(run_id, &run_events) {
            Ok(tree) => {
                debug!("Run {}: {} calls", run_id, tree.node_count());
                trees.push(tree);
            }
            Err(e) if options.skip_invalid_runs => {
                warn!("Skipping run {}: {}", run_id, e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(trees)
}

/// Merge records that share a function name
///
/// **Public** - the cross-run fold
///
/// # Returns
/// One record per function name, in order of first appearance
///
/// # Errors
/// * `TraceError::TimeOverflow` - a merged time or count leaves its range
pub fn merge_stats(
    stats: impl IntoIterator<Item = FuncStats>,
) -> Result<Vec<FuncStats>, TraceError> {
    let mut merged: Vec<FuncStats> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in stats {
        match slots.get(&record.name) {
            Some(&slot) => merged[slot].absorb(record)?,
            None => {
                slots.insert(record.name.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    Ok(merged)
}

/// Order records root-to-leaf by mean observed depth, ties by name
pub fn sort_by_mean_depth(stats: &mut [FuncStats]) {
    stats.sort_by(|a, b| {
        a.mean_depth()
            .partial_cmp(&b.mean_depth())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Aggregate a batch of events into one record per function
///
/// **Public** - main entry point for aggregation
///
/// # Arguments
/// * `events` - Decoded events spanning any number of runs
/// * `options` - Aggregation options
///
/// # Returns
/// Merged statistics sorted by mean depth
pub fn aggregate(
    events: Vec<TraceEvent>,
    options: AggregateOptions,
) -> Result<Vec<FuncStats>, TraceError> {
    let trees = build_run_trees(events, options)?;
    aggregate_trees(&trees)
}

/// Aggregate already-built trees
///
/// **Public** - lets callers keep the trees around for rendering
pub fn aggregate_trees(trees: &[RunTree]) -> Result<Vec<FuncStats>, TraceError> {
    let per_run = trees
        .iter()
        .map(RunTree::stats)
        .collect::<Result<Vec<_>, _>>()?;
    let mut stats = merge_stats(per_run.into_iter().flatten())?;
    sort_by_mean_depth(&mut stats);

    debug!(
        "Aggregated {} functions across {} runs",
        stats.len(),
        trees.len()
    );
    Ok(stats)
}
