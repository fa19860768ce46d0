//! Call tree reconstruction and statistics aggregation.
//!
//! This module transforms decoded trace events into:
//! - One call tree per run (tree_builder, run_tree)
//! - Per-function statistics merged across runs (stats, metrics)
//! - Normalized statistics for cross-dataset comparison (normalizer)

pub mod metrics;
pub mod normalizer;
pub mod run_tree;
pub mod stats;
pub mod tree_builder;

// Re-export main types and functions
pub use metrics::{
    aggregate, aggregate_trees, build_run_trees, group_by_run, merge_stats, sort_by_mean_depth,
    AggregateOptions,
};
pub use normalizer::{normalize, NormalizedStats};
pub use run_tree::{Node, NodeId, RunTree};
pub use stats::{find_root, index_by_name, FuncStats};
pub use tree_builder::build_run_tree;
