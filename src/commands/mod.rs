//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod collect;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use analyze::{execute_analyze, report_events};
pub use collect::{execute_collect, validate_args};
pub use models::{AnalyzeArgs, CollectArgs, NormalizeArgs, ReportArgs};
pub use utils::{display_version, execute_normalize, validate_stats_file};
