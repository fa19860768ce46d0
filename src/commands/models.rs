use crate::collector::CollectorConfig;
use crate::output::OutputFormat;
use crate::utils::config::DEFAULT_DTRACE_PATH;
use std::path::PathBuf;

/// How aggregated results are reported, shared by collect and analyze
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    /// Format of the records printed to stdout
    pub output_format: OutputFormat,

    /// Also write records to this statistics file
    pub stats_out: Option<PathBuf>,

    /// Drop runs that cannot be rebuilt instead of failing
    pub skip_invalid_runs: bool,

    /// Print each run's call tree before the statistics
    pub show_trees: bool,
}

/// Arguments for the collect command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct CollectArgs {
    /// What to trace
    pub config: CollectorConfig,

    /// DTrace binary to run
    pub dtrace_path: PathBuf,

    /// Save the raw trace here before aggregating
    pub save_trace: Option<PathBuf>,

    pub report: ReportArgs,
}

impl Default for CollectArgs {
    fn default() -> Self {
        Self {
            config: CollectorConfig::new(String::new()),
            dtrace_path: PathBuf::from(DEFAULT_DTRACE_PATH),
            save_trace: None,
            report: ReportArgs::default(),
        }
    }
}

/// Arguments for the analyze command
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Previously saved raw trace
    pub trace_file: PathBuf,

    pub report: ReportArgs,
}

/// Arguments for the normalize command
#[derive(Debug, Clone, Default)]
pub struct NormalizeArgs {
    /// Statistics file to normalize
    pub stats_file: PathBuf,

    /// Format of the records printed to stdout
    pub output_format: OutputFormat,
}
