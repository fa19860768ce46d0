//! Topo Trace CLI
//!
//! Traces a function with DTrace, rebuilds the call tree of every run and
//! prints per-function timing statistics.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use topo_trace::collector::{load_collector_config, CollectorConfig};
use topo_trace::commands::{
    display_version, execute_analyze, execute_collect, execute_normalize, validate_args,
    validate_stats_file, AnalyzeArgs, CollectArgs, NormalizeArgs, ReportArgs,
};
use topo_trace::output::OutputFormat;
use topo_trace::utils::config::{DEFAULT_DTRACE_PATH, DEFAULT_NUM_RUNS, DTRACE_PATH_ENV};

/// Topo Trace - call tree statistics from DTrace
#[derive(Parser, Debug)]
#[command(name = "topo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Reporting flags shared by collect and analyze
#[derive(clap::Args, Debug)]
struct ReportFlags {
    /// Type of output
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    output: OutputFormat,

    /// Also write machine-format statistics to this file
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Skip runs whose call tree cannot be rebuilt
    #[arg(long)]
    skip_invalid_runs: bool,

    /// Print the call tree of every run
    #[arg(long)]
    show_trees: bool,
}

impl From<ReportFlags> for ReportArgs {
    fn from(flags: ReportFlags) -> Self {
        ReportArgs {
            output_format: flags.output,
            stats_out: flags.stats_out,
            skip_invalid_runs: flags.skip_invalid_runs,
            show_trees: flags.show_trees,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Trace a function with DTrace and aggregate the runs
    Collect {
        /// Function to trace
        function: Option<String>,

        /// Module of the function
        #[arg(short, long, default_value = "")]
        module: String,

        /// Number of runs
        #[arg(short = 'n', long = "num-runs", default_value_t = DEFAULT_NUM_RUNS)]
        num_runs: u32,

        /// Collector config file (TOML); replaces function, module and runs
        #[arg(long, conflicts_with = "function")]
        config: Option<PathBuf>,

        /// DTrace binary
        #[arg(long, env = DTRACE_PATH_ENV, default_value = DEFAULT_DTRACE_PATH)]
        dtrace: PathBuf,

        /// Save the raw trace to this file
        #[arg(long)]
        save_trace: Option<PathBuf>,

        #[command(flatten)]
        report: ReportFlags,
    },

    /// Aggregate a previously saved raw trace
    Analyze {
        /// Path to the raw trace
        trace: PathBuf,

        #[command(flatten)]
        report: ReportFlags,
    },

    /// Validate a statistics file
    Validate {
        /// Path to the statistics file
        file: PathBuf,
    },

    /// Print normalized statistics
    Normalize {
        /// Path to the statistics file
        file: PathBuf,

        /// Type of output
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
        output: OutputFormat,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    let output = match cli.command {
        Commands::Collect {
            function,
            module,
            num_runs,
            config,
            dtrace,
            save_trace,
            report,
        } => {
            let config = match (config, function) {
                (Some(path), _) => load_collector_config(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                (None, Some(function)) => CollectorConfig::new(function)
                    .with_module(module)
                    .with_num_runs(num_runs),
                (None, None) => anyhow::bail!("Either a function name or --config is required"),
            };

            let args = CollectArgs {
                config,
                dtrace_path: dtrace,
                save_trace,
                report: report.into(),
            };

            // Validate args first
            validate_args(&args)?;

            execute_collect(&args)?
        }

        Commands::Analyze { trace, report } => execute_analyze(&AnalyzeArgs {
            trace_file: trace,
            report: report.into(),
        })?,

        Commands::Validate { file } => validate_stats_file(&file)?,

        Commands::Normalize { file, output } => execute_normalize(&NormalizeArgs {
            stats_file: file,
            output_format: output,
        })?,

        Commands::Version => {
            display_version();
            return Ok(());
        }
    };

    print!("{}", output);
    Ok(())
}
