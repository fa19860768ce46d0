//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while decoding trace lines or rebuilding a run's call tree
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceError {
    #[error("Malformed trace line {line}: {message} ({text:?})")]
    MalformedLine {
        line: usize,
        text: String,
        message: String,
    },

    #[error("Malformed trace in run {run_id}, call {call_id}: {message}")]
    MalformedTree {
        run_id: u64,
        call_id: u64,
        message: String,
    },

    #[error("Missing return event in run {run_id}, call {call_id}")]
    MissingReturn { run_id: u64, call_id: u64 },

    #[error("No trace events for run {0}")]
    EmptyRun(u64),

    #[error("Time overflow in statistics of {function}")]
    TimeOverflow { function: String },
}

impl TraceError {
    /// Shorthand for tree-level invariant violations
    pub fn malformed_tree(run_id: u64, call_id: u64, message: impl Into<String>) -> Self {
        TraceError::MalformedTree {
            run_id,
            call_id,
            message: message.into(),
        }
    }
}

/// Errors that can occur while reading a persisted statistics file
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read statistics file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid statistics record on line {line}: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur during normalization
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Cannot normalize: sum of {field} is zero")]
    Degenerate { field: &'static str },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while configuring or running the trace collector
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Invalid collector configuration: {0}")]
    InvalidConfig(String),

    #[error("Collector I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Collector config TOML parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Collector exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}
