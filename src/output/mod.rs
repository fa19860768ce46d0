//! Output writers and readers for statistics.
//!
//! This module handles:
//! - The persisted one-record-per-line statistics format
//! - Human and machine renderings for stdout

pub mod records;

// Re-export main functions
pub use records::{
    parse_machine_line, read_stats, render_normalized, render_stats, to_machine_line, write_stats,
    OutputFormat,
};

use crate::utils::error::OutputError;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
