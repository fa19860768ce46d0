//! Persisted statistics format.
//!
//! One JSON object per line, each carrying exactly the seven fields of a
//! [`FuncStats`]:
//!
//! ```text
//! {"name":"foo","total_time":30,"contrib_time":24,"depths":[0,0],"call_count":2,"callers":[],"callees":["bar"]}
//! ```
//!
//! Lines are decoded with serde, never evaluated.

use crate::aggregator::{FuncStats, NormalizedStats};
use crate::utils::error::{OutputError, ParseError};
use clap::ValueEnum;
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// How statistics are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Descriptive text, one record per line
    #[default]
    Human,
    /// The re-parsable persisted format
    Machine,
}

/// Encode one record as a single line (no trailing newline)
pub fn to_machine_line(stats: &FuncStats) -> Result<String, OutputError> {
    Ok(serde_json::to_string(stats)?)
}

/// Decode one line of a statistics file
///
/// # Errors
/// * `ParseError::InvalidRecord` - the line is not a complete seven-field record
pub fn parse_machine_line(line: &str, line_no: usize) -> Result<FuncStats, ParseError> {
    serde_json::from_str(line).map_err(|source| ParseError::InvalidRecord {
        line: line_no,
        source,
    })
}

/// Write records to a statistics file
///
/// **Public** - main entry point for persisting statistics
///
/// # Errors
/// * `OutputError::InvalidPath` - Path is empty, a directory, or its parent cannot be created
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - a record could not be encoded
pub fn write_stats(stats: &[FuncStats], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing {} records to: {}", stats.len(), output_path.display());

    super::validate_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    for record in stats {
        writeln!(writer, "{}", to_machine_line(record)?)?;
    }
    writer.flush()?;

    Ok(())
}

/// Read records back from a statistics file
///
/// **Public** - the inverse of `write_stats`
///
/// Blank lines are skipped; any other line must decode.
///
/// # Errors
/// * `ParseError::Io` - file cannot be opened or read
/// * `ParseError::InvalidRecord` - first undecodable line, with its 1-based number
pub fn read_stats(input_path: impl AsRef<Path>) -> Result<Vec<FuncStats>, ParseError> {
    let input_path = input_path.as_ref();

    debug!("Reading statistics from: {}", input_path.display());

    let reader = BufReader::new(File::open(input_path)?);
    let mut stats = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.push(parse_machine_line(&line, idx + 1)?);
    }

    debug!("Loaded {} records", stats.len());
    Ok(stats)
}

/// Render records for stdout in the requested format
pub fn render_stats(stats: &[FuncStats], format: OutputFormat) -> Result<String, OutputError> {
    let mut out = String::new();
    for record in stats {
        let line = match format {
            OutputFormat::Human => record.to_string(),
            OutputFormat::Machine => to_machine_line(record)?,
        };
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Render normalized records for stdout
pub fn render_normalized(
    stats: &[NormalizedStats],
    format: OutputFormat,
) -> Result<String, OutputError> {
    let mut out = String::new();
    for record in stats {
        let line = match format {
            OutputFormat::Human => record.to_string(),
            OutputFormat::Machine => serde_json::to_string(record)?,
        };
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}
