//! Trace collection through DTrace.
//!
//! The collector renders a D script for the configured target function,
//! runs it with the system `dtrace` binary and hands back everything the
//! script printed. Decoding the output is left to the parser.

pub mod config;
pub mod script;

pub use config::{load_collector_config, CollectorConfig};
pub use script::render_script;

use crate::utils::error::CollectorError;
use log::{debug, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Runs generated scripts with a DTrace binary
pub struct DtraceCollector {
    dtrace_path: PathBuf,
}

impl DtraceCollector {
    /// Create a collector using the given DTrace binary
    pub fn new(dtrace_path: impl Into<PathBuf>) -> Self {
        Self {
            dtrace_path: dtrace_path.into(),
        }
    }

    /// Collect raw trace text for `config.num_runs` runs
    ///
    /// **Public** - blocks until DTrace exits
    ///
    /// # Errors
    /// * `CollectorError::InvalidConfig` - config fails validation
    /// * `CollectorError::Io` - script cannot be written
    /// * `CollectorError::Spawn` - DTrace cannot be launched
    /// * `CollectorError::Failed` - DTrace failed without printing any trace
    pub fn collect(&self, config: &CollectorConfig) -> Result<String, CollectorError> {
        config.validate()?;

        let mut script_file = NamedTempFile::new()?;
        script_file.write_all(render_script(config).as_bytes())?;
        script_file.flush()?;
        debug!("Wrote D script to {}", script_file.path().display());

        info!(
            "Tracing {} runs of {} with {}",
            config.num_runs,
            config.target_function,
            self.dtrace_path.display()
        );

        let output = Command::new(&self.dtrace_path)
            .arg("-s")
            .arg(script_file.path())
            .arg("-q")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CollectorError::Spawn {
                program: self.dtrace_path.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            if stdout.trim().is_empty() {
                return Err(CollectorError::Failed {
                    status: output.status.to_string(),
                    stderr,
                });
            }
            warn!("DTrace exited with {}", output.status);
        }
        if !stderr.is_empty() {
            warn!("DTrace stderr: {}", stderr);
        }

        debug!("Collected {} bytes of trace output", stdout.len());
        Ok(stdout)
    }
}
