//! What to trace and for how long.

use crate::utils::config::{DEFAULT_NUM_RUNS, PROBE_NAME_EXTRA_CHARS};
use crate::utils::error::CollectorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Collector configuration
///
/// Can be loaded from TOML:
///
/// ```toml
/// target_function = "vn_open"
/// module = "kernel"
/// num_runs = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CollectorConfig {
    /// Function whose calls delimit a run
    pub target_function: String,

    /// Probe module scope; empty matches any module
    #[serde(default)]
    pub module: String,

    /// Completed runs to collect before stopping
    #[serde(default = "default_num_runs")]
    pub num_runs: u32,
}

fn default_num_runs() -> u32 {
    DEFAULT_NUM_RUNS
}

impl CollectorConfig {
    pub fn new(target_function: impl Into<String>) -> Self {
        Self {
            target_function: target_function.into(),
            module: String::new(),
            num_runs: DEFAULT_NUM_RUNS,
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_num_runs(mut self, num_runs: u32) -> Self {
        self.num_runs = num_runs;
        self
    }

    /// Check the config is safe to splice into a D script
    ///
    /// # Errors
    /// * `CollectorError::InvalidConfig` - empty or non-identifier names, zero runs
    pub fn validate(&self) -> Result<(), CollectorError> {
        if self.target_function.is_empty() {
            return Err(CollectorError::InvalidConfig(
                "target function cannot be empty".to_string(),
            ));
        }
        if !is_probe_name(&self.target_function) {
            return Err(CollectorError::InvalidConfig(format!(
                "target function is not a valid probe name: {:?}",
                self.target_function
            )));
        }
        if !self.module.is_empty() && !is_probe_name(&self.module) {
            return Err(CollectorError::InvalidConfig(format!(
                "module is not a valid probe name: {:?}",
                self.module
            )));
        }
        if self.num_runs == 0 {
            return Err(CollectorError::InvalidConfig(
                "number of runs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_probe_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || PROBE_NAME_EXTRA_CHARS.contains(&c))
}

/// Load a collector config from a TOML file
///
/// # Errors
/// * `CollectorError::Io` - file cannot be read
/// * `CollectorError::ConfigParse` - TOML is invalid
/// * `CollectorError::InvalidConfig` - values fail validation
pub fn load_collector_config(path: impl AsRef<Path>) -> Result<CollectorConfig, CollectorError> {
    let contents = fs::read_to_string(path)?;
    let config: CollectorConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_toml() {
        let config: CollectorConfig = toml::from_str(r#"target_function = "foo""#).unwrap();
        assert_eq!(config, CollectorConfig::new("foo"));
        assert_eq!(config.num_runs, 1);
        assert!(config.module.is_empty());
    }

    #[test]
    fn test_full_toml() {
        let config: CollectorConfig = toml::from_str(
            r#"
            target_function = "vn_open"
            module = "mach_kernel"
            num_runs = 5
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            CollectorConfig::new("vn_open")
                .with_module("mach_kernel")
                .with_num_runs(5)
        );
    }

    #[test]
    fn test_validate() {
        assert!(CollectorConfig::new("foo_bar").validate().is_ok());
        assert!(CollectorConfig::new("").validate().is_err());
        assert!(CollectorConfig::new("foo\"; exit(0)").validate().is_err());
        assert!(CollectorConfig::new("foo").with_module("a b").validate().is_err());
        assert!(CollectorConfig::new("foo").with_num_runs(0).validate().is_err());
    }
}
