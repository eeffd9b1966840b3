//! Activator configuration
//!
//! Loaded from TOML or built in code; every field has a default.
//!
//! ```toml
//! verify_recovery = true
//!
//! [log]
//! format = "json"
//! default_directive = "wsa_core=debug"
//! ```

use crate::error::ActivationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable logs
    #[default]
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is not set
    pub default_directive: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_directive: "info".to_string(),
        }
    }
}

/// Activator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivatorConfig {
    /// Re-read the active web server after a recovery and report a mismatch
    pub verify_recovery: bool,
    /// Logging setup
    pub log: LogConfig,
}

impl ActivatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With recovery verification
    #[inline]
    #[must_use]
    pub fn with_verify_recovery(mut self, verify: bool) -> Self {
        self.verify_recovery = verify;
        self
    }

    /// With logging setup
    #[inline]
    #[must_use]
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// - `ActivationError::Config` on malformed TOML or unknown values
    pub fn from_toml_str(input: &str) -> Result<Self, ActivationError> {
        toml::from_str(input).map_err(|e| ActivationError::Config(e.to_string()))
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// - `ActivationError::Config` if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ActivationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ActivationError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ActivatorConfig::new();
        assert!(!config.verify_recovery);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.log.default_directive, "info");
    }

    #[test]
    fn parses_partial_toml() {
        let config = ActivatorConfig::from_toml_str("verify_recovery = true\n[log]\nformat = \"json\"\n")
            .unwrap();
        assert!(config.verify_recovery);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.default_directive, "info");
    }

    #[test]
    fn rejects_unknown_format() {
        let err = ActivatorConfig::from_toml_str("[log]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(err, ActivationError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "verify_recovery = true").unwrap();

        let config = ActivatorConfig::from_path(file.path()).unwrap();
        assert_eq!(config, ActivatorConfig::new().with_verify_recovery(true));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = ActivatorConfig::from_path("/nonexistent/wsa.toml").unwrap_err();
        assert!(err.to_string().starts_with("configuration error"));
    }
}
