//! Configuration management for NotifyBox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use notifybox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Throttle: {}", config.dispatch.throttle);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `NOTIFYBOX__<section>__<key>`
//!
//! Examples:
//! - `NOTIFYBOX__DISPATCH__THROTTLE=2s`
//! - `NOTIFYBOX__HTTP__REQUEST_TIMEOUT=10s`
//! - `NOTIFYBOX__LOGGING__JSON=true`
//!
//! Target URLs carry credentials and may instead be supplied through
//! `NOTIFYBOX_TARGETS`, which replaces `dispatch.targets` when non-empty.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/notifybox.toml`.
//! This can be overridden using the `NOTIFYBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, DispatchConfig, HttpConfig, ImagesConfig, LoggingConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`NOTIFYBOX__*`, `NOTIFYBOX_TARGETS`)
    /// 2. TOML file (default: `config/notifybox.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Full load with an explicit file, e.g. from `--config`
    pub fn load_with(path: Option<std::path::PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load_with(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[dispatch]
targets = ["json://localhost:8080/hook", "pbul://token"]
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.dispatch.targets.len(), 2);
        assert_eq!(config.dispatch.default_scheme, "unknown");
    }

    #[test]
    fn test_validation_failure_surfaces() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[dispatch]
throttle = "10m"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let err = Config::load_from_path(config_path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError(ValidationError::ThrottleTooLong { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        fs::write(&config_path, "[dispatch\nthrottle = ").unwrap();

        let err = Config::load_from_path(config_path).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
