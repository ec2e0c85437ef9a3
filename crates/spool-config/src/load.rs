//! Configuration loading.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::resolve::{resolve_config, ConfigSource};
use crate::settings::SpoolConfig;
use crate::validate::{validate_config, ValidationError};

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::NotFound { .. } => 60,
            ConfigError::ParseError { .. } => 61,
            ConfigError::IoError { .. } => 62,
            ConfigError::ValidationError(e) => e.code(),
        }
    }
}

/// Configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: SpoolConfig,
    /// Path to the config file (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Load configuration with the standard resolution order and validate it.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = resolve_config(cli_path);

    let config = match &path {
        Some(path) => load_from_file(path)?,
        None => SpoolConfig::default(),
    };

    validate_config(&config)?;
    debug!(source = %source, path = ?path, "Resolved logspool configuration");

    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}

/// Parse a config file without validating it.
pub fn load_from_file(path: &Path) -> Result<SpoolConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::IoError {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"recent_delay_ms": 100, "max_items_per_batch": 32}"#).unwrap();

        let resolved = load_config(Some(&path)).unwrap();
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(path.as_path()));
        assert_eq!(resolved.config.recent_delay_ms, 100);
        assert_eq!(resolved.config.max_items_per_batch, 32);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(err.code(), 60);
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_semantically_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_batch_size": 0}"#).unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert_eq!(err.code(), 65);
    }
}
