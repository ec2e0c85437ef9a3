//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::settings::SpoolConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::SemanticError(_) => 63,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration semantically.
pub fn validate_config(config: &SpoolConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.max_batch_size == 0 {
        return Err(invalid("max_batch_size", "Must be > 0"));
    }
    if config.max_items_per_batch == 0 {
        return Err(invalid("max_items_per_batch", "Must be > 0"));
    }
    if config.max_disk_space == 0 {
        return Err(invalid("max_disk_space", "Must be > 0"));
    }
    if config.old_file_threshold_ms == 0 {
        return Err(invalid("old_file_threshold_ms", "Must be > 0"));
    }

    if config.max_disk_space < config.max_batch_size {
        return Err(ValidationError::SemanticError(format!(
            "max_disk_space ({}) must be at least max_batch_size ({})",
            config.max_disk_space, config.max_batch_size
        )));
    }

    // Sealed files must have a window in which they can be read before purge.
    if config.old_file_threshold_ms <= config.recent_delay_ms {
        return Err(ValidationError::SemanticError(format!(
            "old_file_threshold_ms ({}) must exceed recent_delay_ms ({})",
            config.old_file_threshold_ms, config.recent_delay_ms
        )));
    }

    if config.format.separator.is_empty() {
        return Err(invalid("format.separator", "Must not be empty"));
    }

    validate_directory_prefix(&config.directory_prefix)?;

    Ok(())
}

fn validate_directory_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(invalid("directory_prefix", "Must not be empty"));
    }
    if prefix == "." || prefix == ".." {
        return Err(invalid("directory_prefix", "Must not be a relative path"));
    }
    if prefix.contains('/') || prefix.contains('\\') {
        return Err(invalid(
            "directory_prefix",
            format!("Must not contain path separators, got {}", prefix),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BatchFormat;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SpoolConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = SpoolConfig::default().with_max_items_per_batch(0);
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.code(), 65);
        assert!(err.to_string().contains("max_items_per_batch"));

        let config = SpoolConfig::default().with_max_batch_size(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_disk_space_below_batch_size_rejected() {
        let config = SpoolConfig::default()
            .with_max_batch_size(1024)
            .with_max_disk_space(512);
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::SemanticError(_)));
    }

    #[test]
    fn test_threshold_must_exceed_recent_delay() {
        let config = SpoolConfig::default()
            .with_recent_delay_ms(10_000)
            .with_old_file_threshold_ms(10_000);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_separator_rejected() {
        let config = SpoolConfig::default().with_format(BatchFormat {
            separator: String::new(),
            ..Default::default()
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("format.separator"));
    }

    #[test]
    fn test_directory_prefix_rules() {
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            let config = SpoolConfig::default().with_directory_prefix(bad);
            assert!(validate_config(&config).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_version_mismatch() {
        let config = SpoolConfig {
            schema_version: "0.9.0".to_string(),
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.code(), 66);
    }
}
