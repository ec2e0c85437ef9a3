//! logspool configuration loading and validation.
//!
//! This crate provides:
//! - The typed `SpoolConfig` with the reference defaults
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation with stable error codes

pub mod load;
pub mod resolve;
pub mod settings;
pub mod validate;

pub use load::{load_config, load_from_file, ConfigError, ResolvedConfig};
pub use resolve::{
    default_data_root, resolve_config, ConfigSource, ENV_CONFIG_DIR, ENV_CONFIG_PATH, ENV_DATA_DIR,
};
pub use settings::{BatchFormat, SpoolConfig};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
