//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

/// Where the configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "LOGSPOOL_CONFIG";
pub const ENV_CONFIG_DIR: &str = "LOGSPOOL_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "LOGSPOOL_DATA_DIR";

/// Standard config file name.
const CONFIG_FILENAME: &str = "config.json";

/// Application name for XDG directories.
const APP_NAME: &str = "logspool";

/// Resolve the configuration file path.
///
/// 1. Explicit CLI path. Returned even if missing so the loader can report it.
/// 2. `LOGSPOOL_CONFIG` (direct path)
/// 3. `LOGSPOOL_CONFIG_DIR` + `config.json`
/// 4. XDG config directory (`~/.config/logspool/config.json`)
/// 5. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(xdg_config) = xdg_config_dir() {
        let path = xdg_config.join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Get the XDG config directory for logspool.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Root under which versioned data directories are created.
///
/// `LOGSPOOL_DATA_DIR` wins; otherwise the platform's local data directory.
pub fn default_data_root() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_cli_path_wins_even_if_missing() {
        let path = Path::new("/definitely/not/here/config.json");
        let (resolved, source) = resolve_config(Some(path));
        assert_eq!(resolved.as_deref(), Some(path));
        assert_eq!(source, ConfigSource::CliArgument);
    }

    #[test]
    fn test_xdg_config_dir() {
        if let Some(path) = xdg_config_dir() {
            assert!(path.ends_with(APP_NAME));
        }
    }
}
