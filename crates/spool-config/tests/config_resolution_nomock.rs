//! No-mock configuration resolution tests.
//!
//! Covers:
//! - Resolution order (CLI > LOGSPOOL_CONFIG > LOGSPOOL_CONFIG_DIR)
//! - Data root override via LOGSPOOL_DATA_DIR
//! - Validation of real JSON files on disk

use spool_config::resolve::{ENV_CONFIG_DIR, ENV_CONFIG_PATH, ENV_DATA_DIR};
use spool_config::{default_data_root, load_config, resolve_config, ConfigError, ConfigSource};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    f()
}

fn write_config(path: &Path, json: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create config parent");
    }
    fs::write(path, json).expect("write config");
}

#[test]
fn env_path_is_used_when_no_cli_path() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        write_config(&path, r#"{"max_items_per_batch": 7}"#);

        env::set_var(ENV_CONFIG_PATH, &path);
        env::remove_var(ENV_CONFIG_DIR);

        let (resolved, source) = resolve_config(None);
        assert_eq!(resolved.as_deref(), Some(path.as_path()));
        assert_eq!(source, ConfigSource::Environment);

        let loaded = load_config(None).unwrap();
        assert_eq!(loaded.config.max_items_per_batch, 7);
    });
}

#[test]
fn config_dir_env_is_second_choice() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let dir = TempDir::new().unwrap();
        write_config(&dir.path().join("config.json"), r#"{"recent_delay_ms": 250}"#);

        env::set_var(ENV_CONFIG_PATH, dir.path().join("missing.json"));
        env::set_var(ENV_CONFIG_DIR, dir.path());

        let loaded = load_config(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::Environment);
        assert_eq!(loaded.config.recent_delay_ms, 250);
    });
}

#[test]
fn cli_path_beats_environment() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let dir = TempDir::new().unwrap();
        let env_path = dir.path().join("env.json");
        let cli_path = dir.path().join("cli.json");
        write_config(&env_path, r#"{"max_items_per_batch": 1}"#);
        write_config(&cli_path, r#"{"max_items_per_batch": 2}"#);

        env::set_var(ENV_CONFIG_PATH, &env_path);

        let loaded = load_config(Some(&cli_path)).unwrap();
        assert_eq!(loaded.source, ConfigSource::CliArgument);
        assert_eq!(loaded.config.max_items_per_batch, 2);
    });
}

#[test]
fn invalid_file_reports_validation_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    write_config(
        &path,
        r#"{"max_batch_size": 4096, "max_disk_space": 1024}"#,
    );

    match load_config(Some(&path)) {
        Err(ConfigError::ValidationError(e)) => {
            assert!(e.to_string().contains("max_disk_space"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn data_root_env_override() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_DATA_DIR]);
        let dir = TempDir::new().unwrap();

        env::set_var(ENV_DATA_DIR, dir.path());
        assert_eq!(default_data_root(), dir.path());

        env::remove_var(ENV_DATA_DIR);
        assert!(default_data_root().ends_with("logspool"));
    });
}
