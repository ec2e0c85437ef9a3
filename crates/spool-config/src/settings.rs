//! Queue settings.
//!
//! Every field has a serde default so a partial `config.json` only needs to
//! name what it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Write-to-read grace period.
pub const DEFAULT_RECENT_DELAY_MS: u64 = 5_000;

/// 4 MiB.
pub const DEFAULT_MAX_BATCH_SIZE: u64 = 4 * 1024 * 1024;

pub const DEFAULT_MAX_ITEMS_PER_BATCH: usize = 500;

/// 18 hours.
pub const DEFAULT_OLD_FILE_THRESHOLD_MS: u64 = 18 * 60 * 60 * 1000;

/// 512 MiB, i.e. 128 full batches.
pub const DEFAULT_MAX_DISK_SPACE: u64 = 128 * DEFAULT_MAX_BATCH_SIZE;

/// Name prefix of the versioned data directory.
pub const DEFAULT_DIRECTORY_PREFIX: &str = "logspool-logs";

/// How fragments are laid out in a batch file and wrapped for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFormat {
    /// Prepended to the file content when a batch is read.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Appended to the file content when a batch is read.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Written between two fragments in the same file.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_prefix() -> String {
    "[".to_string()
}

fn default_suffix() -> String {
    "]".to_string()
}

fn default_separator() -> String {
    ",".to_string()
}

impl Default for BatchFormat {
    fn default() -> Self {
        BatchFormat {
            prefix: default_prefix(),
            suffix: default_suffix(),
            separator: default_separator(),
        }
    }
}

impl BatchFormat {
    /// Wrap raw file content into a deliverable payload.
    pub fn wrap(&self, content: &[u8]) -> Vec<u8> {
        let mut payload =
            Vec::with_capacity(self.prefix.len() + content.len() + self.suffix.len());
        payload.extend_from_slice(self.prefix.as_bytes());
        payload.extend_from_slice(content);
        payload.extend_from_slice(self.suffix.as_bytes());
        payload
    }
}

/// Immutable per-engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Minimum file age before it becomes read-eligible. Files younger than
    /// this may still receive appends.
    #[serde(default = "default_recent_delay_ms")]
    pub recent_delay_ms: u64,

    /// Byte ceiling of one batch file.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: u64,

    /// Event ceiling of one batch file.
    #[serde(default = "default_max_items_per_batch")]
    pub max_items_per_batch: usize,

    /// Files older than this are purged without being delivered.
    #[serde(default = "default_old_file_threshold_ms")]
    pub old_file_threshold_ms: u64,

    /// Byte ceiling across all batch files.
    #[serde(default = "default_max_disk_space")]
    pub max_disk_space: u64,

    #[serde(default)]
    pub format: BatchFormat,

    /// Data directory is `<directory_prefix>-v<data_version>`.
    #[serde(default = "default_directory_prefix")]
    pub directory_prefix: String,

    #[serde(default = "default_data_version")]
    pub data_version: u32,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_recent_delay_ms() -> u64 {
    DEFAULT_RECENT_DELAY_MS
}

fn default_max_batch_size() -> u64 {
    DEFAULT_MAX_BATCH_SIZE
}

fn default_max_items_per_batch() -> usize {
    DEFAULT_MAX_ITEMS_PER_BATCH
}

fn default_old_file_threshold_ms() -> u64 {
    DEFAULT_OLD_FILE_THRESHOLD_MS
}

fn default_max_disk_space() -> u64 {
    DEFAULT_MAX_DISK_SPACE
}

fn default_directory_prefix() -> String {
    DEFAULT_DIRECTORY_PREFIX.to_string()
}

fn default_data_version() -> u32 {
    spool_common::DATA_VERSION
}

impl Default for SpoolConfig {
    fn default() -> Self {
        SpoolConfig {
            schema_version: default_schema_version(),
            recent_delay_ms: DEFAULT_RECENT_DELAY_MS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_items_per_batch: DEFAULT_MAX_ITEMS_PER_BATCH,
            old_file_threshold_ms: DEFAULT_OLD_FILE_THRESHOLD_MS,
            max_disk_space: DEFAULT_MAX_DISK_SPACE,
            format: BatchFormat::default(),
            directory_prefix: default_directory_prefix(),
            data_version: spool_common::DATA_VERSION,
        }
    }
}

impl SpoolConfig {
    /// Name of the versioned data directory, e.g. `logspool-logs-v1`.
    pub fn data_dir_name(&self) -> String {
        format!("{}-v{}", self.directory_prefix, self.data_version)
    }

    pub fn recent_delay(&self) -> Duration {
        Duration::from_millis(self.recent_delay_ms)
    }

    pub fn old_file_threshold(&self) -> Duration {
        Duration::from_millis(self.old_file_threshold_ms)
    }

    /// Set the write-to-read grace period.
    pub fn with_recent_delay_ms(mut self, ms: u64) -> Self {
        self.recent_delay_ms = ms;
        self
    }

    /// Set the per-batch byte ceiling.
    pub fn with_max_batch_size(mut self, bytes: u64) -> Self {
        self.max_batch_size = bytes;
        self
    }

    /// Set the per-batch event ceiling.
    pub fn with_max_items_per_batch(mut self, count: usize) -> Self {
        self.max_items_per_batch = count;
        self
    }

    /// Set the age after which files are purged.
    pub fn with_old_file_threshold_ms(mut self, ms: u64) -> Self {
        self.old_file_threshold_ms = ms;
        self
    }

    /// Set the total byte ceiling.
    pub fn with_max_disk_space(mut self, bytes: u64) -> Self {
        self.max_disk_space = bytes;
        self
    }

    pub fn with_format(mut self, format: BatchFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_directory_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.directory_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_values() {
        let config = SpoolConfig::default();
        assert_eq!(config.recent_delay_ms, 5_000);
        assert_eq!(config.max_batch_size, 4 * 1024 * 1024);
        assert_eq!(config.max_items_per_batch, 500);
        assert_eq!(config.old_file_threshold_ms, 64_800_000);
        assert_eq!(config.max_disk_space, 512 * 1024 * 1024);
        assert_eq!(config.data_dir_name(), "logspool-logs-v1");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SpoolConfig =
            serde_json::from_str(r#"{"max_items_per_batch": 32, "format": {"prefix": "{"}}"#)
                .unwrap();
        assert_eq!(config.max_items_per_batch, 32);
        assert_eq!(config.recent_delay_ms, DEFAULT_RECENT_DELAY_MS);
        assert_eq!(config.format.prefix, "{");
        assert_eq!(config.format.suffix, "]");
        assert_eq!(config.format.separator, ",");
    }

    #[test]
    fn test_wrap() {
        let format = BatchFormat::default();
        assert_eq!(format.wrap(b"1,2,3"), b"[1,2,3]".to_vec());
        assert_eq!(format.wrap(b""), b"[]".to_vec());
    }

    #[test]
    fn test_builder() {
        let config = SpoolConfig::default()
            .with_recent_delay_ms(10)
            .with_max_batch_size(1024)
            .with_max_items_per_batch(3)
            .with_max_disk_space(4096)
            .with_old_file_threshold_ms(60_000)
            .with_directory_prefix("crash-reports");
        assert_eq!(config.recent_delay(), Duration::from_millis(10));
        assert_eq!(config.old_file_threshold(), Duration::from_secs(60));
        assert_eq!(config.max_batch_size, 1024);
        assert_eq!(config.max_items_per_batch, 3);
        assert_eq!(config.max_disk_space, 4096);
        assert_eq!(config.data_dir_name(), "crash-reports-v1");
    }
}
