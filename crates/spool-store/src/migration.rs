//! Data directory migration.
//!
//! The on-disk layout is versioned through the data directory name
//! (`<prefix>-v<N>`). Bumping the version leaves the old directory behind;
//! a migrator cleans it up once at engine start.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spool_common::Result;
use tracing::{info, warn};

/// What a migration run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub removed_dirs: Vec<PathBuf>,
    pub removed_bytes: u64,
}

/// One-shot migration of legacy data under the storage root.
pub trait DataMigrator: Send + Sync {
    /// `root` holds legacy data, `data_dir` is the current layout's
    /// directory. Must be idempotent: a second run is a no-op.
    fn migrate(&self, root: &Path, data_dir: &Path) -> Result<MigrationReport>;
}

/// Deletes data directories left by older layout versions.
///
/// Matches `<prefix>` (the unversioned layout) and `<prefix>-v<N>` for every
/// `N` below the current version. Anything else under the root is left alone.
#[derive(Debug, Clone)]
pub struct LegacyDirectoryPurge {
    prefix: String,
    current_version: u32,
}

impl LegacyDirectoryPurge {
    pub fn new(prefix: impl Into<String>, current_version: u32) -> Self {
        LegacyDirectoryPurge {
            prefix: prefix.into(),
            current_version,
        }
    }

    fn is_legacy(&self, name: &str) -> bool {
        if name == self.prefix {
            return true;
        }
        let Some(rest) = name
            .strip_prefix(self.prefix.as_str())
            .and_then(|r| r.strip_prefix("-v"))
        else {
            return false;
        };
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        rest.parse::<u32>()
            .map(|version| version < self.current_version)
            .unwrap_or(false)
    }
}

impl DataMigrator for LegacyDirectoryPurge {
    fn migrate(&self, root: &Path, data_dir: &Path) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let legacy = entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.is_legacy(name));
            if !legacy || !entry.file_type()?.is_dir() {
                continue;
            }

            let path = entry.path();
            if path == data_dir {
                continue;
            }
            let bytes = dir_size(&path);
            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    info!("Removed legacy data directory {} ({} bytes)", path.display(), bytes);
                    report.removed_bytes += bytes;
                    report.removed_dirs.push(path);
                }
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        report.removed_dirs.sort();
        Ok(report)
    }
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .map(|entry| match entry.file_type() {
            Ok(t) if t.is_dir() => dir_size(&entry.path()),
            Ok(_) => entry.metadata().map(|m| m.len()).unwrap_or(0),
            Err(_) => 0,
        })
        .sum()
}
