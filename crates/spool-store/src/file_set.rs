//! File-set abstraction over one batch directory.
//!
//! The orchestrator is the only caller. Implementations only move bytes;
//! every policy decision (which file, when to evict) lives above them.

use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spool_common::BatchId;

/// A batch file as seen by a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    pub id: BatchId,
    pub size_bytes: u64,
}

/// Storage operations over the set of batch files.
pub trait FileSet: Send + Sync + Debug {
    /// All batch files, oldest first. A missing directory lists as empty.
    fn list(&self) -> io::Result<Vec<FileHandle>>;

    /// Create an empty file. Fails with `AlreadyExists` if the name is taken.
    fn create(&self, id: BatchId) -> io::Result<()>;

    /// Append bytes to an existing file. Fails with `NotFound` if it is gone.
    fn append(&self, id: BatchId, bytes: &[u8]) -> io::Result<()>;

    fn read(&self, id: BatchId) -> io::Result<Vec<u8>>;

    /// Remove a file. Returns `false` if it did not exist.
    fn delete(&self, id: BatchId) -> io::Result<bool>;

    /// Size of a file, `None` if it does not exist.
    fn stat(&self, id: BatchId) -> io::Result<Option<u64>>;

    /// Human-readable location for log messages.
    fn describe(&self, id: BatchId) -> String;
}

/// Batch files stored as plain files in one directory.
#[derive(Debug, Clone)]
pub struct DiskFileSet {
    dir: PathBuf,
}

impl DiskFileSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskFileSet { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: BatchId) -> PathBuf {
        self.dir.join(id.file_name())
    }
}

impl FileSet for DiskFileSet {
    fn list(&self) -> io::Result<Vec<FileHandle>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(id) = entry.file_name().to_str().and_then(BatchId::parse) else {
                continue;
            };
            // A file can disappear between read_dir and metadata.
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if metadata.is_file() {
                files.push(FileHandle {
                    id,
                    size_bytes: metadata.len(),
                });
            }
        }

        files.sort_by_key(|f| f.id);
        Ok(files)
    }

    fn create(&self, id: BatchId) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path(id))?;
        Ok(())
    }

    fn append(&self, id: BatchId, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(self.path(id))?;
        file.write_all(bytes)?;
        file.flush()
    }

    fn read(&self, id: BatchId) -> io::Result<Vec<u8>> {
        fs::read(self.path(id))
    }

    fn delete(&self, id: BatchId) -> io::Result<bool> {
        match fs::remove_file(self.path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn stat(&self, id: BatchId) -> io::Result<Option<u64>> {
        match fs::metadata(self.path(id)) {
            Ok(m) => Ok(Some(m.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn describe(&self, id: BatchId) -> String {
        self.path(id).display().to_string()
    }
}
