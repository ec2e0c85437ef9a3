//! In-memory file set for tests and ephemeral queues.
//!
//! Faults can be switched on per operation to exercise the degraded paths
//! of the writer and reader without touching a real filesystem.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use spool_common::BatchId;

use crate::file_set::{FileHandle, FileSet};

#[derive(Debug, Default)]
pub struct MemoryFileSet {
    files: Mutex<BTreeMap<BatchId, Vec<u8>>>,
    fail_creates: AtomicBool,
    fail_appends: AtomicBool,
    fail_reads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant a file directly, bypassing the orchestrator.
    pub fn insert(&self, id: BatchId, content: impl Into<Vec<u8>>) {
        self.lock().insert(id, content.into());
    }

    pub fn contents(&self, id: BatchId) -> Option<Vec<u8>> {
        self.lock().get(&id).cloned()
    }

    /// Names of all stored files, oldest first.
    pub fn ids(&self) -> Vec<BatchId> {
        self.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.lock().values().map(|v| v.len() as u64).sum()
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<BatchId, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(flag: &AtomicBool, op: &str) -> io::Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected {} failure", op),
            ));
        }
        Ok(())
    }
}

impl FileSet for MemoryFileSet {
    fn list(&self) -> io::Result<Vec<FileHandle>> {
        Ok(self
            .lock()
            .iter()
            .map(|(id, content)| FileHandle {
                id: *id,
                size_bytes: content.len() as u64,
            })
            .collect())
    }

    fn create(&self, id: BatchId) -> io::Result<()> {
        Self::check(&self.fail_creates, "create")?;
        let mut files = self.lock();
        if files.contains_key(&id) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("batch {} already exists", id),
            ));
        }
        files.insert(id, Vec::new());
        Ok(())
    }

    fn append(&self, id: BatchId, bytes: &[u8]) -> io::Result<()> {
        Self::check(&self.fail_appends, "append")?;
        match self.lock().get_mut(&id) {
            Some(content) => {
                content.extend_from_slice(bytes);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("batch {} does not exist", id),
            )),
        }
    }

    fn read(&self, id: BatchId) -> io::Result<Vec<u8>> {
        Self::check(&self.fail_reads, "read")?;
        self.lock().get(&id).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("batch {} does not exist", id))
        })
    }

    fn delete(&self, id: BatchId) -> io::Result<bool> {
        Self::check(&self.fail_deletes, "delete")?;
        Ok(self.lock().remove(&id).is_some())
    }

    fn stat(&self, id: BatchId) -> io::Result<Option<u64>> {
        Ok(self.lock().get(&id).map(|c| c.len() as u64))
    }

    fn describe(&self, id: BatchId) -> String {
        format!("memory:{}", id)
    }
}
