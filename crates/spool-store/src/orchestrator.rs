//! Batch file orchestration.
//!
//! The orchestrator decides which file receives the next fragment and which
//! sealed file is served next. It also enforces the two retention bounds:
//! - files older than `old_file_threshold_ms` are purged without delivery
//! - total bytes stay under `max_disk_space`, evicting oldest files first
//!
//! Every file-set mutation and read goes through one mutex, so selection,
//! appends, eviction and deletes never interleave across writer and reader
//! threads.

use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use spool_common::{BatchId, Clock, Result, SpoolError};
use spool_config::SpoolConfig;
use tracing::{debug, info, warn};

use crate::file_set::{FileHandle, FileSet};

/// Upper bound on name bumps when a fresh file name is already taken.
const MAX_NAME_ATTEMPTS: u32 = 1_000;

/// Why a file was removed without being delivered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// File outlived the old-file threshold.
    Obsolete { age_ms: u64, threshold_ms: u64 },

    /// Total usage would exceed the disk quota.
    DiskQuota { quota_bytes: u64, used_bytes: u64 },

    /// Sealed file with no content, left behind by an interrupted write.
    EmptyFile,
}

/// Snapshot of the queue directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub total_files: usize,
    pub total_bytes: u64,
    pub disk_quota_bytes: u64,
    pub quota_used_pct: f64,

    /// Sealed files a reader could be served right now.
    pub readable_files: usize,

    /// Files past the old-file threshold, purged on the next selection.
    pub obsolete_files: usize,

    pub oldest_batch_age_ms: Option<u64>,
    pub newest_batch_age_ms: Option<u64>,

    /// File currently receiving appends, if any.
    pub active_batch: Option<BatchId>,
    pub active_batch_items: usize,
}

/// A file handed to the reader together with its raw content.
#[derive(Debug)]
pub struct ReadOutcome {
    pub file: FileHandle,
    pub content: Result<Vec<u8>>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveFile {
    id: BatchId,
    items: usize,
}

#[derive(Debug, Default)]
struct WriteState {
    active: Option<ActiveFile>,
    /// Newest name this instance has created. New names always sort after
    /// it, so a dropped batch name is never reused while the reader still
    /// remembers it.
    last_issued: Option<BatchId>,
}

#[derive(Debug)]
pub struct Orchestrator {
    files: Arc<dyn FileSet>,
    clock: Arc<dyn Clock>,
    config: SpoolConfig,
    state: Mutex<WriteState>,
}

impl Orchestrator {
    pub fn new(files: Arc<dyn FileSet>, clock: Arc<dyn Clock>, config: SpoolConfig) -> Self {
        Orchestrator {
            files,
            clock,
            config,
            state: Mutex::new(WriteState::default()),
        }
    }

    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    /// Select the file that should receive a fragment of `fragment_len` bytes.
    ///
    /// Reuses the file of the previous write while it is still recent and has
    /// room; otherwise creates a new one. Obsolete files are purged and the
    /// disk quota is enforced before returning.
    pub fn pick_writable_file(&self, fragment_len: u64) -> Result<FileHandle> {
        let mut state = self.lock();
        self.select_writable(&mut state, fragment_len)
    }

    /// Select and append in one critical section. Returns the receiving batch.
    pub fn append(&self, fragment: &[u8]) -> Result<BatchId> {
        let mut state = self.lock();
        let target = self.select_writable(&mut state, fragment.len() as u64)?;

        let result = if target.size_bytes == 0 {
            self.files.append(target.id, fragment)
        } else {
            let separator = self.config.format.separator.as_bytes();
            let mut bytes = Vec::with_capacity(separator.len() + fragment.len());
            bytes.extend_from_slice(separator);
            bytes.extend_from_slice(fragment);
            self.files.append(target.id, &bytes)
        };

        match result {
            Ok(()) => {
                if let Some(current) = state.active.as_mut() {
                    current.items += 1;
                }
                Ok(target.id)
            }
            Err(e) => {
                // The next write starts a fresh file rather than appending
                // after a possibly partial fragment.
                state.active = None;
                if target.size_bytes == 0 {
                    if let Err(delete_err) = self.files.delete(target.id) {
                        warn!(
                            "Failed to delete {}: {}",
                            self.files.describe(target.id),
                            delete_err
                        );
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Oldest sealed file not in `exclude`, or `None` if nothing is sealed yet.
    pub fn pick_readable_file(&self, exclude: &HashSet<BatchId>) -> Result<Option<FileHandle>> {
        let mut state = self.lock();
        let (file, _) = self.select_readable(&mut state.active, exclude)?;
        Ok(file)
    }

    /// Select the next readable file and read it without releasing the lock.
    ///
    /// Ids in `served` that can no longer name a file are forgotten: new
    /// names always sort after the oldest file on disk, or after the last
    /// issued name once the directory is empty.
    pub fn pick_and_read(&self, served: &mut HashSet<BatchId>) -> Result<Option<ReadOutcome>> {
        let mut state = self.lock();
        let (picked, oldest) = self.select_readable(&mut state.active, served)?;

        if let Some(floor) = oldest.or(state.last_issued.map(|id| id.next())) {
            served.retain(|id| *id >= floor);
        }

        let Some(file) = picked else {
            return Ok(None);
        };
        let content = self.files.read(file.id).map_err(SpoolError::from);
        Ok(Some(ReadOutcome { file, content }))
    }

    /// Raw content of one batch file.
    pub fn read(&self, id: BatchId) -> Result<Vec<u8>> {
        let _state = self.lock();
        self.files.read(id).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SpoolError::NotFound(id),
            _ => e.into(),
        })
    }

    /// All batch files regardless of age, oldest first.
    pub fn list_all_files(&self) -> Result<Vec<FileHandle>> {
        let _state = self.lock();
        Ok(self.files.list()?)
    }

    /// Delete a batch file. Deleting an absent file is a logged no-op.
    pub fn delete(&self, id: BatchId) -> Result<bool> {
        let mut state = self.lock();
        if state.active.is_some_and(|a| a.id == id) {
            state.active = None;
        }

        let existed = self.files.delete(id)?;
        if existed {
            debug!(batch_id = %id, "Deleted batch file");
        } else {
            warn!("Batch file {} does not exist", self.files.describe(id));
        }
        Ok(existed)
    }

    /// Remove every file past the old-file threshold. Returns how many went.
    pub fn purge_obsolete(&self) -> Result<usize> {
        let mut state = self.lock();
        let now = self.clock.now_ms();
        let (_, purged) = self.purge_obsolete_locked(&mut state.active, now)?;
        Ok(purged)
    }

    /// Forget the active file so the next write starts a new one.
    pub fn reset(&self) {
        self.lock().active = None;
    }

    pub fn status(&self) -> Result<QueueStatus> {
        let state = self.lock();
        let active = state.active;
        let now = self.clock.now_ms();
        let files = self.files.list()?;

        let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
        let quota = self.config.max_disk_space;
        let quota_used_pct = if quota > 0 {
            (total_bytes as f64 / quota as f64) * 100.0
        } else {
            0.0
        };

        let obsolete_files = files
            .iter()
            .filter(|f| f.id.age_ms(now) > self.config.old_file_threshold_ms)
            .count();
        let readable_files = files
            .iter()
            .filter(|f| {
                let age = f.id.age_ms(now);
                age > self.config.recent_delay_ms && age <= self.config.old_file_threshold_ms
            })
            .count();

        Ok(QueueStatus {
            total_files: files.len(),
            total_bytes,
            disk_quota_bytes: quota,
            quota_used_pct,
            readable_files,
            obsolete_files,
            oldest_batch_age_ms: files.first().map(|f| f.id.age_ms(now)),
            newest_batch_age_ms: files.last().map(|f| f.id.age_ms(now)),
            active_batch: active.map(|a| a.id),
            active_batch_items: active.map(|a| a.items).unwrap_or(0),
        })
    }

    fn lock(&self) -> MutexGuard<'_, WriteState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn select_writable(&self, state: &mut WriteState, fragment_len: u64) -> Result<FileHandle> {
        let now = self.clock.now_ms();
        let active = &mut state.active;
        let (files, _) = self.purge_obsolete_locked(active, now)?;
        let separator_len = self.config.format.separator.len() as u64;

        if let Some(current) = *active {
            if let Some(newest) = files.last().filter(|f| f.id == current.id) {
                let incoming = if newest.size_bytes == 0 {
                    fragment_len
                } else {
                    separator_len + fragment_len
                };
                let reusable = current.id.age_ms(now) < self.config.recent_delay_ms
                    && current.items < self.config.max_items_per_batch
                    && newest.size_bytes + incoming <= self.config.max_batch_size;
                if reusable {
                    let newest = *newest;
                    self.ensure_capacity(active, &files, incoming, Some(newest.id));
                    return Ok(newest);
                }
            }
        }

        self.ensure_capacity(active, &files, fragment_len, None);
        let newest = files.last().map(|f| f.id).max(state.last_issued);
        let id = self.create_file(now, newest)?;
        state.active = Some(ActiveFile { id, items: 0 });
        state.last_issued = Some(id);
        Ok(FileHandle { id, size_bytes: 0 })
    }

    /// Returns the selected file together with the oldest surviving file.
    fn select_readable(
        &self,
        active: &mut Option<ActiveFile>,
        exclude: &HashSet<BatchId>,
    ) -> Result<(Option<FileHandle>, Option<BatchId>)> {
        let now = self.clock.now_ms();
        let (files, _) = self.purge_obsolete_locked(active, now)?;
        let oldest = files.first().map(|f| f.id);

        for file in files {
            if exclude.contains(&file.id) {
                continue;
            }
            // Sorted oldest first: if this one is too young, so is the rest.
            if file.id.age_ms(now) <= self.config.recent_delay_ms {
                return Ok((None, oldest));
            }
            // Once served, a file never takes another append, even if the
            // wall clock steps backwards.
            if active.is_some_and(|a| a.id == file.id) {
                *active = None;
            }
            if file.size_bytes == 0 {
                self.remove(active, &file, &EvictionReason::EmptyFile);
                continue;
            }
            return Ok((Some(file), oldest));
        }
        Ok((None, oldest))
    }

    /// Delete obsolete files and return the survivors with the purge count.
    fn purge_obsolete_locked(
        &self,
        active: &mut Option<ActiveFile>,
        now: u64,
    ) -> Result<(Vec<FileHandle>, usize)> {
        let threshold_ms = self.config.old_file_threshold_ms;
        let mut kept = Vec::new();
        let mut purged = 0;

        for file in self.files.list()? {
            let age_ms = file.id.age_ms(now);
            if age_ms > threshold_ms {
                let reason = EvictionReason::Obsolete {
                    age_ms,
                    threshold_ms,
                };
                if self.remove(active, &file, &reason) {
                    purged += 1;
                    continue;
                }
            }
            kept.push(file);
        }

        Ok((kept, purged))
    }

    /// Evict oldest files until `incoming` more bytes fit under the quota.
    ///
    /// Best effort: if deletes fail the write still proceeds.
    fn ensure_capacity(
        &self,
        active: &mut Option<ActiveFile>,
        files: &[FileHandle],
        incoming: u64,
        keep: Option<BatchId>,
    ) {
        let quota = self.config.max_disk_space;
        let mut used: u64 = files.iter().map(|f| f.size_bytes).sum();

        for file in files {
            if used.saturating_add(incoming) <= quota {
                break;
            }
            if Some(file.id) == keep {
                continue;
            }
            let reason = EvictionReason::DiskQuota {
                quota_bytes: quota,
                used_bytes: used,
            };
            if self.remove(active, file, &reason) {
                used = used.saturating_sub(file.size_bytes);
            }
        }

        if used.saturating_add(incoming) > quota {
            warn!(
                used_bytes = used,
                incoming_bytes = incoming,
                quota_bytes = quota,
                "Disk quota still exceeded after eviction"
            );
        }
    }

    fn create_file(&self, now: u64, newest: Option<BatchId>) -> Result<BatchId> {
        let mut id = BatchId::from_millis(now);
        if let Some(newest) = newest {
            if id <= newest {
                id = newest.next();
            }
        }

        for _ in 0..MAX_NAME_ATTEMPTS {
            match self.files.create(id) {
                Ok(()) => {
                    debug!(batch_id = %id, "Created batch file");
                    return Ok(id);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => id = id.next(),
                Err(e) => return Err(e.into()),
            }
        }

        Err(SpoolError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free batch name after {} attempts", MAX_NAME_ATTEMPTS),
        )))
    }

    /// Delete a file without delivering it. Returns true if it is gone.
    fn remove(
        &self,
        active: &mut Option<ActiveFile>,
        file: &FileHandle,
        reason: &EvictionReason,
    ) -> bool {
        let location = self.files.describe(file.id);
        match reason {
            EvictionReason::DiskQuota { .. } => warn!(
                "Pruning: {} ({} bytes) - {:?}",
                location, file.size_bytes, reason
            ),
            _ => info!(
                "Pruning: {} ({} bytes) - {:?}",
                location, file.size_bytes, reason
            ),
        }

        match self.files.delete(file.id) {
            Ok(_) => {
                if active.is_some_and(|a| a.id == file.id) {
                    *active = None;
                }
                true
            }
            Err(e) => {
                warn!("Failed to delete {}: {}", location, e);
                false
            }
        }
    }
}
