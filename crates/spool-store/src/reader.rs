//! Batch reader.
//!
//! Serves sealed batch files oldest first and deletes them once the
//! consumer confirms delivery. Served-but-unconfirmed batches are simply
//! served again after a restart: delivery is at least once.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use spool_common::{Batch, BatchId};
use spool_config::BatchFormat;
use tracing::{debug, error, info};

use crate::orchestrator::Orchestrator;

/// Consumer-facing side of the queue.
pub trait Reader: Send + Sync {
    /// Next sealed batch, or `None` if nothing is ready.
    fn read_next_batch(&self) -> Option<Batch>;

    /// Confirm delivery of a batch and delete it.
    fn drop_batch(&self, id: BatchId);

    /// Delete every batch file, sealed or not.
    fn drop_all_batches(&self);
}

#[derive(Debug)]
pub struct FileReader {
    orchestrator: Arc<Orchestrator>,
    format: BatchFormat,
    /// Ids already confirmed by the consumer. Never served again by this
    /// instance, even if the delete failed. Pruned as the oldest file on
    /// disk moves past them.
    sent: Mutex<HashSet<BatchId>>,
}

impl FileReader {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let format = orchestrator.config().format.clone();
        FileReader {
            orchestrator,
            format,
            sent: Mutex::new(HashSet::new()),
        }
    }

    /// Number of batches confirmed through this reader.
    pub fn sent_count(&self) -> usize {
        self.sent().len()
    }

    fn sent(&self) -> MutexGuard<'_, HashSet<BatchId>> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Reader for FileReader {
    fn read_next_batch(&self) -> Option<Batch> {
        // Ledger lock first, orchestrator lock second, same as drop_batch.
        let mut sent = self.sent();
        let outcome = match self.orchestrator.pick_and_read(&mut sent) {
            Ok(outcome) => outcome?,
            Err(e) => {
                error!(code = e.code(), "Could not select a batch to read: {}", e);
                return None;
            }
        };

        let id = outcome.file.id;
        match outcome.content {
            Ok(content) => {
                debug!(batch_id = %id, bytes = content.len(), "Serving batch");
                Some(Batch::new(id, self.format.wrap(&content)))
            }
            Err(e) => {
                // An empty payload still lets the consumer drop the file
                // instead of being stuck on it forever.
                error!(batch_id = %id, code = e.code(), "Could not read batch: {}", e);
                Some(Batch::new(id, Vec::new()))
            }
        }
    }

    fn drop_batch(&self, id: BatchId) {
        let mut sent = self.sent();
        match self.orchestrator.delete(id) {
            Ok(true) => {
                sent.insert(id);
            }
            // Unknown id: remembering it would hide a later file of that name.
            Ok(false) => {}
            Err(e) => {
                error!(batch_id = %id, code = e.code(), "Could not delete batch: {}", e);
                sent.insert(id);
            }
        }
    }

    fn drop_all_batches(&self) {
        let _sent = self.sent();
        let files = match self.orchestrator.list_all_files() {
            Ok(files) => files,
            Err(e) => {
                error!(code = e.code(), "Could not list batches: {}", e);
                return;
            }
        };

        info!(count = files.len(), "Dropping all batches");
        for file in files {
            if let Err(e) = self.orchestrator.delete(file.id) {
                error!(batch_id = %file.id, code = e.code(), "Could not delete batch: {}", e);
            }
        }
        self.orchestrator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFileSet;
    use spool_common::ManualClock;
    use spool_config::SpoolConfig;

    const START: u64 = 5_000_000;

    fn setup() -> (FileReader, Arc<Orchestrator>, Arc<MemoryFileSet>, Arc<ManualClock>) {
        let files = Arc::new(MemoryFileSet::new());
        let clock = Arc::new(ManualClock::new(START));
        let config = SpoolConfig::default().with_recent_delay_ms(100);
        let orchestrator = Arc::new(Orchestrator::new(files.clone(), clock.clone(), config));
        (
            FileReader::new(orchestrator.clone()),
            orchestrator,
            files,
            clock,
        )
    }

    #[test]
    fn test_batch_is_wrapped() {
        let (reader, orch, _, clock) = setup();
        orch.append(b"1").unwrap();
        orch.append(b"2").unwrap();
        clock.advance_ms(101);

        let batch = reader.read_next_batch().unwrap();
        assert_eq!(batch.payload(), b"[1,2]");
    }

    #[test]
    fn test_nothing_before_recent_delay() {
        let (reader, orch, _, _) = setup();
        orch.append(b"1").unwrap();
        assert!(reader.read_next_batch().is_none());
    }

    #[test]
    fn test_read_failure_yields_empty_batch() {
        let (reader, orch, files, clock) = setup();
        let id = orch.append(b"1").unwrap();
        clock.advance_ms(101);
        files.set_fail_reads(true);

        let batch = reader.read_next_batch().unwrap();
        assert_eq!(batch.id(), id);
        assert!(batch.is_empty());

        reader.drop_batch(batch.id());
        assert!(files.is_empty());
    }

    #[test]
    fn test_dropped_id_is_never_served_again() {
        let (reader, _, files, clock) = setup();
        let id = BatchId::from_millis(START);
        files.insert(id, "x");
        clock.advance_ms(101);

        // The delete fails, so the file stays, but the ledger hides it.
        files.set_fail_deletes(true);
        reader.drop_batch(id);
        assert_eq!(files.len(), 1);
        assert_eq!(reader.sent_count(), 1);
        assert!(reader.read_next_batch().is_none());
    }

    #[test]
    fn test_drop_unknown_id_is_noop() {
        let (reader, _, files, _) = setup();
        files.insert(BatchId::from_millis(START), "x");
        reader.drop_batch(BatchId::from_millis(1));
        reader.drop_batch(BatchId::from_millis(1));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_drop_unknown_id_does_not_hide_later_file() {
        let (reader, orch, files, clock) = setup();
        let future = BatchId::from_millis(START + 10_000);
        reader.drop_batch(future);
        assert_eq!(reader.sent_count(), 0);

        clock.advance_ms(10_000);
        let id = orch.append(b"7").unwrap();
        assert_eq!(id, future);
        assert_eq!(files.ids(), vec![future]);
        clock.advance_ms(101);

        let batch = reader.read_next_batch().unwrap();
        assert_eq!(batch.id(), future);
        assert_eq!(batch.payload(), b"[7]");
    }

    #[test]
    fn test_ledger_forgets_ids_below_oldest_file() {
        let (reader, orch, _, clock) = setup();
        let first = orch.append(b"1").unwrap();
        clock.advance_ms(101);
        let batch = reader.read_next_batch().unwrap();
        reader.drop_batch(batch.id());
        assert_eq!(batch.id(), first);
        assert_eq!(reader.sent_count(), 1);

        // Empty directory: the last issued name bounds every future name.
        assert!(reader.read_next_batch().is_none());
        assert_eq!(reader.sent_count(), 0);

        let second = orch.append(b"2").unwrap();
        assert!(second > first);
        clock.advance_ms(101);
        let batch = reader.read_next_batch().unwrap();
        assert_eq!(batch.id(), second);
    }

    #[test]
    fn test_ledger_keeps_undeleted_ids() {
        let (reader, orch, files, clock) = setup();
        let stuck = orch.append(b"1").unwrap();
        clock.advance_ms(101);
        files.set_fail_deletes(true);
        reader.drop_batch(stuck);

        let fresh = orch.append(b"2").unwrap();
        clock.advance_ms(101);
        let batch = reader.read_next_batch().unwrap();
        assert_eq!(batch.id(), fresh);
        assert_eq!(reader.sent_count(), 1);
    }

    #[test]
    fn test_drop_all_includes_unsealed_files() {
        let (reader, orch, files, _) = setup();
        files.insert(BatchId::from_millis(START - 1_000), "old");
        let active = orch.append(b"fresh").unwrap();

        reader.drop_all_batches();
        assert!(files.is_empty());

        let next = orch.append(b"again").unwrap();
        assert_ne!(next, active);
        assert_eq!(files.len(), 1);
    }
}
