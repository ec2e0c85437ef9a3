//! Event writer.
//!
//! `write` never fails from the caller's point of view: oversized events,
//! serializer failures and storage errors are logged and the event is
//! dropped. Producers on hot paths must not have to handle telemetry errors.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use spool_common::{BatchId, Result, SpoolError};
use tracing::{error, trace, warn};

use crate::orchestrator::Orchestrator;

/// Converts one event into a fragment: a self-contained byte string that
/// does not include the batch prefix, suffix or separator.
pub trait Serializer<T>: Send + Sync {
    fn serialize(&self, item: &T) -> Result<Vec<u8>>;
}

/// Serializes any `serde::Serialize` event as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl<T: Serialize> Serializer<T> for JsonSerializer {
    fn serialize(&self, item: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(item)?)
    }
}

/// Accepts events for persistence.
pub trait Writer<T>: Send + Sync {
    fn write(&self, item: &T);
}

/// Writer that appends serialized events to orchestrated batch files.
pub struct FileWriter<T, S> {
    orchestrator: Arc<Orchestrator>,
    serializer: S,
    _item: PhantomData<fn(&T)>,
}

impl<T, S: Serializer<T>> FileWriter<T, S> {
    pub fn new(orchestrator: Arc<Orchestrator>, serializer: S) -> Self {
        FileWriter {
            orchestrator,
            serializer,
            _item: PhantomData,
        }
    }

    /// Write and report the receiving batch, or why the event was dropped.
    pub fn try_write(&self, item: &T) -> Result<BatchId> {
        let fragment = self.serializer.serialize(item)?;
        let limit = self.orchestrator.config().max_batch_size;
        let size = fragment.len() as u64;

        if size > limit {
            return Err(SpoolError::ItemTooLarge { size, limit });
        }
        if fragment.is_empty() {
            return Err(SpoolError::Serialize("empty fragment".to_string()));
        }

        self.orchestrator.append(&fragment)
    }
}

impl<T, S: Serializer<T>> Writer<T> for FileWriter<T, S> {
    fn write(&self, item: &T) {
        match self.try_write(item) {
            Ok(id) => trace!(batch_id = %id, "Event persisted"),
            Err(e @ SpoolError::ItemTooLarge { .. }) => {
                warn!(code = e.code(), "Dropping event: {}", e);
            }
            Err(e) => error!(code = e.code(), "Could not persist event: {}", e),
        }
    }
}

impl<T, S> std::fmt::Debug for FileWriter<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFileSet;
    use serde_json::json;
    use spool_common::ManualClock;
    use spool_config::SpoolConfig;

    struct Failing;

    impl Serializer<String> for Failing {
        fn serialize(&self, _item: &String) -> Result<Vec<u8>> {
            Err(SpoolError::Serialize("boom".to_string()))
        }
    }

    fn orchestrator(config: SpoolConfig) -> (Arc<Orchestrator>, Arc<MemoryFileSet>) {
        let files = Arc::new(MemoryFileSet::new());
        let clock = Arc::new(ManualClock::new(1_000_000));
        let orchestrator = Arc::new(Orchestrator::new(files.clone(), clock, config));
        (orchestrator, files)
    }

    #[test]
    fn test_json_fragments_are_separated() {
        let (orch, files) = orchestrator(SpoolConfig::default());
        let writer = FileWriter::new(orch, JsonSerializer);
        writer.write(&json!({"n": 1}));
        writer.write(&json!({"n": 2}));

        let listed = files.ids();
        assert_eq!(listed.len(), 1);
        assert_eq!(
            files.contents(listed[0]).unwrap(),
            br#"{"n":1},{"n":2}"#.to_vec()
        );
    }

    #[test]
    fn test_oversized_event_is_dropped() {
        let (orch, files) = orchestrator(SpoolConfig::default().with_max_batch_size(8));
        let writer = FileWriter::new(orch, JsonSerializer);

        let err = writer.try_write(&"far too long for this".to_string()).unwrap_err();
        assert!(matches!(err, SpoolError::ItemTooLarge { limit: 8, .. }));
        writer.write(&"far too long for this".to_string());
        assert!(files.is_empty());

        writer.write(&"ok".to_string());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_serializer_failure_is_swallowed() {
        let (orch, files) = orchestrator(SpoolConfig::default());
        let writer = FileWriter::new(orch, Failing);
        writer.write(&"x".to_string());
        assert!(files.is_empty());
    }

    #[test]
    fn test_storage_failure_is_swallowed() {
        let (orch, files) = orchestrator(SpoolConfig::default());
        files.set_fail_creates(true);
        let writer = FileWriter::new(orch, JsonSerializer);
        writer.write(&1u32);
        assert!(files.is_empty());
    }
}
