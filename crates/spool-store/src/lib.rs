//! Durable on-device batch queue.
//!
//! Producers hand events to a [`Writer`]; events are serialized into
//! fragments and appended to timestamp-named batch files. A [`Reader`]
//! serves sealed files oldest first and deletes them once the consumer
//! confirms delivery.
//!
//! ```no_run
//! use spool_config::SpoolConfig;
//! use spool_store::{Reader, SpoolEngine, Writer};
//!
//! let engine = SpoolEngine::builder("/tmp/logspool", SpoolConfig::default())
//!     .legacy_cleanup()
//!     .build()?;
//!
//! engine.json_writer::<String>().write(&"hello".to_string());
//!
//! let reader = engine.reader();
//! if let Some(batch) = reader.read_next_batch() {
//!     // upload batch.payload() ...
//!     reader.drop_batch(batch.id());
//! }
//! # Ok::<(), spool_common::SpoolError>(())
//! ```

pub mod engine;
pub mod file_set;
pub mod memory;
pub mod migration;
pub mod orchestrator;
pub mod reader;
pub mod writer;

pub use engine::{SpoolEngine, SpoolEngineBuilder};
pub use file_set::{DiskFileSet, FileHandle, FileSet};
pub use memory::MemoryFileSet;
pub use migration::{DataMigrator, LegacyDirectoryPurge, MigrationReport};
pub use orchestrator::{EvictionReason, Orchestrator, QueueStatus, ReadOutcome};
pub use reader::{FileReader, Reader};
pub use writer::{FileWriter, JsonSerializer, Serializer, Writer};
