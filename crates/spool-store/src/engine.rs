//! Engine assembly.
//!
//! One engine owns one data directory: a shared orchestrator, any number of
//! writers and a single reader. Building the engine validates the config
//! and runs the data migrator exactly once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use spool_common::{Clock, Result, SpoolError, SystemClock};
use spool_config::{validate_config, SpoolConfig};
use tracing::{info, warn};

use crate::file_set::{DiskFileSet, FileSet};
use crate::migration::{DataMigrator, LegacyDirectoryPurge, MigrationReport};
use crate::orchestrator::{Orchestrator, QueueStatus};
use crate::reader::FileReader;
use crate::writer::{FileWriter, JsonSerializer, Serializer};

pub struct SpoolEngineBuilder {
    root: PathBuf,
    config: SpoolConfig,
    clock: Arc<dyn Clock>,
    file_set: Option<Arc<dyn FileSet>>,
    migrator: Option<Box<dyn DataMigrator>>,
}

impl SpoolEngineBuilder {
    /// `root` is the storage root; batches live in
    /// `root/<directory_prefix>-v<data_version>`.
    pub fn new(root: impl Into<PathBuf>, config: SpoolConfig) -> Self {
        SpoolEngineBuilder {
            root: root.into(),
            config,
            clock: Arc::new(SystemClock),
            file_set: None,
            migrator: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the on-disk file set, e.g. with a `MemoryFileSet`.
    pub fn file_set(mut self, file_set: Arc<dyn FileSet>) -> Self {
        self.file_set = Some(file_set);
        self
    }

    pub fn migrator(mut self, migrator: impl DataMigrator + 'static) -> Self {
        self.migrator = Some(Box::new(migrator));
        self
    }

    /// Remove data directories of older layout versions on build.
    pub fn legacy_cleanup(self) -> Self {
        let purge =
            LegacyDirectoryPurge::new(self.config.directory_prefix.clone(), self.config.data_version);
        self.migrator(purge)
    }

    pub fn build(self) -> Result<SpoolEngine> {
        validate_config(&self.config).map_err(|e| SpoolError::Config(e.to_string()))?;

        let data_dir = self.root.join(self.config.data_dir_name());
        let migration = match &self.migrator {
            Some(migrator) => match migrator.migrate(&self.root, &data_dir) {
                Ok(report) => report,
                Err(e) => {
                    warn!(code = e.code(), "Data migration failed: {}", e);
                    MigrationReport::default()
                }
            },
            None => MigrationReport::default(),
        };

        let file_set = self
            .file_set
            .unwrap_or_else(|| Arc::new(DiskFileSet::new(&data_dir)) as Arc<dyn FileSet>);
        let orchestrator = Arc::new(Orchestrator::new(file_set, self.clock, self.config.clone()));
        let reader = Arc::new(FileReader::new(orchestrator.clone()));

        info!(data_dir = %data_dir.display(), "Spool engine ready");
        Ok(SpoolEngine {
            data_dir,
            config: self.config,
            orchestrator,
            reader,
            migration,
        })
    }
}

#[derive(Debug)]
pub struct SpoolEngine {
    data_dir: PathBuf,
    config: SpoolConfig,
    orchestrator: Arc<Orchestrator>,
    reader: Arc<FileReader>,
    migration: MigrationReport,
}

impl SpoolEngine {
    pub fn builder(root: impl Into<PathBuf>, config: SpoolConfig) -> SpoolEngineBuilder {
        SpoolEngineBuilder::new(root, config)
    }

    /// A new writer sharing this engine's orchestrator.
    pub fn writer<T, S: Serializer<T>>(&self, serializer: S) -> FileWriter<T, S> {
        FileWriter::new(self.orchestrator.clone(), serializer)
    }

    pub fn json_writer<T: Serialize>(&self) -> FileWriter<T, JsonSerializer> {
        self.writer(JsonSerializer)
    }

    /// The engine's single reader. Its sent-ledger lives as long as the engine.
    pub fn reader(&self) -> Arc<FileReader> {
        self.reader.clone()
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn status(&self) -> Result<QueueStatus> {
        self.orchestrator.status()
    }

    pub fn purge_obsolete(&self) -> Result<usize> {
        self.orchestrator.purge_obsolete()
    }

    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn migration_report(&self) -> &MigrationReport {
        &self.migration
    }
}
