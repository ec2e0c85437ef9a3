//! Command implementations. Each returns the JSON document printed on stdout.

use std::path::Path;

use serde_json::{json, Value};
use spool_common::{Batch, BatchId};
use spool_config::{validate_config, ResolvedConfig, SpoolConfig};
use spool_log::{Log, LogLevel, LogSerializer};
use spool_store::{Reader, SpoolEngine};
use tracing::debug;

use crate::error::CliError;

/// Open the queue under `root`, removing data directories of older versions.
pub fn open_engine(root: &Path, config: SpoolConfig) -> Result<SpoolEngine, CliError> {
    let engine = SpoolEngine::builder(root, config).legacy_cleanup().build()?;
    let report = engine.migration_report();
    if !report.removed_dirs.is_empty() {
        debug!(
            dirs = report.removed_dirs.len(),
            bytes = report.removed_bytes,
            "Removed legacy data directories"
        );
    }
    Ok(engine)
}

/// One event to enqueue from the command line.
#[derive(Debug, Clone, Default)]
pub struct WriteRequest {
    pub message: String,
    pub level: LogLevel,
    pub service: Option<String>,
    pub logger: Option<String>,
    pub tags: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

impl WriteRequest {
    fn to_log(&self) -> Log {
        let mut log = Log::new(self.level, self.message.clone()).with_thread("cli");
        if let Some(service) = &self.service {
            log = log.with_service(service.clone());
        }
        if let Some(logger) = &self.logger {
            log = log.with_logger(logger.clone());
        }
        for tag in &self.tags {
            log = log.with_tag(tag.clone());
        }
        for (key, value) in &self.attributes {
            log = log.with_attribute(key.clone(), value.clone());
        }
        log
    }
}

/// Parse a `key=value` attribute argument.
pub fn parse_attribute(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(CliError::InvalidArgument(format!(
            "attribute '{}' must look like key=value",
            raw
        ))),
    }
}

pub fn write_event(engine: &SpoolEngine, request: &WriteRequest) -> Result<Value, CliError> {
    let writer = engine.writer(LogSerializer);
    let batch_id = writer.try_write(&request.to_log())?;
    Ok(json!({
        "command": "write",
        "batch_id": batch_id,
        "level": request.level.as_str(),
    }))
}

/// Serve the oldest sealed batch, or `None` when nothing is readable yet.
pub fn read_next(engine: &SpoolEngine, drop: bool) -> Result<Option<Value>, CliError> {
    let reader = engine.reader();
    let Some(batch) = reader.read_next_batch() else {
        return Ok(None);
    };
    let id = batch.id();
    let mut output = describe_batch(&batch);
    if drop {
        reader.drop_batch(id);
    }
    output["dropped"] = Value::Bool(drop);
    Ok(Some(output))
}

fn describe_batch(batch: &Batch) -> Value {
    let payload = serde_json::from_slice::<Value>(batch.payload())
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(batch.payload()).into_owned()));
    let events = payload.as_array().map(Vec::len);
    json!({
        "command": "read",
        "batch_id": batch.id(),
        "bytes": batch.len(),
        "events": events,
        "payload": payload,
    })
}

/// Delete one batch by id. Unknown ids are reported, not treated as errors.
pub fn drop_batch(engine: &SpoolEngine, raw_id: &str) -> Result<Value, CliError> {
    let id = BatchId::parse(raw_id).ok_or_else(|| CliError::InvalidBatchId(raw_id.to_string()))?;
    let deleted = engine.orchestrator().delete(id)?;
    Ok(json!({
        "command": "drop",
        "batch_id": id,
        "deleted": deleted,
    }))
}

pub fn purge(engine: &SpoolEngine) -> Result<Value, CliError> {
    let purged = engine.purge_obsolete()?;
    Ok(json!({
        "command": "purge",
        "purged_files": purged,
        "old_file_threshold_ms": engine.config().old_file_threshold_ms,
    }))
}

pub fn status(engine: &SpoolEngine) -> Result<Value, CliError> {
    let status = engine.status()?;
    Ok(json!({
        "command": "status",
        "data_dir": engine.data_dir().display().to_string(),
        "queue": status,
    }))
}

pub fn config_show(resolved: &ResolvedConfig, data_root: &Path) -> Result<Value, CliError> {
    Ok(json!({
        "command": "config show",
        "source": resolved.source.to_string(),
        "path": resolved.path.as_ref().map(|p| p.display().to_string()),
        "data_dir": data_root.join(resolved.config.data_dir_name()).display().to_string(),
        "config": serde_json::to_value(&resolved.config)?,
    }))
}

/// Parse and validate a config file without touching the queue.
pub fn config_validate(path: &Path) -> Result<Value, CliError> {
    let config = spool_config::load_from_file(path)?;
    validate_config(&config).map_err(spool_config::ConfigError::from)?;
    Ok(json!({
        "command": "config validate",
        "path": path.display().to_string(),
        "valid": true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use spool_common::ManualClock;
    use spool_store::MemoryFileSet;

    fn engine(clock: Arc<ManualClock>) -> SpoolEngine {
        SpoolEngine::builder("unused", SpoolConfig::default())
            .file_set(Arc::new(MemoryFileSet::new()))
            .clock(clock)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            parse_attribute("user.id=42").unwrap(),
            ("user.id".to_string(), "42".to_string())
        );
        assert_eq!(parse_attribute("k=a=b").unwrap().1, "a=b");
        assert!(parse_attribute("novalue").is_err());
        assert!(parse_attribute("=x").is_err());
    }

    #[test]
    fn test_write_then_read_and_drop() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let engine = engine(clock.clone());
        let request = WriteRequest {
            message: "hello".into(),
            level: LogLevel::Error,
            tags: vec!["env:test".into()],
            attributes: vec![("user.id".into(), "7".into())],
            ..Default::default()
        };
        let written = write_event(&engine, &request).unwrap();
        assert_eq!(written["level"], "ERROR");

        assert!(read_next(&engine, true).unwrap().is_none());
        clock.advance_ms(5_001);

        let read = read_next(&engine, true).unwrap().unwrap();
        assert_eq!(read["batch_id"], written["batch_id"]);
        assert_eq!(read["events"], 1);
        assert_eq!(read["payload"][0]["message"], "hello");
        assert_eq!(read["payload"][0]["ddtags"], "env:test");
        assert_eq!(read["payload"][0]["user.id"], "7");
        assert_eq!(read["dropped"], true);

        assert!(read_next(&engine, false).unwrap().is_none());
    }

    #[test]
    fn test_drop_reports_unknown_ids() {
        let engine = engine(Arc::new(ManualClock::new(1_000)));
        let output = drop_batch(&engine, "12345").unwrap();
        assert_eq!(output["deleted"], false);
        assert!(matches!(
            drop_batch(&engine, "12ab"),
            Err(CliError::InvalidBatchId(_))
        ));
    }
}
