//! Log events through a full engine: write, seal, read back.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value;
use spool_common::ManualClock;
use spool_config::SpoolConfig;
use spool_log::{Connectivity, Log, LogLevel, LogSerializer, NetworkInfo, RESERVED_ATTRIBUTES};
use spool_store::{MemoryFileSet, Reader, SpoolEngine, Writer};

fn memory_engine(config: SpoolConfig) -> (SpoolEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let engine = SpoolEngine::builder("unused", config)
        .file_set(Arc::new(MemoryFileSet::new()))
        .clock(clock.clone())
        .build()
        .unwrap();
    (engine, clock)
}

#[test]
fn batch_of_logs_reads_back_as_json_array() {
    let (engine, clock) = memory_engine(SpoolConfig::default().with_max_items_per_batch(32));
    let writer = engine.writer(LogSerializer);

    let levels = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
    ];
    for (i, level) in levels.iter().enumerate() {
        let log = Log::new(*level, format!("event {}", i))
            .with_tag(format!("seq:{}", i))
            .with_network_info(NetworkInfo::new(Connectivity::NetworkWifi));
        writer.write(&log);
    }
    clock.advance_ms(5_001);

    let reader = engine.reader();
    let batch = reader.read_next_batch().unwrap();
    let logs: Vec<Value> = serde_json::from_slice(batch.payload()).unwrap();
    assert_eq!(logs.len(), levels.len());

    for (i, (json, level)) in logs.iter().zip(levels.iter()).enumerate() {
        assert_eq!(json["message"], format!("event {}", i));
        assert_eq!(json["status"], level.as_str());
        assert_eq!(json["ddtags"], format!("seq:{}", i));
        assert_eq!(json["network.client.connectivity"], "network_wifi");
        let date = json["date"].as_str().unwrap();
        assert_eq!(date.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(date.ends_with('Z'));
    }

    reader.drop_batch(batch.id());
    assert!(reader.read_next_batch().is_none());
}

#[test]
fn oversized_log_is_dropped() {
    let (engine, clock) = memory_engine(
        SpoolConfig::default()
            .with_max_batch_size(256)
            .with_max_disk_space(4096),
    );
    let writer = engine.writer(LogSerializer);

    writer.write(&Log::new(LogLevel::Info, "x".repeat(1_000)));
    writer.write(&Log::new(LogLevel::Info, "fits"));
    clock.advance_ms(5_001);

    let batch = engine.reader().read_next_batch().unwrap();
    let logs: Vec<Value> = serde_json::from_slice(batch.payload()).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["message"], "fits");
}

proptest! {
    #[test]
    fn user_attributes_never_override_event_fields(
        key_index in 0usize..RESERVED_ATTRIBUTES.len(),
        value in "spoofed-[a-z]{0,8}",
    ) {
        let key = RESERVED_ATTRIBUTES[key_index];
        let log = Log::new(LogLevel::Info, "original")
            .with_service("svc")
            .with_attribute(key, value.clone());
        let json = LogSerializer.to_json(&log);

        prop_assert_eq!(&json["message"], "original");
        prop_assert_eq!(&json["service"], "svc");
        prop_assert_eq!(&json["status"], "INFO");
        if let Some(existing) = json.get(key) {
            prop_assert_ne!(existing, &Value::String(value));
        }
    }
}
