//! Fuzz target for config.json parsing and validation.
//!
//! Any document that parses and validates must also open an engine.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use spool_common::ManualClock;
use spool_config::{validate_config, SpoolConfig};
use spool_store::{MemoryFileSet, SpoolEngine};

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<SpoolConfig>(data) else {
        return;
    };
    if validate_config(&config).is_err() {
        return;
    }
    let engine = SpoolEngine::builder("unused", config)
        .file_set(Arc::new(MemoryFileSet::new()))
        .clock(Arc::new(ManualClock::new(0)))
        .build();
    assert!(engine.is_ok(), "validated config was rejected by the engine");
});
