//! Fuzz target for random operation sequences against the in-memory engine.
//!
//! Checks after every operation that no batch file exceeds the size limit
//! and the directory stays under the disk quota, and that no event is
//! delivered twice.

#![no_main]

use std::collections::HashSet;
use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spool_common::ManualClock;
use spool_config::SpoolConfig;
use spool_store::{MemoryFileSet, Reader, SpoolEngine, Writer};

#[derive(Debug, Arbitrary)]
enum Op {
    Write { len: u8 },
    Advance { ms: u16 },
    Read { drop: bool },
    DropAll,
    Purge,
    FailAppends(bool),
}

#[derive(Debug, Arbitrary)]
struct Input {
    max_items: u8,
    max_batch_size: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let max_batch_size = 16 + u64::from(input.max_batch_size);
    let config = SpoolConfig::default()
        .with_recent_delay_ms(100)
        .with_old_file_threshold_ms(50_000)
        .with_max_items_per_batch(1 + usize::from(input.max_items % 32))
        .with_max_batch_size(max_batch_size)
        .with_max_disk_space(max_batch_size * 8);

    let files = Arc::new(MemoryFileSet::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let Ok(engine) = SpoolEngine::builder("unused", config)
        .file_set(files.clone())
        .clock(clock.clone())
        .build()
    else {
        return;
    };
    let writer = engine.json_writer::<String>();
    let reader = engine.reader();

    let mut next_event = 0u32;
    let mut delivered = HashSet::new();

    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Write { len } => {
                let mut event = format!("{:06}", next_event);
                event.push_str(&"x".repeat(usize::from(len % 24)));
                next_event += 1;
                writer.write(&event);
            }
            Op::Advance { ms } => clock.advance_ms(u64::from(ms)),
            Op::Read { drop } => {
                if let Some(batch) = reader.read_next_batch() {
                    if drop {
                        let events: Vec<String> =
                            serde_json::from_slice(batch.payload()).unwrap_or_default();
                        for event in events {
                            assert!(delivered.insert(event[..6].to_string()), "event delivered twice");
                        }
                        reader.drop_batch(batch.id());
                    }
                }
            }
            Op::DropAll => reader.drop_all_batches(),
            Op::Purge => {
                let _ = engine.purge_obsolete();
            }
            Op::FailAppends(fail) => files.set_fail_appends(fail),
        }

        for id in files.ids() {
            let size = files.contents(id).map(|c| c.len() as u64).unwrap_or(0);
            assert!(size <= max_batch_size, "batch file over the size limit");
        }
        assert!(files.total_bytes() <= max_batch_size * 8, "disk quota exceeded");
    }
});
