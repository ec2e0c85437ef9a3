//! Fuzz target for batch file name parsing.
//!
//! Accepted names must round-trip exactly; foreign files in the data
//! directory must never alias a batch.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spool_common::BatchId;

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };
    if let Some(id) = BatchId::parse(name) {
        assert_eq!(id.file_name(), name);
        assert_eq!(BatchId::parse(&id.file_name()), Some(id));
    }
});
