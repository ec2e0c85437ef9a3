//! logspool shared types.
//!
//! This crate provides:
//! - Batch identifiers (the millisecond-timestamp file names)
//! - The `Batch` value handed to uploaders
//! - Injectable clocks for recency and age rules
//! - The common error type with stable codes

pub mod batch;
pub mod clock;
pub mod error;
pub mod id;

pub use batch::Batch;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, SpoolError};
pub use id::BatchId;

/// Version of the on-disk batch layout. Bumping it moves data to a new directory.
pub const DATA_VERSION: u32 = 1;
