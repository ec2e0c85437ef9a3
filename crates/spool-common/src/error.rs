//! Error types for logspool.
//!
//! Errors carry a stable numeric code so that the CLI and embedding hosts can
//! classify failures without matching on messages. The engine itself never
//! lets these escape into the host application: the writer and reader log
//! them and degrade to an empty result.

use thiserror::Error;

use crate::id::BatchId;

/// Result type alias for logspool operations.
pub type Result<T> = std::result::Result<T, SpoolError>;

/// Errors raised inside the queue engine.
#[derive(Error, Debug)]
pub enum SpoolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid batch id: {0}")]
    InvalidBatchId(String),

    #[error("batch not found: {0}")]
    NotFound(BatchId),

    #[error("item of {size} bytes exceeds the batch limit of {limit} bytes")]
    ItemTooLarge { size: u64, limit: u64 },

    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SpoolError {
    /// Stable error code for structured reporting.
    pub fn code(&self) -> u32 {
        match self {
            SpoolError::Io(_) => 40,
            SpoolError::Json(_) => 41,
            SpoolError::InvalidBatchId(_) => 42,
            SpoolError::NotFound(_) => 43,
            SpoolError::ItemTooLarge { .. } => 44,
            SpoolError::Serialize(_) => 45,
            SpoolError::Config(_) => 46,
        }
    }

    /// True for filesystem-level failures (missing file, permissions, disk full).
    pub fn is_io(&self) -> bool {
        matches!(self, SpoolError::Io(_))
    }
}
