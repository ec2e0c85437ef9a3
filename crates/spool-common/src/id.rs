//! Batch identity.
//!
//! A batch is identified by the name of the file holding it: the decimal
//! millisecond timestamp at which the file was created. Numeric order of ids
//! is chronological order, which is also delivery order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SpoolError;

/// Identifier of a batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BatchId(u64);

impl BatchId {
    /// Create an id from a creation timestamp in milliseconds since the epoch.
    pub fn from_millis(millis: u64) -> Self {
        BatchId(millis)
    }

    /// Creation timestamp encoded in the id.
    pub fn created_at_ms(&self) -> u64 {
        self.0
    }

    /// The next id in order, used to resolve name collisions.
    pub fn next(&self) -> Self {
        BatchId(self.0.saturating_add(1))
    }

    /// Age of the batch relative to `now_ms`. Ids from the future have age zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.0)
    }

    /// File name used on disk.
    pub fn file_name(&self) -> String {
        self.0.to_string()
    }

    /// Parse a file name, returning `None` for anything that is not a batch.
    ///
    /// Leading zeros are rejected so that `parse(id.file_name())` and the
    /// name on disk always agree.
    pub fn parse(name: &str) -> Option<Self> {
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if name.len() > 1 && name.starts_with('0') {
            return None;
        }
        name.parse::<u64>().ok().map(BatchId)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = SpoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BatchId::parse(s).ok_or_else(|| SpoolError::InvalidBatchId(s.to_string()))
    }
}

impl From<BatchId> for String {
    fn from(id: BatchId) -> Self {
        id.file_name()
    }
}

impl TryFrom<String> for BatchId {
    type Error = SpoolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
