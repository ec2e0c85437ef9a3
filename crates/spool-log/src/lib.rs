//! Log events for logspool.
//!
//! [`Log`] is the event model and [`LogSerializer`] turns it into one flat
//! JSON object per event, ready to be appended to a batch.

pub mod model;
pub mod network;
pub mod serializer;

pub use model::{ErrorInfo, Log, LogLevel, ParseLevelError};
pub use network::{Connectivity, NetworkInfo};
pub use serializer::{LogSerializer, RESERVED_ATTRIBUTES};
