//! Log event model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::network::NetworkInfo;

/// Severity of a log event. Serialized as the upper-case `status` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Map a numeric priority (2 = verbose … 7 = assert). Anything below 2
    /// is treated as debug, anything above 7 as critical.
    pub fn from_priority(priority: i32) -> Self {
        match priority {
            2 => LogLevel::Trace,
            i32::MIN..=3 => LogLevel::Debug,
            4 => LogLevel::Info,
            5 => LogLevel::Warn,
            6 => LogLevel::Error,
            _ => LogLevel::Critical,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown log level '{}' (expected trace, debug, info, warn, error or critical)",
            self.0
        )
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" | "verbose" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "critical" | "fatal" | "assert" => Ok(LogLevel::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Error details attached to a log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
    pub stack: String,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>, stack: impl Into<String>) -> Self {
        ErrorInfo {
            kind: kind.into(),
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Capture a Rust error: its type name, message and source chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            stack.push_str("\ncaused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }
        ErrorInfo {
            kind: short_type_name(error),
            message: error.to_string(),
            stack,
        }
    }
}

fn short_type_name(error: &(dyn std::error::Error + 'static)) -> String {
    // Debug output of most error types starts with the type or variant name.
    let debug = format!("{:?}", error);
    let end = debug
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(debug.len());
    if end == 0 {
        "Error".to_string()
    } else {
        debug[..end].to_string()
    }
}

/// One log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub service_name: String,
    pub message: String,
    pub logger_name: String,
    pub thread_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub network_info: Option<NetworkInfo>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

impl Log {
    /// A log stamped now, on the current thread, with default names.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Log {
            level,
            service_name: "logspool".to_string(),
            message: message.into(),
            logger_name: "logspool".to_string(),
            thread_name: std::thread::current()
                .name()
                .unwrap_or("unnamed")
                .to_string(),
            timestamp: Utc::now(),
            tags: Vec::new(),
            attributes: Map::new(),
            network_info: None,
            error: None,
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service_name = service.into();
        self
    }

    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger_name = logger.into();
        self
    }

    pub fn with_thread(mut self, thread: impl Into<String>) -> Self {
        self.thread_name = thread.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_network_info(mut self, info: NetworkInfo) -> Self {
        self.network_info = Some(info);
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }
}
