//! Exit codes for the logspool CLI.
//!
//! Exit code ranges:
//! - 0-9: Operational outcomes (not errors)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal and I/O errors

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed.
    Clean = 0,

    /// Nothing to read: no sealed batch is available yet.
    Empty = 1,

    /// Invalid arguments (e.g. malformed batch id).
    ArgsError = 10,

    /// Configuration file missing, unparsable or invalid.
    ConfigError = 11,

    /// Permission denied on the data directory.
    PermissionError = 12,

    /// Internal error (bug - please report).
    InternalError = 20,

    /// I/O error.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::Empty)
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Stable name used in JSON error output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Empty => "OK_EMPTY",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::PermissionError => "ERR_PERMISSION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
