//! CLI error type and its mapping onto exit codes.

use spool_common::SpoolError;
use spool_config::ConfigError;
use thiserror::Error;

use crate::exit_codes::ExitCode;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Spool(#[from] SpoolError),

    #[error("invalid batch id '{0}': expected the decimal millisecond file name")]
    InvalidBatchId(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Config(ConfigError::IoError { .. }) => ExitCode::IoError,
            CliError::Config(_) => ExitCode::ConfigError,
            CliError::Spool(SpoolError::Io(e)) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                ExitCode::PermissionError
            }
            CliError::Spool(SpoolError::Io(_)) => ExitCode::IoError,
            CliError::Spool(SpoolError::Config(_)) => ExitCode::ConfigError,
            CliError::Spool(SpoolError::ItemTooLarge { .. }) | CliError::Spool(SpoolError::InvalidBatchId(_)) => {
                ExitCode::ArgsError
            }
            CliError::Spool(_) => ExitCode::InternalError,
            CliError::InvalidBatchId(_) | CliError::InvalidArgument(_) => ExitCode::ArgsError,
            CliError::Output(_) => ExitCode::InternalError,
        }
    }

    /// Numeric code of the underlying library error, when there is one.
    pub fn code(&self) -> u32 {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Spool(e) => e.code(),
            CliError::InvalidBatchId(_) => SpoolError::InvalidBatchId(String::new()).code(),
            CliError::InvalidArgument(_) => 10,
            CliError::Output(_) => 20,
        }
    }
}
