//! logspool command-line front end.
//!
//! The `logspool` binary writes events into the on-disk queue and lets an
//! operator inspect, drain and purge it. The modules here hold everything but
//! argument parsing, so they can be exercised without spawning the binary.

pub mod commands;
pub mod error;
pub mod exit_codes;
pub mod logging;

pub use error::CliError;
pub use exit_codes::ExitCode;
