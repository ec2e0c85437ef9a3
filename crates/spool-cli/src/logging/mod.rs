//! Diagnostic logging for the logspool CLI.
//!
//! stdout is reserved for command payloads (JSON). Everything emitted through
//! `tracing`, by this crate or the engine crates, goes to stderr either as
//! human-readable lines or as JSON lines.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Per-crate filter for `config.level`. Environment variables are already
/// folded into `config` by [`LogConfig::from_env`].
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::new(config.directive())
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config);

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .init();
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_filter_follows_config_level() {
        let config = LogConfig::default().with_level(LogLevel::Error);
        let filter = build_filter(&config);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
        assert!(filter.to_string().contains("spool_store=error"));
    }

    #[test]
    fn test_off_silences_every_crate() {
        let filter = build_filter(&LogConfig::default().with_level(LogLevel::Off));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::OFF));
    }
}
