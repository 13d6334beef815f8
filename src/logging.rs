//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The interactive UI owns the terminal, so it only logs when a log file is
//! given. The headless command logs to stderr.
//!
//! # Log Levels
//!
//! - `warn`: failed steps shown in the status bar
//! - `info`: file loads, column mapping, model fits
//! - `debug`: UI actions and configuration
//! - `trace`: key events

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    /// Logging disabled
    Off,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub target: LogTarget,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            target: LogTarget::Stderr,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Level from the number of `-v` flags.
    ///
    /// - 0: info
    /// - 1: debug
    /// - 2+: trace
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            ..Default::default()
        }
    }

    /// Log to `path` when given, otherwise use `fallback`
    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>, fallback: LogTarget) -> Self {
        self.target = match path {
            Some(path) => LogTarget::File(path),
            None => fallback,
        };
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let filter = build_filter(config.level);
    match &config.target {
        LogTarget::Off => {}
        LogTarget::Stderr => {
            let layer = fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(config.with_ansi)
                .with_target(false)
                .without_time();
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
    Ok(())
}

/// Our crate at `level`, dependencies at warn
fn build_filter(level: Level) -> EnvFilter {
    let level = level.as_str().to_lowercase();
    EnvFilter::new(format!("warn,forecast_tui={level}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(LogConfig::from_verbosity(0).level, Level::INFO);
        assert_eq!(LogConfig::from_verbosity(1).level, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(5).level, Level::TRACE);
    }

    #[test]
    fn test_log_file_overrides_fallback() {
        let config = LogConfig::default().with_log_file(Some(PathBuf::from("run.log")), LogTarget::Off);
        assert_eq!(config.target, LogTarget::File(PathBuf::from("run.log")));

        let config = LogConfig::default().with_log_file(None, LogTarget::Off);
        assert_eq!(config.target, LogTarget::Off);
    }

    #[test]
    fn test_filter_scopes_crate_level() {
        let filter = build_filter(Level::DEBUG).to_string();
        assert!(filter.contains("forecast_tui=debug"));
    }
}
