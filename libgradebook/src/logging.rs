//! Logging setup shared by the Gradebook binaries
//!
//! Output always goes to stderr so stdout stays clean for tables and JSON.
//! Three formats are available:
//! - `text`: compact, no target, suitable for terminals and pipes
//! - `json`: one JSON object per line
//! - `pretty`: multi-line, coloured, with file and line
//!
//! # Examples
//!
//! ```no_run
//! use libgradebook::logging::{LoggingConfig, LogFormat};
//!
//! let config = LoggingConfig::new(LogFormat::Json, "info".to_string(), false);
//! config.init();
//!
//! // Or read GRADEBOOK_LOG_FORMAT / GRADEBOOK_LOG_LEVEL
//! libgradebook::logging::init_default();
//! ```

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                other
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        };
        f.write_str(name)
    }
}

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Forces `debug` when `RUST_LOG` is not set
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// The filter directive applied when `RUST_LOG` is absent
    pub fn directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Install the global subscriber
    ///
    /// Calling this twice is harmless: the second subscriber is rejected and a
    /// debug event is recorded through the first one.
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.directive()));

        let result = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .flatten_event(true)
                .with_current_span(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init(),
        };

        if let Err(e) = result {
            tracing::debug!("Logging already initialized: {}", e);
        }
    }
}

/// Initialize logging with default settings
///
/// Respects `GRADEBOOK_LOG_FORMAT` and `GRADEBOOK_LOG_LEVEL`.
/// Falls back to text format with warn level if not set.
///
/// ```bash
/// export GRADEBOOK_LOG_FORMAT=json
/// export GRADEBOOK_LOG_LEVEL=debug
/// gradebook students list
/// ```
pub fn init_default() {
    from_env(false).init();
}

/// Build a logging configuration from the environment
pub fn from_env(verbose: bool) -> LoggingConfig {
    let format = std::env::var("GRADEBOOK_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);

    let level = std::env::var("GRADEBOOK_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());

    LoggingConfig::new(format, level, verbose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_from_str_invalid() {
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.contains("Invalid log format: 'xml'"));
    }

    #[test]
    fn test_log_format_display_round_trips() {
        for format in [LogFormat::Text, LogFormat::Json, LogFormat::Pretty] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_verbose_overrides_level() {
        let quiet = LoggingConfig::new(LogFormat::Text, "error".to_string(), false);
        let loud = LoggingConfig::new(LogFormat::Text, "error".to_string(), true);
        assert_eq!(quiet.directive(), "error");
        assert_eq!(loud.directive(), "debug");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_format_and_level() {
        std::env::set_var("GRADEBOOK_LOG_FORMAT", "json");
        std::env::set_var("GRADEBOOK_LOG_LEVEL", "trace");
        let config = from_env(false);
        std::env::remove_var("GRADEBOOK_LOG_FORMAT");
        std::env::remove_var("GRADEBOOK_LOG_LEVEL");

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "trace");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        std::env::remove_var("GRADEBOOK_LOG_FORMAT");
        std::env::remove_var("GRADEBOOK_LOG_LEVEL");
        let config = from_env(true);

        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.level, "warn");
        assert!(config.verbose);
    }

    #[test]
    fn test_double_init_does_not_panic() {
        let config = LoggingConfig::new(LogFormat::Text, "off".to_string(), false);
        config.init();
        config.init();
    }
}
