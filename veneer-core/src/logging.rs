//! Logging setup for Veneer applications.
//!
//! Veneer itself only emits `tracing` events (formatter runs at `trace`,
//! negotiation decisions at `debug`). Installing a subscriber is left to the
//! application; [`LogConfig`] is a small builder for the common setups.
//!
//! # Examples
//!
//! ```no_run
//! use veneer_core::logging::*;
//!
//! let _guard = LogConfig::new()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Pretty)
//!     .init();
//!
//! debug!("negotiation decisions are now visible");
//! ```
//!
//! Writing to rotating files:
//!
//! ```no_run
//! use veneer_core::logging::*;
//!
//! let _guard = LogConfig::new()
//!     .output(LogOutput::RollingFile {
//!         directory: "logs".to_string(),
//!         prefix: "veneer".to_string(),
//!         rotation: Rotation::Daily,
//!     })
//!     .init();
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use tracing::{debug, error, info, trace, warn};
pub use tracing_appender::non_blocking::WorkerGuard;

/// Minimum level of events that are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    Plain,
    /// Multi-line, for development
    Pretty,
    Compact,
}

/// Where events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Append to a single file
    File(String),
    RollingFile {
        directory: String,
        prefix: String,
        rotation: Rotation,
    },
}

/// How often a rolling file starts over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<Rotation> for tracing_appender::rolling::Rotation {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Minutely => Self::MINUTELY,
            Rotation::Hourly => Self::HOURLY,
            Rotation::Daily => Self::DAILY,
            Rotation::Never => Self::NEVER,
        }
    }
}

/// Subscriber configuration.
///
/// Defaults to JSON on stdout at `info`, honoring `RUST_LOG` when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Include the module path of each event
    pub targets: bool,
    pub colors: bool,
    /// Filter directives such as `veneer_core=trace,info`. Overrides `level`.
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            targets: true,
            colors: false,
            env_filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter built from `env_filter`, else `RUST_LOG`, else `level`.
    ///
    /// Unparseable directives fall back to `level`.
    pub fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(directives) => {
                EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
        }
    }

    /// Install the global subscriber.
    ///
    /// The returned guard flushes buffered events when dropped and must be
    /// kept alive. Returns `None` when the output file cannot be opened or a
    /// global subscriber is already installed.
    pub fn init(self) -> Option<WorkerGuard> {
        let (writer, guard) = match self.writer() {
            Ok(pair) => pair,
            Err(err) => {
                eprintln!("veneer: cannot open log output: {}", err);
                return None;
            }
        };

        if self.install(writer) {
            Some(guard)
        } else {
            None
        }
    }

    fn writer(&self) -> io::Result<(NonBlocking, WorkerGuard)> {
        Ok(match &self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                tracing_appender::non_blocking(file)
            }
            LogOutput::RollingFile {
                directory,
                prefix,
                rotation,
            } => tracing_appender::non_blocking(tracing_appender::rolling::RollingFileAppender::new(
                (*rotation).into(),
                directory,
                prefix,
            )),
        })
    }

    fn install(&self, writer: NonBlocking) -> bool {
        let registry = tracing_subscriber::registry().with(self.filter());
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(self.targets);

        let installed = match self.format {
            LogFormat::Json => registry.with(layer.json()).try_init(),
            LogFormat::Plain => registry.with(layer.with_ansi(self.colors)).try_init(),
            LogFormat::Pretty => registry
                .with(layer.pretty().with_ansi(self.colors))
                .try_init(),
            LogFormat::Compact => registry
                .with(layer.compact().with_ansi(self.colors))
                .try_init(),
        };

        installed.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_string() {
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Stdout);
        assert!(config.targets);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = LogConfig::new()
            .level(LogLevel::Debug)
            .format(LogFormat::Pretty)
            .with_colors(true)
            .with_targets(false)
            .with_env_filter("veneer_core=trace");

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.colors);
        assert!(!config.targets);
        assert_eq!(config.env_filter.as_deref(), Some("veneer_core=trace"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LogConfig =
            serde_json::from_str(r#"{"level": "trace", "output": {"file": "veneer.log"}}"#).unwrap();

        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::File("veneer.log".to_string()));
    }

    #[test]
    fn test_deserialize_rolling_file() {
        let config: LogConfig = serde_json::from_str(
            r#"{"output": {"rolling_file": {"directory": "logs", "prefix": "app", "rotation": "hourly"}}}"#,
        )
        .unwrap();

        assert_eq!(
            config.output,
            LogOutput::RollingFile {
                directory: "logs".to_string(),
                prefix: "app".to_string(),
                rotation: Rotation::Hourly,
            }
        );
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = LogConfig::new().with_env_filter("veneer_core=loudest");
        assert!(config.filter().to_string().contains("info"));
    }
}
