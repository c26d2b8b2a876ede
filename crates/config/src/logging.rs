//! `[log]` section
//!
//! Level and output format for the `spool` binary. The level can also be
//! overridden from the command line, which parses through `LogLevel::from_str`.

use std::str::FromStr;

use serde::Deserialize;

use crate::ConfigError;

/// Minimum level emitted
///
/// What each level shows for the coalescer:
/// - `error`: dropped records
/// - `warn`: failed store calls, splits, truncation
/// - `info`: start and shutdown summaries, metrics reports
/// - `debug`: every flush cycle
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
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
    /// `EnvFilter` directive for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::invalid_value(
                "log",
                "level",
                format!("'{other}' is not one of trace, debug, info, warn, error"),
            )),
        }
    }
}

/// How log lines are rendered on stderr
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Console,
    /// One JSON object per line
    Json,
}

/// `[log]` section
///
/// ```toml
/// [log]
/// level = "warn"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl LogConfig {
    /// Level to use after applying a command-line override
    pub fn effective_level(&self, cli_override: Option<LogLevel>) -> LogLevel {
        cli_override.unwrap_or(self.level)
    }
}
