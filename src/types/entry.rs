//! Log entry types produced by the parser.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Severity level found in a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
    Fatal,
    Unknown,
}

impl LogLevel {
    /// Levels that open an error block
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::Critical | Self::Fatal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Fatal => "FATAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            "FATAL" => Ok(Self::Fatal),
            _ => Err(format!(
                "Unknown log level '{}'. Valid values: debug, info, warn, error, critical, fatal",
                s
            )),
        }
    }
}

/// One captured error block from the monitored log.
///
/// `message` is the first line with ANSI escapes removed; `context` holds the
/// first line followed by its continuation lines (stack traces and the like).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: NaiveDateTime,
    pub raw_timestamp: Option<String>,
    pub level: LogLevel,
    pub message: String,
    pub context: String,
    pub source: String,
}

impl ErrorLogEntry {
    /// Build a single-line entry, used by the `generate` command and tests
    pub fn from_line(
        line: &str,
        level: LogLevel,
        timestamp: NaiveDateTime,
        source: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            raw_timestamp: None,
            level,
            message: line.to_string(),
            context: line.to_string(),
            source: source.into(),
        }
    }

    /// Timestamp rendered the way tickets and `errors.json` show it
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Number of lines in the captured block
    pub fn line_count(&self) -> usize {
        self.context.lines().count()
    }
}
