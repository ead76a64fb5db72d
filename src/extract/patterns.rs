//! Log line patterns shared by the parser and the title extractor.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::types::LogLevel;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:[@-Z\x5C-_]|\[[0-?]*[ -/]*[@-~])").expect("ANSI pattern is valid")
});

/// ISO-like date with optional time, syslog, or bare time with millis.
/// Digits are ASCII only.
pub(crate) static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<iso>[0-9]{4}[-/][0-9]{2}[-/][0-9]{2}",
        r"(?:[ T][0-9]{2}:[0-9]{2}:[0-9]{2}(?:[.,][0-9]+)?(?:Z|[+-][0-9]{2}:?[0-9]{2})?)?)",
        r"|(?P<syslog>\b[A-Z][a-z]{2} +[0-9]{1,2} [0-9]{2}:[0-9]{2}:[0-9]{2})",
        r"|(?P<time>\b[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3})",
    ))
    .expect("timestamp pattern is valid")
});

/// Level tokens in detection order; the first one present wins
const LEVEL_PRECEDENCE: &[(&str, LogLevel)] = &[
    ("ERROR", LogLevel::Error),
    ("WARN", LogLevel::Warn),
    ("WARNING", LogLevel::Warn),
    ("INFO", LogLevel::Info),
    ("DEBUG", LogLevel::Debug),
    ("CRITICAL", LogLevel::Critical),
    ("FATAL", LogLevel::Fatal),
];

static LEVELS: LazyLock<Vec<(Regex, LogLevel)>> = LazyLock::new(|| {
    LEVEL_PRECEDENCE
        .iter()
        .map(|(token, level)| {
            let pattern = Regex::new(&format!(r"(?i)\b{}\b", token)).expect("level pattern is valid");
            (pattern, *level)
        })
        .collect()
});

/// A level token, optionally wrapped in brackets
pub(crate) static LEVEL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[?\b(?:DEBUG|INFO|WARNING|WARN|ERROR|CRITICAL|FATAL)\b\]?")
        .expect("level token pattern is valid")
});

/// Timestamp shapes recognized in a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    /// `YYYY-MM-DD` with optional time of day
    Iso,
    /// `Mon DD HH:MM:SS`, no year
    Syslog,
    /// `HH:MM:SS.fff`, no date
    TimeOnly,
}

/// Remove ANSI color and cursor escapes
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(line, "")
}

/// First timestamp in the line and its shape
pub fn find_timestamp(line: &str) -> Option<(&str, TimestampKind)> {
    let caps = TIMESTAMP.captures(line)?;
    if let Some(m) = caps.name("iso") {
        Some((m.as_str(), TimestampKind::Iso))
    } else if let Some(m) = caps.name("syslog") {
        Some((m.as_str(), TimestampKind::Syslog))
    } else {
        caps.name("time").map(|m| (m.as_str(), TimestampKind::TimeOnly))
    }
}

/// Level of a line by whole-word, case-insensitive token.
///
/// Tokens are tried in a fixed order (ERROR, WARN, WARNING, INFO, DEBUG,
/// CRITICAL, FATAL) rather than by position, so a line mentioning ERROR
/// anywhere is an error line.
pub fn detect_level(line: &str) -> LogLevel {
    LEVELS
        .iter()
        .find(|(pattern, _)| pattern.is_match(line))
        .map(|(_, level)| *level)
        .unwrap_or(LogLevel::Unknown)
}
