//! Regex Fallback Extractor
//!
//! Builds a ticket from the log text alone. Used when the LLM backend is
//! disabled, failed to initialize, or failed for a single entry. Never fails
//! and performs no I/O.

pub mod patterns;

pub use patterns::{TimestampKind, detect_level, find_timestamp, strip_ansi};

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::ticket::{GENERIC_TITLE, MAX_TITLE_CHARS, MIN_TITLE_CHARS};
use crate::types::{ErrorLogEntry, IssueCategory, LogLevel, TicketContent};

static LEADING_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\[\]\s\-_|]+").expect("separator pattern is valid"));

static LOGGER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+\s*:").expect("logger pattern is valid"));

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*").expect("number pattern is valid"));

static LEADING_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[\[\](){}]+\s*").expect("bracket pattern is valid"));

/// Keyword table, checked in order against the lowercased first line
const CATEGORY_KEYWORDS: &[(IssueCategory, &[&str])] = &[
    (IssueCategory::Timeout, &["timeout", "timed out"]),
    (IssueCategory::Connection, &["connection", "refused", "unreachable"]),
    (IssueCategory::Memory, &["memory"]),
    (IssueCategory::Database, &["database", "sql", "deadlock"]),
    (IssueCategory::Authentication, &["authentication", "auth"]),
    (IssueCategory::Permission, &["permission", "access", "forbidden"]),
];

const NEXT_STEPS: &[&str] = &[
    "Review the error log for specific error messages",
    "Check system resources and dependencies",
    "Investigate recent changes that might have caused this issue",
    "Monitor for similar errors in the future",
];

/// Derive a title from a raw error line.
///
/// Strips ANSI escapes, timestamps, every level token, leading
/// separators, a logger-name prefix, leading numbers and brackets. Falls
/// back to a generic title when too little text remains and truncates long
/// titles to the title limit.
pub fn clean_title(error_line: &str) -> String {
    let first_line = error_line.lines().next().unwrap_or_default();
    let line = strip_ansi(first_line);
    let line = patterns::TIMESTAMP.replace_all(&line, "");
    let line = patterns::LEVEL_TOKEN.replace_all(&line, "");
    let line = LEADING_SEPARATORS.replace(&line, "");
    let line = LOGGER_NAME.replace(&line, "");
    let line = LEADING_NUMBER.replace(&line, "");
    let line = LEADING_BRACKETS.replace(&line, "");

    let title = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars = title.chars().count();

    if chars < MIN_TITLE_CHARS {
        GENERIC_TITLE.to_string()
    } else if chars > MAX_TITLE_CHARS {
        let mut truncated: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
        truncated.push_str("...");
        truncated
    } else {
        title
    }
}

/// Keyword classification of the first line
pub fn classify(error_line: &str) -> IssueCategory {
    let first_line = error_line.lines().next().unwrap_or_default().to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| first_line.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(IssueCategory::General)
}

/// Priority label used in generic descriptions
pub fn priority(level: LogLevel) -> &'static str {
    if matches!(level, LogLevel::Critical | LogLevel::Fatal) {
        "High"
    } else {
        "Medium"
    }
}

/// Generic markdown description for an entry
pub fn fallback_description(entry: &ErrorLogEntry) -> String {
    let category = classify(&entry.message);
    let steps = NEXT_STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "**Error Summary**\n\
         A {level} level error was detected in the system.\n\
         \n\
         **Timestamp**: {timestamp}\n\
         **Source**: {source}\n\
         **Log Level**: {level}\n\
         **Category**: {category}\n\
         \n\
         **Error Details**:\n\
         ```\n\
         {context}\n\
         ```\n\
         \n\
         **Next Steps**:\n\
         {steps}\n\
         \n\
         **Priority**: {priority}",
        level = entry.level,
        timestamp = entry.timestamp_iso(),
        source = entry.source,
        category = category.label(),
        context = entry.context,
        steps = steps,
        priority = priority(entry.level),
    )
}

/// Full regex ticket for an entry
pub fn extract(entry: &ErrorLogEntry) -> TicketContent {
    TicketContent::new(clean_title(&entry.message), fallback_description(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn entry(line: &str, level: LogLevel) -> ErrorLogEntry {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ErrorLogEntry::from_line(line, level, ts, "app.log")
    }

    #[test]
    fn test_scenario_title() {
        assert_eq!(
            clean_title("2024-01-01 ERROR Database connection timeout after 30s"),
            "Database connection timeout after 30s"
        );
    }

    #[test]
    fn test_strips_metadata_prefixes() {
        assert_eq!(
            clean_title("\x1b[31m2024-03-05 10:11:12,345 [ERROR] app.db: Connection refused by host\x1b[0m"),
            "Connection refused by host"
        );
        assert_eq!(
            clean_title("Jan 12 08:00:01 | CRITICAL | 42 Disk quota exceeded on /data"),
            "Disk quota exceeded on /data"
        );
        assert_eq!(
            clean_title("12:00:01.250 - FATAL - payments.service: Out of memory in ledger sync"),
            "Out of memory in ledger sync"
        );
    }

    #[test]
    fn test_every_level_token_removed() {
        assert_eq!(
            clean_title("ERROR handler reported ERROR code 7 upstream"),
            "handler reported code 7 upstream"
        );
        assert_eq!(
            clean_title("2024-01-01 10:00:00 INFO request failed with ERROR 500"),
            "request failed with 500"
        );
    }

    #[test]
    fn test_short_title_becomes_generic() {
        assert_eq!(clean_title("2024-01-01 ERROR oops"), GENERIC_TITLE);
        assert_eq!(clean_title(""), GENERIC_TITLE);
    }

    #[test]
    fn test_long_title_truncated() {
        let line = format!("ERROR {}", "x".repeat(300));
        let title = clean_title(&line);
        assert_eq!(title.chars().count(), 200);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_classify_keywords_in_order() {
        assert_eq!(
            classify("Database connection timeout after 30s"),
            IssueCategory::Timeout
        );
        assert_eq!(classify("connection reset by peer"), IssueCategory::Connection);
        assert_eq!(classify("Out of memory"), IssueCategory::Memory);
        assert_eq!(classify("database is locked"), IssueCategory::Database);
        assert_eq!(classify("auth token expired"), IssueCategory::Authentication);
        assert_eq!(classify("Access denied for /etc"), IssueCategory::Permission);
        assert_eq!(classify("NullPointerException"), IssueCategory::General);
    }

    #[test]
    fn test_fallback_description_template() {
        let description = fallback_description(&entry(
            "2024-01-01 ERROR Database connection timeout after 30s",
            LogLevel::Error,
        ));
        assert!(description.starts_with("**Error Summary**\nA ERROR level error"));
        assert!(description.contains("**Timestamp**: 2024-01-01T00:00:00"));
        assert!(description.contains("**Source**: app.log"));
        assert!(description.contains("```\n2024-01-01 ERROR Database connection timeout after 30s\n```"));
        assert!(description.contains("4. Monitor for similar errors in the future"));
        assert!(description.ends_with("**Priority**: Medium"));

        let fatal = fallback_description(&entry("FATAL kernel panic", LogLevel::Fatal));
        assert!(fatal.ends_with("**Priority**: High"));
    }

    #[test]
    fn test_extract_pairs_title_and_description() {
        let ticket = extract(&entry(
            "2024-01-01 ERROR Database connection timeout after 30s",
            LogLevel::Error,
        ));
        assert!(ticket.title.contains("Database connection timeout"));
        assert!(ticket.description.contains("**Next Steps**"));
    }

    proptest! {
        #[test]
        fn prop_title_never_empty_and_bounded(line in ".{0,400}") {
            let title = clean_title(&line);
            prop_assert!(!title.is_empty());
            prop_assert!(title.chars().count() <= MAX_TITLE_CHARS);
        }

        #[test]
        fn prop_title_has_no_ansi(body in "[a-z ]{10,60}") {
            let line = format!("\x1b[1;31mERROR\x1b[0m {}", body);
            prop_assert!(!clean_title(&line).contains('\x1b'));
        }
    }
}
