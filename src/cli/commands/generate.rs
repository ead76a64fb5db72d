//! Generate Command
//!
//! Produce a ticket for a single log line without touching any sink.
//!
//! Usage:
//!   logwarden generate "<LINE>" [--no-llm] [--format text|json]

use chrono::Local;

use crate::ai::TicketGenerator;
use crate::cli::{CommandContext, Output};
use crate::extract::{detect_level, strip_ansi};
use crate::monitor::parse_lines;
use crate::output::ErrorRecord;
use crate::types::{ErrorLogEntry, Result, WardenError};

const SOURCE: &str = "<command line>";

pub async fn run(mut ctx: CommandContext, line: &str, no_llm: bool, format: &str) -> Result<()> {
    let line = line.trim_end();
    if line.trim().is_empty() {
        return Err(WardenError::Config("Log line must not be empty".to_string()));
    }

    ctx.disable_llm(no_llm);
    let entry = entry_for(line);
    let generator = TicketGenerator::from_config(&ctx.config.llm);
    let ticket = generator.generate(&entry).await;

    if format == "json" {
        let record = ErrorRecord::new(&entry, &ticket);
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        let out = Output::new();
        out.ticket(&ticket);
        out.usage(&generator.usage().summary());
    }
    Ok(())
}

/// Entry for a free-standing line; lines without an error level are still
/// accepted with whatever level they carry
fn entry_for(line: &str) -> ErrorLogEntry {
    parse_lines(&[line], SOURCE)
        .into_iter()
        .next()
        .unwrap_or_else(|| {
            let line = strip_ansi(line);
            ErrorLogEntry::from_line(&line, detect_level(&line), Local::now().naive_local(), SOURCE)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogLevel;

    #[test]
    fn test_entry_for_error_line() {
        let entry = entry_for("2024-01-01 ERROR Database connection timeout after 30s");
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.timestamp_iso(), "2024-01-01T00:00:00");
    }

    #[test]
    fn test_entry_for_non_error_line() {
        let entry = entry_for("WARN cache miss ratio above threshold");
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.source, SOURCE);
    }

    #[test]
    fn test_entry_for_non_error_line_strips_ansi() {
        let entry = entry_for("\x1b[33mWARN\x1b[0m cache miss ratio above threshold");
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.message, "WARN cache miss ratio above threshold");
        assert!(!entry.context.contains('\x1b'));
    }
}
