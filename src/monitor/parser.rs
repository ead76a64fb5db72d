use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::extract::{TimestampKind, detect_level, find_timestamp, strip_ansi};
use crate::types::ErrorLogEntry;

/// Group raw lines into error entries.
///
/// An entry starts at a line whose level is ERROR, CRITICAL or FATAL and
/// runs over the following lines until the next line carrying a timestamp.
pub fn parse_lines<S: AsRef<str>>(lines: &[S], source: &str) -> Vec<ErrorLogEntry> {
    parse_lines_at(lines, source, Local::now().naive_local())
}

/// [`parse_lines`] with an explicit clock, used for lines without a full date
pub fn parse_lines_at<S: AsRef<str>>(
    lines: &[S],
    source: &str,
    now: NaiveDateTime,
) -> Vec<ErrorLogEntry> {
    let cleaned: Vec<String> = lines
        .iter()
        .map(|line| strip_ansi(line.as_ref()).trim_end().to_string())
        .collect();

    let mut entries = Vec::new();
    let mut i = 0;
    while i < cleaned.len() {
        let first = &cleaned[i];
        let level = detect_level(first);
        i += 1;
        if !level.is_error() {
            continue;
        }

        let start = i - 1;
        while i < cleaned.len() && find_timestamp(&cleaned[i]).is_none() {
            i += 1;
        }

        let found = find_timestamp(first);
        let timestamp = found
            .and_then(|(raw, kind)| resolve_timestamp(raw, kind, now))
            .unwrap_or(now);

        entries.push(ErrorLogEntry {
            timestamp,
            raw_timestamp: found.map(|(raw, _)| raw.to_string()),
            level,
            message: first.clone(),
            context: cleaned[start..i].join("\n"),
            source: source.to_string(),
        });
    }

    entries
}

/// Turn a detected timestamp into a full date-time.
///
/// Syslog stamps take the year of `now`; bare times take its date. Offsets
/// and zone suffixes are dropped.
pub fn resolve_timestamp(raw: &str, kind: TimestampKind, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match kind {
        TimestampKind::Iso => parse_iso(raw),
        TimestampKind::Syslog => {
            let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            NaiveDateTime::parse_from_str(
                &format!("{} {}", now.year(), collapsed),
                "%Y %b %d %H:%M:%S",
            )
            .ok()
        }
        TimestampKind::TimeOnly => NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
            .ok()
            .map(|time| now.date().and_time(time)),
    }
}

fn parse_iso(raw: &str) -> Option<NaiveDateTime> {
    let normalized: String = raw
        .chars()
        .map(|c| match c {
            '/' => '-',
            'T' => ' ',
            ',' => '.',
            other => other,
        })
        .collect();

    let (date, time) = normalized.split_at_checked(normalized.len().min(10))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;

    let time = match time.find(['Z', '+', '-']) {
        Some(zone) => &time[..zone],
        None => time,
    }
    .trim();

    if time.is_empty() {
        return date.and_hms_opt(0, 0, 0);
    }
    NaiveTime::parse_from_str(time, "%H:%M:%S%.f")
        .ok()
        .map(|t| date.and_time(t))
}
