//! Issue Registry
//!
//! One row per distinct error, keyed by the ticket fingerprint. Recurrences
//! bump `occurrence` and append the error context to the issue's log list.

use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::database::SharedDatabase;
use crate::types::{
    ErrorLogEntry, GeneratedTicket, IssueCategory, Result, ResultExt, Severity, TicketSource,
    WardenError,
};

/// Lifecycle state of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(format!(
                "Invalid status '{}'. Valid values: open, in_progress, resolved, closed",
                s
            )),
        }
    }
}

/// One context block attached to an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLog {
    pub log_timestamp: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub fingerprint: String,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub severity: Severity,
    pub status: IssueStatus,
    pub generated_by: TicketSource,
    pub source: String,
    pub occurrence: u32,
    /// Filled by [`IssueStore::get`]; empty in listings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue_logs: Vec<IssueLog>,
    pub created_at: String,
    pub updated_at: String,
    pub last_seen_at: Option<String>,
}

/// Result of recording a ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Created { id: String },
    Updated { id: String, occurrence: u32 },
}

impl RecordOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Created { id } | Self::Updated { id, .. } => id,
        }
    }
}

const ISSUE_COLUMNS: &str = "id, fingerprint, title, description, category, severity, status, \
                             generated_by, source, occurrence, created_at, updated_at, last_seen_at";

/// Issue registry on top of the pooled database
pub struct IssueStore {
    db: SharedDatabase,
}

impl IssueStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Create an issue for an unseen fingerprint or update the existing one.
    ///
    /// A resolved or closed issue that recurs is reopened.
    pub fn record(&self, ticket: &GeneratedTicket, entry: &ErrorLogEntry) -> Result<RecordOutcome> {
        let now = Utc::now().to_rfc3339();
        let log_timestamp = entry.timestamp_iso();

        let outcome = self.db.transaction(|conn| {
            let existing: Option<(String, String)> = conn
                .query_row(
                    "SELECT id, status FROM issues WHERE fingerprint = ?1",
                    params![ticket.fingerprint],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .with_context("Failed to look up issue")?;

            let outcome = match existing {
                Some((id, status)) => {
                    let reopen = status
                        .parse::<IssueStatus>()
                        .map(|s| s.is_done())
                        .unwrap_or(false);
                    if reopen {
                        info!(id = %id, "Resolved issue recurred, reopening");
                    }

                    conn.execute(
                        "UPDATE issues
                         SET occurrence = occurrence + 1,
                             status = CASE WHEN ?2 THEN 'open' ELSE status END,
                             updated_at = ?3,
                             last_seen_at = ?4
                         WHERE id = ?1",
                        params![id, reopen, now, log_timestamp],
                    )
                    .with_context("Failed to update issue")?;

                    let occurrence: u32 = conn
                        .query_row(
                            "SELECT occurrence FROM issues WHERE id = ?1",
                            params![id],
                            |row| row.get(0),
                        )
                        .with_context("Failed to read occurrence")?;

                    RecordOutcome::Updated { id, occurrence }
                }
                None => {
                    let id = uuid::Uuid::new_v4().to_string();
                    conn.execute(
                        "INSERT INTO issues
                         (id, fingerprint, title, description, category, severity, status,
                          generated_by, source, occurrence, created_at, updated_at, last_seen_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'open', ?7, ?8, 1, ?9, ?9, ?10)",
                        params![
                            id,
                            ticket.fingerprint,
                            ticket.content.title,
                            ticket.content.description,
                            ticket.category.as_str(),
                            ticket.severity.as_str(),
                            ticket.source.to_string(),
                            entry.source,
                            now,
                            log_timestamp,
                        ],
                    )
                    .with_context("Failed to insert issue")?;

                    RecordOutcome::Created { id }
                }
            };

            conn.execute(
                "INSERT INTO issue_logs (issue_id, log_timestamp, context, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![outcome.id(), log_timestamp, entry.context, now],
            )
            .with_context("Failed to append issue log")?;

            Ok(outcome)
        })?;

        debug!(fingerprint = %ticket.fingerprint, outcome = ?outcome, "Issue recorded");
        Ok(outcome)
    }

    /// Issues ordered by most recent activity, optionally filtered by status
    pub fn list(&self, status: Option<IssueStatus>) -> Result<Vec<Issue>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {} FROM issues WHERE (?1 IS NULL OR status = ?1) ORDER BY updated_at DESC, id",
            ISSUE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).with_context("Failed to prepare issue list")?;
        let rows = stmt
            .query_map(params![status.map(|s| s.as_str())], map_issue_row)
            .with_context("Failed to list issues")?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to read issue row")
    }

    /// Issue with its logs; accepts the full id or a unique prefix
    pub fn get(&self, id: &str) -> Result<Issue> {
        let conn = self.db.connection()?;
        let full_id = self.resolve_id(&conn, id)?;

        let sql = format!("SELECT {} FROM issues WHERE id = ?1", ISSUE_COLUMNS);
        let mut issue = conn
            .query_row(&sql, params![full_id], map_issue_row)
            .with_context("Failed to load issue")?;

        let mut stmt = conn
            .prepare("SELECT log_timestamp, context FROM issue_logs WHERE issue_id = ?1 ORDER BY id")
            .with_context("Failed to prepare issue logs")?;
        issue.issue_logs = stmt
            .query_map(params![full_id], |row| {
                Ok(IssueLog {
                    log_timestamp: row.get(0)?,
                    context: row.get(1)?,
                })
            })
            .with_context("Failed to load issue logs")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to read issue log row")?;

        Ok(issue)
    }

    pub fn set_status(&self, id: &str, status: IssueStatus) -> Result<Issue> {
        {
            let conn = self.db.connection()?;
            let full_id = self.resolve_id(&conn, id)?;
            conn.execute(
                "UPDATE issues SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![full_id, status.as_str(), Utc::now().to_rfc3339()],
            )
            .with_context("Failed to update issue status")?;
        }
        self.get(id)
    }

    /// Remove an issue and its logs; returns the issue as it was
    pub fn delete(&self, id: &str) -> Result<Issue> {
        let issue = self.get(id)?;
        self.db.transaction(|conn| {
            conn.execute("DELETE FROM issue_logs WHERE issue_id = ?1", params![issue.id])
                .with_context("Failed to delete issue logs")?;
            conn.execute("DELETE FROM issues WHERE id = ?1", params![issue.id])
                .with_context("Failed to delete issue")?;
            Ok(())
        })?;

        info!(id = %issue.id, "Issue deleted");
        Ok(issue)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .with_context("Failed to count issues")?;
        Ok(count as usize)
    }

    fn resolve_id(&self, conn: &rusqlite::Connection, id: &str) -> Result<String> {
        let mut stmt = conn
            .prepare("SELECT id FROM issues WHERE id LIKE ?1 || '%' LIMIT 2")
            .with_context("Failed to prepare id lookup")?;
        let matches: Vec<String> = stmt
            .query_map(params![id], |row| row.get(0))
            .with_context("Failed to look up issue id")?
            .collect::<std::result::Result<_, _>>()
            .with_context("Failed to read issue id")?;

        match matches.as_slice() {
            [only] => Ok(only.clone()),
            [] => Err(WardenError::IssueNotFound(id.to_string())),
            _ => Err(WardenError::Storage(format!(
                "Issue id prefix '{}' is ambiguous",
                id
            ))),
        }
    }
}

fn map_issue_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    fn parse_column<T: std::str::FromStr<Err = String>>(
        row: &Row<'_>,
        idx: usize,
    ) -> rusqlite::Result<T> {
        let raw: String = row.get(idx)?;
        raw.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })
    }

    let generated_by: String = row.get(7)?;
    Ok(Issue {
        id: row.get(0)?,
        fingerprint: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: parse_column(row, 4)?,
        severity: parse_column(row, 5)?,
        status: parse_column(row, 6)?,
        generated_by: if generated_by == "llm" {
            TicketSource::Llm
        } else {
            TicketSource::Regex
        },
        source: row.get(8)?,
        occurrence: row.get(9)?,
        issue_logs: Vec::new(),
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        last_seen_at: row.get(12)?,
    })
}
