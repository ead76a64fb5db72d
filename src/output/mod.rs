//! `errors.json` Sink
//!
//! The output file holds one JSON array. It is created as `[]` when missing;
//! each ticket is appended and the whole file rewritten pretty-printed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{
    ErrorLogEntry, GeneratedTicket, IssueCategory, LogLevel, Result, Severity, TicketSource,
    WardenError,
};

/// One element of the output array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: String,
    pub level: LogLevel,
    pub source: String,
    pub error_line: String,
    pub error_context: String,
    pub title: String,
    pub description: String,
    pub generated_by: TicketSource,
    pub category: IssueCategory,
    pub severity: Severity,
}

impl ErrorRecord {
    pub fn new(entry: &ErrorLogEntry, ticket: &GeneratedTicket) -> Self {
        Self {
            timestamp: entry.timestamp_iso(),
            level: entry.level,
            source: entry.source.clone(),
            error_line: entry.message.clone(),
            error_context: entry.context.clone(),
            title: ticket.content.title.clone(),
            description: ticket.content.description.clone(),
            generated_by: ticket.source,
            category: ticket.category,
            severity: ticket.severity,
        }
    }
}

pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    /// Open the sink, creating the file as an empty array if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, "[]")?;
            debug!(path = %path.display(), "Created output file");
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &ErrorRecord) -> Result<()> {
        let mut records = self.read_raw()?;
        records.push(serde_json::to_value(record)?);
        std::fs::write(&self.path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }

    /// Records currently in the file
    pub fn read_all(&self) -> Result<Vec<ErrorRecord>> {
        self.read_raw()?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(WardenError::from))
            .collect()
    }

    fn read_raw(&self) -> Result<Vec<Value>> {
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Array(items) => Ok(items),
            _ => Err(WardenError::Storage(format!(
                "{} does not contain a JSON array",
                self.path.display()
            ))),
        }
    }
}
