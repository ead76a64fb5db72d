//! Ticket types shared by the generator and the output sinks.

use serde::{Deserialize, Serialize};

use super::entry::LogLevel;

/// Title and description of an incident ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketContent {
    pub title: String,
    pub description: String,
}

impl TicketContent {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Which backend authored a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketSource {
    Llm,
    Regex,
}

impl std::fmt::Display for TicketSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Llm => write!(f, "llm"),
            Self::Regex => write!(f, "regex"),
        }
    }
}

/// Keyword classification of an error line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Timeout,
    Connection,
    Memory,
    Database,
    Authentication,
    Permission,
    General,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Memory => "memory",
            Self::Database => "database",
            Self::Authentication => "authentication",
            Self::Permission => "permission",
            Self::General => "general",
        }
    }

    /// Human label used in generic titles
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::Connection => "Connection",
            Self::Memory => "Memory-related",
            Self::Database => "Database",
            Self::Authentication => "Authentication",
            Self::Permission => "Permission/access",
            Self::General => "General",
        }
    }
}

impl std::str::FromStr for IssueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout" => Ok(Self::Timeout),
            "connection" => Ok(Self::Connection),
            "memory" => Ok(Self::Memory),
            "database" => Ok(Self::Database),
            "authentication" => Ok(Self::Authentication),
            "permission" => Ok(Self::Permission),
            "general" => Ok(Self::General),
            _ => Err(format!("Unknown issue category: {}", s)),
        }
    }
}

/// Ticket severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_level(level: LogLevel) -> Self {
        match level {
            LogLevel::Critical | LogLevel::Fatal => Self::Critical,
            LogLevel::Error => Self::High,
            LogLevel::Warn | LogLevel::Unknown => Self::Medium,
            LogLevel::Info | LogLevel::Debug => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Ticket as handed to the output sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTicket {
    pub content: TicketContent,
    pub source: TicketSource,
    pub category: IssueCategory,
    pub severity: Severity,
    /// Regex-derived title; stable across LLM wording changes
    pub fingerprint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_level() {
        assert_eq!(Severity::from_level(LogLevel::Fatal), Severity::Critical);
        assert_eq!(Severity::from_level(LogLevel::Critical), Severity::Critical);
        assert_eq!(Severity::from_level(LogLevel::Error), Severity::High);
        assert_eq!(Severity::from_level(LogLevel::Warn), Severity::Medium);
    }

    #[test]
    fn test_category_round_trip_names() {
        for category in [
            IssueCategory::Timeout,
            IssueCategory::Permission,
            IssueCategory::General,
        ] {
            assert_eq!(category.as_str().parse::<IssueCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_ticket_source_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TicketSource::Llm).unwrap(), "\"llm\"");
        assert_eq!(TicketSource::Regex.to_string(), "regex");
    }
}
