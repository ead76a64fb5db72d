use console::style;

use crate::ai::UsageSummary;
use crate::monitor::MonitorStats;
use crate::storage::{Issue, IssueStatus};
use crate::types::{GeneratedTicket, Severity, TicketSource};

/// Styled terminal output for command handlers
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<14} {}", style(format!("{}:", label)).dim(), value);
    }

    pub fn ticket(&self, ticket: &GeneratedTicket) {
        let origin = match ticket.source {
            TicketSource::Llm => style("llm").cyan(),
            TicketSource::Regex => style("regex").magenta(),
        };
        println!(
            "{} {} [{}]",
            style("▸").bold(),
            style(&ticket.content.title).bold(),
            origin
        );
        self.field("Category", ticket.category.as_str());
        self.field("Severity", severity_label(ticket.severity));
        println!();
        println!("{}", ticket.content.description);
    }

    pub fn stats(&self, stats: &MonitorStats) {
        self.section("Monitoring statistics");
        self.field("Lines", stats.lines_processed);
        self.field("Errors", stats.errors_found);
        self.field("LLM tickets", stats.llm_tickets);
        self.field("Regex tickets", stats.regex_tickets);
        if stats.sink_failures > 0 {
            self.field("Sink failures", style(stats.sink_failures).red());
        }
        if stats.read_failures > 0 {
            self.field("Read failures", style(stats.read_failures).red());
        }
    }

    pub fn usage(&self, usage: &UsageSummary) {
        if usage.calls == 0 {
            return;
        }
        self.section("Token usage");
        for line in usage.display().lines() {
            println!("  {}", line);
        }
    }

    pub fn issue_row(&self, issue: &Issue) {
        println!(
            "{}  {:<11} {:<8} x{:<4} {}",
            style(short_id(&issue.id)).dim(),
            status_label(issue.status),
            severity_label(issue.severity),
            issue.occurrence,
            issue.title
        );
    }

    pub fn issue_detail(&self, issue: &Issue) {
        self.section(&issue.title);
        self.field("Id", &issue.id);
        self.field("Status", status_label(issue.status));
        self.field("Severity", severity_label(issue.severity));
        self.field("Category", issue.category.as_str());
        self.field("Occurrences", issue.occurrence);
        self.field("Generated by", issue.generated_by);
        self.field("Source", &issue.source);
        self.field("Created", &issue.created_at);
        if let Some(seen) = &issue.last_seen_at {
            self.field("Last seen", seen);
        }
        println!();
        println!("{}", issue.description);

        if !issue.issue_logs.is_empty() {
            self.section("Logs");
            for log in &issue.issue_logs {
                println!("{}", style(&log.log_timestamp).dim());
                println!("{}\n", log.context);
            }
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn severity_label(severity: Severity) -> console::StyledObject<&'static str> {
    let label = severity.as_str();
    match severity {
        Severity::Critical => style(label).red().bold(),
        Severity::High => style(label).red(),
        Severity::Medium => style(label).yellow(),
        Severity::Low => style(label).dim(),
    }
}

fn status_label(status: IssueStatus) -> console::StyledObject<&'static str> {
    let label = status.as_str();
    match status {
        IssueStatus::Open => style(label).yellow(),
        IssueStatus::InProgress => style(label).cyan(),
        IssueStatus::Resolved | IssueStatus::Closed => style(label).green(),
    }
}
