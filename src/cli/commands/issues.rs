//! Issues Command
//!
//! Inspect and update the local issue registry.
//!
//! Usage:
//!   logwarden issues list [--status STATUS] [-f json]
//!   logwarden issues show <ID>
//!   logwarden issues resolve <ID>
//!   logwarden issues status <ID> <STATUS>
//!   logwarden issues delete <ID>

use crate::cli::{CommandContext, Output};
use crate::storage::IssueStatus;
use crate::types::Result;

pub fn list(ctx: &CommandContext, status: Option<IssueStatus>, format: &str) -> Result<()> {
    let store = ctx.issue_store()?;
    let issues = store.list(status)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&issues)?);
        return Ok(());
    }

    let out = Output::new();
    if issues.is_empty() {
        out.info("No issues recorded");
        return Ok(());
    }
    for issue in &issues {
        out.issue_row(issue);
    }
    println!("\n{} issue(s)", issues.len());
    Ok(())
}

pub fn show(ctx: &CommandContext, id: &str, format: &str) -> Result<()> {
    let issue = ctx.issue_store()?.get(id)?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&issue)?);
    } else {
        Output::new().issue_detail(&issue);
    }
    Ok(())
}

pub fn set_status(ctx: &CommandContext, id: &str, status: IssueStatus) -> Result<()> {
    let issue = ctx.issue_store()?.set_status(id, status)?;
    Output::new().success(&format!(
        "Issue {} marked {}: {}",
        &issue.id, issue.status, issue.title
    ));
    Ok(())
}

pub fn resolve(ctx: &CommandContext, id: &str) -> Result<()> {
    set_status(ctx, id, IssueStatus::Resolved)
}

pub fn delete(ctx: &CommandContext, id: &str) -> Result<()> {
    let issue = ctx.issue_store()?.delete(id)?;
    Output::new().success(&format!(
        "Deleted issue {} ({} occurrence(s)): {}",
        issue.id, issue.occurrence, issue.title
    ));
    Ok(())
}
