//! Turning provider output into ticket content.
//!
//! Models asked for JSON still wrap it in code fences or a sentence of prose
//! now and then, so extraction strips fences first and falls back to the
//! first balanced object in the text.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::constants::ticket::MAX_TITLE_CHARS;
use crate::types::{Result, TicketContent, WardenError};

/// Fields the prompt asks for; everything optional so the checks below can
/// report what was missing
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TicketDraft {
    title: Option<String>,
    summary: Option<Value>,
    root_cause: Option<Value>,
    impact: Option<Value>,
    reproduction_steps: Option<Value>,
    suggested_action: Option<Value>,
}

/// Description sections in rendering order
const SECTIONS: &[&str] = &[
    "Summary",
    "Root Cause",
    "Impact",
    "Reproduction Steps",
    "Suggested Action",
];

/// Parse a chat completion body into a ticket.
///
/// Fails with a `ParseError` category when no JSON object is found, the
/// title is empty or longer than the title limit, or every description
/// section is empty.
pub fn parse_ticket(raw: &str) -> Result<TicketContent> {
    let value = extract_json_object(raw)?;
    let draft: TicketDraft = serde_json::from_value(value)
        .map_err(|e| WardenError::parse(format!("Unexpected ticket shape: {}", e)))?;

    let title = draft
        .title
        .as_deref()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    if title.is_empty() {
        return Err(WardenError::parse("Response has no title"));
    }
    let title_chars = title.chars().count();
    if title_chars > MAX_TITLE_CHARS {
        return Err(WardenError::parse(format!(
            "Title is {} characters, limit is {}",
            title_chars, MAX_TITLE_CHARS
        )));
    }

    let bodies = [
        draft.summary.as_ref().and_then(render_text),
        draft.root_cause.as_ref().and_then(render_text),
        draft.impact.as_ref().and_then(render_text),
        draft.reproduction_steps.as_ref().and_then(render_steps),
        draft.suggested_action.as_ref().and_then(render_text),
    ];

    let description = SECTIONS
        .iter()
        .zip(bodies)
        .filter_map(|(label, body)| body.map(|b| format!("**{}**\n{}", label, b)))
        .collect::<Vec<_>>()
        .join("\n\n");

    if description.is_empty() {
        return Err(WardenError::parse("Response has no description sections"));
    }

    Ok(TicketContent::new(title, description))
}

fn render_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(render_text)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Arrays become a numbered list; strings are kept as written
fn render_steps(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let steps: Vec<String> = items.iter().filter_map(render_text).collect();
            (!steps.is_empty()).then(|| {
                steps
                    .iter()
                    .enumerate()
                    .map(|(i, step)| format!("{}. {}", i + 1, step))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        other => render_text(other),
    }
}

// =============================================================================
// JSON Extraction
// =============================================================================

/// Extract the JSON object from an LLM response
pub fn extract_json_object(raw: &str) -> Result<Value> {
    let cleaned = strip_code_fences(raw.trim().trim_start_matches('\u{feff}'));

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(cleaned) {
        return Ok(value);
    }

    if let Some(candidate) = first_balanced_object(cleaned)
        && let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate)
    {
        debug!("JSON object extracted from surrounding text");
        return Ok(value);
    }

    Err(WardenError::parse(format!(
        "No JSON object in response. Content preview: {}...",
        cleaned.chars().take(200).collect::<String>()
    )))
}

fn strip_code_fences(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop the info string (```json) up to the first newline
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn first_balanced_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
