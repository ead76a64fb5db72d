//! Prompt Builder
//!
//! Sectioned prompt construction for ticket generation. The system prompt
//! fixes the role, the JSON shape and title rules; the user prompt carries
//! the captured error block.

use crate::ai::provider::ChatRequest;
use crate::config::GenerationParams;
use crate::types::ErrorLogEntry;

/// Prompt section types
#[derive(Debug, Clone)]
enum PromptSection {
    Role { expertise: String, task: String },
    Objectives(Vec<String>),
    /// Ordered key-value pairs
    Context(Vec<(String, String)>),
    Code { language: String, content: String },
    AntiPatterns { bad: Vec<String>, good: Vec<String> },
    Custom(String),
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: &[&str]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.to_string()).collect(),
        ));
        self
    }

    /// Add a context item, appending to the existing context section
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let item = (key.to_string(), value.to_string());
        match self
            .sections
            .iter_mut()
            .find(|s| matches!(s, PromptSection::Context(_)))
        {
            Some(PromptSection::Context(items)) => items.push(item),
            _ => self.sections.push(PromptSection::Context(vec![item])),
        }
        self
    }

    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn anti_patterns(mut self, bad: &[&str], good: &[&str]) -> Self {
        self.sections.push(PromptSection::AntiPatterns {
            bad: bad.iter().map(|b| b.to_string()).collect(),
            good: good.iter().map(|g| g.to_string()).collect(),
        });
        self
    }

    pub fn custom(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Custom(content.to_string()));
        self
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    prompt.push_str("\n```\n\n");
                }
                PromptSection::AntiPatterns { bad, good } => {
                    prompt.push_str("<what_not_to_do>\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    prompt.push_str("</what_not_to_do>\n\n<what_to_do>\n");
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push_str("</what_to_do>\n\n");
                }
                PromptSection::Custom(content) => {
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

// =============================================================================
// Ticket Prompts
// =============================================================================

const OUTPUT_SHAPE: &str = r#"Respond ONLY with a JSON object of this shape, no explanation:
{
  "title": "specific, under 100 characters",
  "summary": "what happened",
  "root_cause": "most likely cause, grounded in the log",
  "impact": "affected systems, services or users",
  "reproduction_steps": ["step", "..."],
  "suggested_action": "what a developer should do first"
}"#;

pub fn ticket_system_prompt() -> String {
    PromptBuilder::new()
        .role(
            "site reliability engineer",
            "turning error logs into actionable incident tickets",
        )
        .objectives(&[
            "Write a title that names the failing component and the failure",
            "Keep the title under 100 characters with normal capitalization",
            "Describe what happened, the likely cause and the impact",
            "Use only facts visible in the log; say so when the cause is uncertain",
        ])
        .anti_patterns(
            &["Error in logs", "System failure", "Database error"],
            &[
                "Database connection timeout in user authentication service",
                "Null pointer exception in order processing workflow",
            ],
        )
        .custom(OUTPUT_SHAPE)
        .build()
}

pub fn ticket_user_prompt(entry: &ErrorLogEntry) -> String {
    PromptBuilder::new()
        .context_item("Timestamp", &entry.timestamp_iso())
        .context_item("Source", &entry.source)
        .context_item("Log Level", entry.level.as_str())
        .custom("Error Log:")
        .code("log", &entry.context)
        .build()
}

/// Build the chat request for one entry
pub fn ticket_request(entry: &ErrorLogEntry, params: GenerationParams) -> ChatRequest {
    ChatRequest {
        system: ticket_system_prompt(),
        user: ticket_user_prompt(entry),
        params,
        json_mode: true,
    }
}
