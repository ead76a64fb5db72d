//! Ticket Content Generator
//!
//! Every entry yields exactly one ticket. The LLM backend is used when it
//! initialized; any per-entry failure falls back to the regex extractor for
//! that entry only.

use tracing::{info, warn};

use crate::ai::backend::LlmTicketBackend;
use crate::ai::provider::create_provider;
use crate::ai::usage::{SharedUsage, create_shared_usage};
use crate::config::LlmConfig;
use crate::extract;
use crate::types::{ErrorLogEntry, GeneratedTicket, Severity, TicketSource};

/// Outcome of the one-time LLM initialization
#[derive(Debug)]
pub enum LlmAvailability {
    Ready(LlmTicketBackend),
    /// Turned off by configuration
    Disabled,
    /// Configuration was incomplete or invalid; regex only for this run
    Unavailable { reason: String },
}

impl LlmAvailability {
    /// Build the backend selected by `config`. Called once per process.
    pub fn initialize(config: &LlmConfig, usage: SharedUsage) -> Self {
        if !config.enabled {
            info!("LLM generation disabled, using regex extraction");
            return Self::Disabled;
        }

        match create_provider(config) {
            Ok(provider) => {
                info!(
                    provider = provider.name(),
                    model = provider.model(),
                    "LLM backend ready"
                );
                Self::Ready(LlmTicketBackend::new(provider, config, usage))
            }
            Err(e) => {
                warn!(
                    class = %config.class,
                    "LLM backend unavailable, falling back to regex extraction: {}",
                    e
                );
                Self::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Ready(backend) => {
                format!("LLM ({}, {})", backend.provider_name(), backend.model())
            }
            Self::Disabled => "regex (LLM disabled)".to_string(),
            Self::Unavailable { reason } => format!("regex (LLM unavailable: {})", reason),
        }
    }
}

pub struct TicketGenerator {
    availability: LlmAvailability,
    usage: SharedUsage,
}

impl TicketGenerator {
    pub fn new(availability: LlmAvailability, usage: SharedUsage) -> Self {
        Self {
            availability,
            usage,
        }
    }

    /// Initialize from configuration with a fresh usage tracker
    pub fn from_config(config: &LlmConfig) -> Self {
        let usage = create_shared_usage();
        let availability = LlmAvailability::initialize(config, usage.clone());
        Self::new(availability, usage)
    }

    /// Regex-only generator
    pub fn regex_only() -> Self {
        Self::new(LlmAvailability::Disabled, create_shared_usage())
    }

    pub fn availability(&self) -> &LlmAvailability {
        &self.availability
    }

    pub fn usage(&self) -> &SharedUsage {
        &self.usage
    }

    /// Produce the ticket for one entry. Never fails.
    pub async fn generate(&self, entry: &ErrorLogEntry) -> GeneratedTicket {
        let fingerprint = extract::clean_title(&entry.message);
        let category = extract::classify(&entry.message);
        let severity = Severity::from_level(entry.level);

        let (content, source) = match &self.availability {
            LlmAvailability::Ready(backend) => match backend.generate(entry).await {
                Ok(content) => (content, TicketSource::Llm),
                Err(e) => {
                    warn!(
                        title = %fingerprint,
                        "LLM generation failed, using regex fallback for this entry: {}",
                        e
                    );
                    (extract::extract(entry), TicketSource::Regex)
                }
            },
            LlmAvailability::Disabled | LlmAvailability::Unavailable { .. } => {
                (extract::extract(entry), TicketSource::Regex)
            }
        };

        GeneratedTicket {
            content,
            source,
            category,
            severity,
            fingerprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{
        ChatRequest, LlmProvider, LlmResponse, ResponseMetadata, ResponseTiming, TokenUsage,
    };
    use crate::config::LlmClass;
    use crate::types::{ErrorCategory, LogLevel, Result, WardenError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SCENARIO: &str = "2024-01-01 ERROR Database connection timeout after 30s";

    const LLM_REPLY: &str = r#"{
        "title": "Database connection pool exhausted in API tier",
        "summary": "Queries against the primary database timed out after 30 seconds.",
        "root_cause": "Connection pool saturation during peak traffic.",
        "impact": "API requests that need the database fail.",
        "reproduction_steps": ["Run the load test", "Observe timeouts"],
        "suggested_action": "Increase the pool size."
    }"#;

    /// Provider whose replies are consumed in order; the last one repeats
    struct SequenceProvider {
        replies: Mutex<Vec<std::result::Result<&'static str, ErrorCategory>>>,
        calls: AtomicUsize,
    }

    impl SequenceProvider {
        fn new(replies: Vec<std::result::Result<&'static str, ErrorCategory>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for SequenceProvider {
        async fn complete(&self, _request: &ChatRequest) -> Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = {
                let mut replies = self.replies.lock().unwrap();
                if replies.len() > 1 {
                    replies.remove(0)
                } else {
                    replies[0]
                }
            };
            match reply {
                Ok(content) => Ok(LlmResponse {
                    content: content.to_string(),
                    usage: Some(TokenUsage::from_openai(100, 60)),
                    timing: ResponseTiming { total_ms: 5 },
                    metadata: ResponseMetadata {
                        model: "gpt-4".to_string(),
                        provider: "sequence".to_string(),
                    },
                }),
                Err(category) => Err(WardenError::llm(category, "provider error")),
            }
        }

        fn name(&self) -> &str {
            "sequence"
        }

        fn model(&self) -> &str {
            "gpt-4"
        }
    }

    fn entry(line: &str) -> ErrorLogEntry {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ErrorLogEntry::from_line(line, LogLevel::Error, ts, "app.log")
    }

    fn llm_generator(provider: Arc<SequenceProvider>) -> TicketGenerator {
        let usage = create_shared_usage();
        let backend = LlmTicketBackend::new(provider, &LlmConfig::default(), usage.clone());
        TicketGenerator::new(LlmAvailability::Ready(backend), usage)
    }

    #[tokio::test]
    async fn test_regex_only_scenario() {
        let generator = TicketGenerator::regex_only();
        let ticket = generator.generate(&entry(SCENARIO)).await;

        assert_eq!(ticket.source, TicketSource::Regex);
        assert!(ticket.content.title.contains("Database connection timeout"));
        assert!(ticket.content.description.contains("**Error Summary**"));
        assert_eq!(ticket.category, crate::types::IssueCategory::Timeout);
        assert_eq!(ticket.severity, Severity::High);
        assert_eq!(generator.usage().calls(), 0);
    }

    #[tokio::test]
    async fn test_disabled_makes_no_calls() {
        let config = LlmConfig {
            enabled: false,
            class: LlmClass::OpenAi,
            ..Default::default()
        };
        let generator = TicketGenerator::from_config(&config);
        assert!(matches!(generator.availability(), LlmAvailability::Disabled));

        for _ in 0..3 {
            let ticket = generator.generate(&entry(SCENARIO)).await;
            assert_eq!(ticket.source, TicketSource::Regex);
        }
        assert_eq!(generator.usage().total_tokens(), 0);
    }

    #[tokio::test]
    async fn test_llm_success_scenario() {
        let provider = SequenceProvider::new(vec![Ok(LLM_REPLY)]);
        let generator = llm_generator(provider.clone());

        let ticket = generator.generate(&entry(SCENARIO)).await;
        assert_eq!(ticket.source, TicketSource::Llm);
        assert_eq!(
            ticket.content.title,
            "Database connection pool exhausted in API tier"
        );
        for section in ["**Summary**", "**Root Cause**", "**Impact**"] {
            assert!(ticket.content.description.contains(section));
        }
        assert_eq!(ticket.fingerprint, "Database connection timeout after 30s");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_falls_back_to_regex_title() {
        let provider = SequenceProvider::new(vec![Err(ErrorCategory::Transient)]);
        let generator = llm_generator(provider);

        let ticket = generator.generate(&entry(SCENARIO)).await;
        assert_eq!(ticket.source, TicketSource::Regex);
        assert_eq!(ticket.content.title, "Database connection timeout after 30s");
        assert!(!ticket.content.description.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_is_per_entry() {
        let provider = SequenceProvider::new(vec![
            Err(ErrorCategory::Network),
            Ok("garbage"),
            Ok(LLM_REPLY),
        ]);
        let generator = llm_generator(provider.clone());

        let first = generator.generate(&entry(SCENARIO)).await;
        let second = generator.generate(&entry(SCENARIO)).await;
        let third = generator.generate(&entry(SCENARIO)).await;

        assert_eq!(first.source, TicketSource::Regex);
        assert_eq!(second.source, TicketSource::Regex);
        assert_eq!(third.source, TicketSource::Llm);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_usage_grows_with_every_attempt() {
        let provider = SequenceProvider::new(vec![
            Err(ErrorCategory::Timeout),
            Ok(LLM_REPLY),
        ]);
        let generator = llm_generator(provider);
        let usage = generator.usage().clone();

        let mut last = usage.total_tokens();
        for _ in 0..3 {
            generator.generate(&entry(SCENARIO)).await;
            let now = usage.total_tokens();
            assert!(now > last);
            last = now;
        }
        assert_eq!(usage.calls(), 3);
        assert_eq!(usage.summary().failed_calls, 1);
    }

    #[tokio::test]
    async fn test_init_failure_is_permanent_regex_mode() {
        // Azure selected without endpoint, key or deployment
        let generator = TicketGenerator::from_config(&LlmConfig::default());
        match generator.availability() {
            LlmAvailability::Unavailable { reason } => assert!(reason.contains("AZURE_OPENAI")),
            other => panic!("expected Unavailable, got {:?}", other),
        }

        for line in [SCENARIO, "2024-01-02 FATAL Out of memory in worker pool"] {
            let ticket = generator.generate(&entry(line)).await;
            assert_eq!(ticket.source, TicketSource::Regex);
            assert!(!ticket.content.title.is_empty());
        }
        assert!(generator.availability().describe().starts_with("regex"));
        assert_eq!(generator.usage().calls(), 0);
    }

    #[tokio::test]
    async fn test_every_entry_gets_exactly_one_nonempty_ticket() {
        let provider = SequenceProvider::new(vec![Ok("{}"), Err(ErrorCategory::Auth), Ok(LLM_REPLY)]);
        let generator = llm_generator(provider);

        for line in ["", "ERROR", SCENARIO, "\x1b[31mCRITICAL\x1b[0m disk full"] {
            let ticket = generator.generate(&entry(line)).await;
            assert!(!ticket.content.title.is_empty());
            assert!(!ticket.content.description.is_empty());
        }
    }
}
