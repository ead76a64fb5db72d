//! LLM ticket backend: one provider call per entry, guarded by a circuit
//! breaker and a deadline, with usage recorded for every attempted call.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::ai::prompt::ticket_request;
use crate::ai::provider::{CircuitBreaker, CircuitBreakerStats, SharedProvider};
use crate::ai::response::parse_ticket;
use crate::ai::timeout::with_timeout;
use crate::ai::tokenizer::estimate_request_tokens;
use crate::ai::usage::{SharedUsage, TokenUsageRecord};
use crate::config::{GenerationParams, LlmConfig};
use crate::types::{
    ErrorCategory, ErrorClassifier, ErrorLogEntry, Result, TicketContent, WardenError,
};

pub struct LlmTicketBackend {
    provider: SharedProvider,
    breaker: CircuitBreaker,
    usage: SharedUsage,
    params: GenerationParams,
    timeout: Duration,
}

impl std::fmt::Debug for LlmTicketBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTicketBackend")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmTicketBackend {
    pub fn new(provider: SharedProvider, config: &LlmConfig, usage: SharedUsage) -> Self {
        let breaker = CircuitBreaker::new(provider.name(), &config.circuit_breaker);
        Self {
            provider,
            breaker,
            usage,
            params: config.params(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn breaker_stats(&self) -> CircuitBreakerStats {
        self.breaker.stats()
    }

    /// Generate ticket content for one entry.
    ///
    /// Calls refused by an open circuit return an `Unavailable` error without
    /// touching the network or the usage tracker.
    pub async fn generate(&self, entry: &ErrorLogEntry) -> Result<TicketContent> {
        self.breaker.acquire()?;

        let provider = self.provider.name();
        let request = ticket_request(entry, self.params);
        let estimated_input = estimate_request_tokens(&request);
        let start = Instant::now();

        let outcome = with_timeout(
            self.timeout,
            self.provider.complete(&request),
            "chat completion",
        )
        .await;

        match outcome {
            Ok(response) => {
                let parsed = parse_ticket(&response.content);
                self.usage.record(TokenUsageRecord::from_response(
                    &response,
                    parsed.is_ok(),
                    estimated_input,
                ));
                match parsed {
                    Ok(content) => {
                        self.breaker.record_success();
                        debug!(provider, title = %content.title, "LLM ticket generated");
                        Ok(content)
                    }
                    Err(err) => {
                        self.breaker.record_failure(ErrorCategory::ParseError);
                        Err(Self::attribute(err, provider))
                    }
                }
            }
            Err(err) => {
                let classified = ErrorClassifier::classify_warden_error(&err, provider);
                self.usage.record(TokenUsageRecord::failed(
                    provider,
                    self.provider.model(),
                    estimated_input,
                    start.elapsed().as_millis() as u64,
                ));
                self.breaker.record_failure(classified.category);
                warn!(
                    provider,
                    category = %classified.category,
                    "LLM call failed: {}",
                    classified.message
                );
                Err(classified.into())
            }
        }
    }

    fn attribute(err: WardenError, provider: &str) -> WardenError {
        ErrorClassifier::classify_warden_error(&err, provider).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{
        ChatRequest, LlmProvider, LlmResponse, ResponseMetadata, ResponseTiming, TokenUsage,
    };
    use crate::ai::usage::create_shared_usage;
    use crate::config::BreakerConfig;
    use crate::types::LogLevel;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Content(&'static str, Option<TokenUsage>),
        Fail(ErrorCategory),
        Hang,
    }

    struct ScriptedProvider {
        reply: Reply,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, _request: &ChatRequest) -> Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Content(content, usage) => Ok(LlmResponse {
                    content: content.to_string(),
                    usage: *usage,
                    timing: ResponseTiming { total_ms: 12 },
                    metadata: ResponseMetadata {
                        model: "gpt-4".to_string(),
                        provider: "scripted".to_string(),
                    },
                }),
                Reply::Fail(category) => Err(WardenError::llm(*category, "scripted failure")),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Err(WardenError::llm(ErrorCategory::Unknown, "unreachable"))
                }
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "gpt-4"
        }
    }

    const GOOD: &str = r#"{"title": "Database connection timeout in API", "summary": "s", "root_cause": "r", "impact": "i"}"#;

    fn entry() -> ErrorLogEntry {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ErrorLogEntry::from_line(
            "2024-01-01 ERROR Database connection timeout after 30s",
            LogLevel::Error,
            ts,
            "app.log",
        )
    }

    fn backend(reply: Reply, config: LlmConfig) -> (LlmTicketBackend, Arc<ScriptedProvider>, SharedUsage) {
        let provider = Arc::new(ScriptedProvider {
            reply,
            calls: AtomicUsize::new(0),
        });
        let usage = create_shared_usage();
        let backend = LlmTicketBackend::new(provider.clone(), &config, usage.clone());
        (backend, provider, usage)
    }

    #[tokio::test]
    async fn test_success_records_reported_usage() {
        let (backend, _, usage) = backend(
            Reply::Content(GOOD, Some(TokenUsage::from_openai(90, 40))),
            LlmConfig::default(),
        );
        let content = backend.generate(&entry()).await.unwrap();
        assert_eq!(content.title, "Database connection timeout in API");

        let records = usage.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].success);
        assert!(!records[0].estimated);
        assert_eq!(usage.total_tokens(), 130);
    }

    #[tokio::test]
    async fn test_provider_failure_records_estimate() {
        let (backend, _, usage) = backend(Reply::Fail(ErrorCategory::Transient), LlmConfig::default());
        let err = backend.generate(&entry()).await.unwrap_err();
        assert!(matches!(err, WardenError::Llm(ref e) if e.category == ErrorCategory::Transient));

        let records = usage.records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert!(records[0].estimated);
        assert!(records[0].input_tokens > 0);
    }

    #[tokio::test]
    async fn test_malformed_response_is_parse_error() {
        let (backend, _, usage) = backend(Reply::Content("not json", None), LlmConfig::default());
        let err = backend.generate(&entry()).await.unwrap_err();
        assert!(matches!(err, WardenError::Llm(ref e) if e.category == ErrorCategory::ParseError));
        assert_eq!(usage.calls(), 1);
        assert!(!usage.records()[0].success);
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let config = LlmConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let (backend, _, usage) = backend(Reply::Hang, config);
        let err = backend.generate(&entry()).await.unwrap_err();
        assert!(matches!(err, WardenError::Llm(ref e) if e.category == ErrorCategory::Timeout));
        assert_eq!(usage.calls(), 1);
    }

    #[tokio::test]
    async fn test_open_circuit_skips_provider_and_usage() {
        let config = LlmConfig {
            circuit_breaker: BreakerConfig {
                failure_threshold: 2,
                recovery_secs: 600,
            },
            ..Default::default()
        };
        let (backend, provider, usage) = backend(Reply::Fail(ErrorCategory::Network), config);

        for _ in 0..2 {
            assert!(backend.generate(&entry()).await.is_err());
        }
        let err = backend.generate(&entry()).await.unwrap_err();
        assert!(matches!(err, WardenError::Llm(ref e) if e.category == ErrorCategory::Unavailable));

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(usage.calls(), 2);
        assert_eq!(backend.breaker_stats().blocked, 1);
    }
}
