//! AI Integration Layer
//!
//! LLM-backed ticket generation with a regex fallback for every failure mode.

pub mod backend;
pub mod generator;
pub mod prompt;
pub mod provider;
pub mod response;
pub mod timeout;
pub mod tokenizer;
pub mod usage;

pub use backend::LlmTicketBackend;
pub use generator::{LlmAvailability, TicketGenerator};
pub use prompt::{PromptBuilder, ticket_request};
pub use provider::{
    AzureOpenAiProvider, ChatRequest, CircuitBreaker, CircuitBreakerStats, CircuitState,
    ErrorCategory, ErrorClassifier, LlmError, LlmProvider, LlmResponse, OpenAiProvider,
    ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage, create_provider,
};
pub use response::{extract_json_object, parse_ticket};
pub use timeout::with_timeout;
pub use tokenizer::{estimate_request_tokens, estimate_tokens};
pub use usage::{SharedUsage, TokenUsageRecord, UsageSummary, UsageTracker, create_shared_usage};
