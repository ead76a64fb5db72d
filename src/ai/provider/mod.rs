//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait for chat-completion style generation.
//! Both supported variants speak the OpenAI Chat Completions wire format and
//! differ only in URL layout and authentication.
//!
//! ## Modules
//!
//! - `chat`: shared request/response types and response handling
//! - `azure`: Azure-hosted OpenAI deployments
//! - `openai`: the OpenAI API (or any compatible base URL)
//! - `circuit_breaker`: stops calling a provider that keeps failing

mod azure;
mod chat;
mod circuit_breaker;
mod openai;

pub use azure::AzureOpenAiProvider;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerStats, CircuitState};
pub use openai::OpenAiProvider;

pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{GenerationParams, LlmClass, LlmConfig};
use crate::types::Result;

// =============================================================================
// Request / Response
// =============================================================================

/// Provider-neutral chat request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub params: GenerationParams,
    /// Ask the provider for a JSON object response
    pub json_mode: bool,
}

/// LLM response including raw content, usage metrics and timing
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text as returned by the provider
    pub content: String,
    /// Token usage reported by the provider, if any
    pub usage: Option<TokenUsage>,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

/// Token usage metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (completion)
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Shared LLM provider type
pub type SharedProvider = Arc<dyn LlmProvider>;

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one chat completion request.
    ///
    /// Failures are `WardenError::Llm` carrying an [`ErrorCategory`].
    async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Build the provider selected by `config.class`.
///
/// Fails fast when the selected variant is missing required settings.
pub fn create_provider(config: &LlmConfig) -> Result<SharedProvider> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.class {
        LlmClass::AzureOpenAi => Ok(Arc::new(AzureOpenAiProvider::new(&config.azure, timeout)?)),
        LlmClass::OpenAi => Ok(Arc::new(OpenAiProvider::new(&config.openai, timeout)?)),
    }
}
