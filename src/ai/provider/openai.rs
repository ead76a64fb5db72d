//! OpenAI API Provider
//!
//! LLM provider using OpenAI's Chat Completions API, or any compatible
//! endpoint configured through `OPENAI_API_BASE`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

use super::chat;
use super::{ChatRequest, LlmProvider, LlmResponse};
use crate::config::OpenAiConfig;
use crate::types::{Result, WardenError};

const PROVIDER_NAME: &str = "openai";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                WardenError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY or llm.openai.api_key"
                        .to_string(),
                )
            })?;

        let api_base = chat::normalize_endpoint(&config.api_base, "OPENAI_API_BASE")?;

        Ok(Self {
            api_key: SecretString::from(api_key.to_string()),
            api_base,
            model: config.model.clone(),
            client: chat::build_client(timeout, PROVIDER_NAME)?,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.api_base);
        debug!(model = %self.model, "Sending request to OpenAI API");

        let body = chat::request_body(Some(&self.model), request);
        let builder = self.client.post(&url).header(
            "Authorization",
            format!("Bearer {}", self.api_key.expose_secret()),
        );

        chat::send(builder, &body, PROVIDER_NAME, &self.model).await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationParams;
    use crate::types::ErrorCategory;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base: &str) -> OpenAiProvider {
        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            api_base: base.to_string(),
            ..Default::default()
        };
        OpenAiProvider::new(&config, Duration::from_secs(5)).unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            system: "You write incident tickets.".to_string(),
            user: "ERROR boom".to_string(),
            params: GenerationParams {
                temperature: 0.2,
                max_tokens: 300,
            },
            json_mode: true,
        }
    }

    #[test]
    fn test_missing_key_fails_fast() {
        let config = OpenAiConfig::default();
        let err = OpenAiProvider::new(&config, Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let p = provider("https://api.openai.com/v1");
        let debug = format!("{:?}", p);
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4", "max_tokens": 300})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"title\": \"t\"}"}}],
                "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server.uri()).complete(&request()).await.unwrap();
        assert_eq!(response.content, "{\"title\": \"t\"}");
        assert_eq!(response.usage.unwrap().total(), 49);
        assert_eq!(response.metadata.provider, "openai");
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .complete(&request())
            .await
            .unwrap_err();
        match err {
            WardenError::Llm(llm) => assert_eq!(llm.category, ErrorCategory::RateLimit),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_complete_empty_choices_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .complete(&request())
            .await
            .unwrap_err();
        match err {
            WardenError::Llm(llm) => assert_eq!(llm.category, ErrorCategory::ParseError),
            other => panic!("unexpected error: {other}"),
        }
    }
}
