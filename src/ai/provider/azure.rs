//! Azure OpenAI Provider
//!
//! Calls a chat deployment at
//! `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={v}`
//! and authenticates with the `api-key` header.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

use super::chat;
use super::{ChatRequest, LlmProvider, LlmResponse};
use crate::config::AzureOpenAiConfig;
use crate::types::{Result, WardenError};

const PROVIDER_NAME: &str = "azure-openai";

pub struct AzureOpenAiProvider {
    api_key: SecretString,
    endpoint: String,
    deployment: String,
    api_version: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AzureOpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .finish()
    }
}

fn required<'a>(value: Option<&'a str>, var: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WardenError::Config(format!("Azure OpenAI requires {} to be set", var)))
}

impl AzureOpenAiProvider {
    pub fn new(config: &AzureOpenAiConfig, timeout: Duration) -> Result<Self> {
        let endpoint = required(config.endpoint.as_deref(), "AZURE_OPENAI_ENDPOINT")?;
        let api_key = required(config.api_key.as_deref(), "AZURE_OPENAI_API_KEY")?;
        let deployment = required(
            config.deployment.as_deref(),
            "AZURE_OPENAI_DEPLOYMENT_NAME",
        )?;

        Ok(Self {
            api_key: SecretString::from(api_key.to_string()),
            endpoint: chat::normalize_endpoint(endpoint, "AZURE_OPENAI_ENDPOINT")?,
            deployment: deployment.to_string(),
            api_version: config.api_version.clone(),
            model: config.model.clone(),
            client: chat::build_client(timeout, PROVIDER_NAME)?,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse> {
        debug!(deployment = %self.deployment, "Sending request to Azure OpenAI");

        let body = chat::request_body(None, request);
        let builder = self
            .client
            .post(self.url())
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", self.api_key.expose_secret());

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
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: &str) -> AzureOpenAiConfig {
        AzureOpenAiConfig {
            endpoint: Some(endpoint.to_string()),
            api_key: Some("az-key".to_string()),
            deployment: Some("tickets".to_string()),
            ..Default::default()
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            system: "sys".to_string(),
            user: "usr".to_string(),
            params: GenerationParams {
                temperature: 0.1,
                max_tokens: 500,
            },
            json_mode: true,
        }
    }

    #[test]
    fn test_each_required_setting_is_checked() {
        for missing in ["endpoint", "api_key", "deployment"] {
            let mut cfg = config("https://example.openai.azure.com");
            match missing {
                "endpoint" => cfg.endpoint = None,
                "api_key" => cfg.api_key = Some("  ".to_string()),
                _ => cfg.deployment = None,
            }
            let result = AzureOpenAiProvider::new(&cfg, Duration::from_secs(5));
            assert!(
                matches!(result, Err(WardenError::Config(_))),
                "missing {missing} should fail"
            );
        }
    }

    #[test]
    fn test_url_layout() {
        let p = AzureOpenAiProvider::new(
            &config("https://example.openai.azure.com/"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            p.url(),
            "https://example.openai.azure.com/openai/deployments/tickets/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_complete_sends_api_key_and_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/tickets/chat/completions"))
            .and(query_param("api-version", "2024-02-15-preview"))
            .and(header("api-key", "az-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "{}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let p = AzureOpenAiProvider::new(&config(&server.uri()), Duration::from_secs(5)).unwrap();
        let response = p.complete(&request()).await.unwrap();
        assert_eq!(response.content, "{}");
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn test_auth_failure_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let p = AzureOpenAiProvider::new(&config(&server.uri()), Duration::from_secs(5)).unwrap();
        match p.complete(&request()).await.unwrap_err() {
            WardenError::Llm(llm) => {
                assert_eq!(llm.category, ErrorCategory::Auth);
                assert_eq!(llm.provider.as_deref(), Some("azure-openai"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
