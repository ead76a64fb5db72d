//! Chat Completions wire format shared by the OpenAI and Azure providers.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{ChatRequest, LlmResponse, ResponseMetadata, ResponseTiming, TokenUsage};
use crate::constants::network as net_constants;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, WardenError};

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

pub(super) fn build_client(timeout: Duration, provider: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS))
        .build()
        .map_err(|e| {
            WardenError::Config(format!("Failed to create HTTP client for {}: {}", provider, e))
        })
}

/// Validate a configured endpoint and return it without a trailing slash
pub(super) fn normalize_endpoint(raw: &str, setting: &str) -> Result<String> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| WardenError::Config(format!("Invalid {} '{}': {}", setting, raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(WardenError::Config(format!(
            "Invalid {} '{}': scheme must be http or https",
            setting, raw
        )));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

pub(super) fn request_body(model: Option<&str>, request: &ChatRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.map(str::to_string),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: request.user.clone(),
            },
        ],
        temperature: request.params.temperature,
        max_tokens: Some(request.params.max_tokens),
        response_format: request.json_mode.then(|| ResponseFormat {
            format_type: "json_object".to_string(),
        }),
    }
}

/// Send a prepared request and turn the reply into an [`LlmResponse`]
pub(super) async fn send(
    builder: reqwest::RequestBuilder,
    body: &ChatCompletionRequest,
    provider: &str,
    model: &str,
) -> Result<LlmResponse> {
    let start_time = Instant::now();

    let response = builder
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let snippet: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return Err(ErrorClassifier::classify_http_status(
            status.as_u16(),
            &format!("{} API error ({}): {}", provider, status, snippet),
            provider,
        )
        .into());
    }

    let response_body: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

    let elapsed = start_time.elapsed();
    let usage = response_body
        .usage
        .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens));

    let content = response_body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                "No content in chat completion response",
                provider,
            )
        })?;

    debug!(
        provider,
        elapsed_ms = elapsed.as_millis() as u64,
        "Received chat completion"
    );

    Ok(LlmResponse {
        content,
        usage,
        timing: ResponseTiming::from_duration(elapsed),
        metadata: ResponseMetadata {
            model: model.to_string(),
            provider: provider.to_string(),
        },
    })
}

// Request/Response types

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequest {
    /// Azure selects the model by deployment and omits this field
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationParams;

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
    fn test_request_body_shape() {
        let body = serde_json::to_value(request_body(Some("gpt-4"), &request())).unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_request_body_without_model() {
        let mut req = request();
        req.json_mode = false;
        let body = serde_json::to_value(request_body(None, &req)).unwrap();
        assert!(body.get("model").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("https://example.openai.azure.com/", "endpoint").unwrap(),
            "https://example.openai.azure.com"
        );
        assert!(normalize_endpoint("not a url", "endpoint").is_err());
        assert!(normalize_endpoint("ftp://example.com", "endpoint").is_err());
    }
}
