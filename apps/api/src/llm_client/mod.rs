/// LLM Client — the single point of entry for all text-understanding calls.
///
/// No other module may call the Anthropic API directly. The client performs
/// exactly one HTTP request per call; retry policy belongs to the caller.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::mood::error::AnalysisError;

pub mod prompts;

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 256;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Anthropic API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl From<LlmError> for AnalysisError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => {
                AnalysisError::configuration("Anthropic API key is not configured")
            }
            LlmError::Http(e) => AnalysisError::from_transport(e),
            LlmError::Api { status, message } => AnalysisError::from_status(status, message),
            LlmError::Parse(e) => {
                AnalysisError::malformed("LLM reply did not match the expected shape")
                    .with_source(e)
            }
            LlmError::EmptyContent => AnalysisError::empty_response("LLM returned empty content"),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first non-blank text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .find(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Connection settings for the text-understanding service.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Wraps the Anthropic Messages API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Makes a single call to the Messages API and returns the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let request_body = AnthropicRequest {
            model: &self.settings.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}", status);
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        let llm_response: LlmResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        Ok(llm_response)
    }

    /// Calls the LLM and returns the reply text with any code fences removed.
    pub async fn call_text(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(strip_json_fences(text).to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::error::AnalysisErrorKind;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer, key: Option<&str>) -> LlmSettings {
        LlmSettings {
            api_key: key.map(String::from),
            api_url: format!("{}/v1/messages", server.uri()),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = LlmClient::new(settings_for(&server, None)).unwrap();
        let err = client.call("hi", "sys").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_sends_key_and_version_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "secret"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "hello"}],
                "usage": {"input_tokens": 3, "output_tokens": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(settings_for(&server, Some("secret"))).unwrap();
        let text = client.call_text("hi", "sys").await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(settings_for(&server, Some("bad"))).unwrap();
        let err: AnalysisError = client.call("hi", "sys").await.unwrap_err().into();
        assert_eq!(err.kind(), AnalysisErrorKind::Authorization);
        assert!(!err.is_retryable());
        assert_eq!(err.message(), "invalid x-api-key");
    }

    #[tokio::test]
    async fn test_server_error_is_single_attempt_and_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(settings_for(&server, Some("k"))).unwrap();
        let err: AnalysisError = client.call("hi", "sys").await.unwrap_err().into();
        assert_eq!(err.kind(), AnalysisErrorKind::Service);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_blank_body_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let client = LlmClient::new(settings_for(&server, Some("k"))).unwrap();
        let err: AnalysisError = client.call("hi", "sys").await.unwrap_err().into();
        assert_eq!(err.kind(), AnalysisErrorKind::EmptyResponse);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connectivity() {
        let settings = LlmSettings {
            api_key: Some("k".to_string()),
            api_url: "http://127.0.0.1:9/v1/messages".to_string(),
            model: "m".to_string(),
            timeout: Duration::from_secs(2),
        };
        let client = LlmClient::new(settings).unwrap();
        let err: AnalysisError = client.call("hi", "sys").await.unwrap_err().into();
        assert_eq!(err.kind(), AnalysisErrorKind::Connectivity);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_reply_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "content": [{"type": "text", "text": "late"}]
                    }))
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let settings = LlmSettings {
            timeout: Duration::from_millis(200),
            ..settings_for(&server, Some("k"))
        };
        let client = LlmClient::new(settings).unwrap();
        let err: AnalysisError = client.call("hi", "sys").await.unwrap_err().into();
        assert_eq!(err.kind(), AnalysisErrorKind::Timeout);
        assert!(err.is_retryable());
    }
}
