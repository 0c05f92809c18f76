//! Anthropic Messages API client.
//!
//! Used only for narration, so requests are single-turn with a short reply
//! budget and a fixed temperature.

use super::{LlmHttpConfig, LlmProvider, build_http_client};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "2023-06-01";
const KEY_PREFIX: &str = "sk-ant-";
const MIN_KEY_LEN: usize = 40;

/// Blocking client for the Anthropic Messages API.
pub struct AnthropicClient {
    api_key: Option<String>,
    endpoint: String,
    model: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl AnthropicClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.anthropic.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "claude-3-5-haiku-latest";

    /// Default reply budget; narratives are a few sentences.
    pub const DEFAULT_MAX_TOKENS: u32 = 400;

    /// Creates a client with no key and default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: None,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the reply token budget.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Replaces the HTTP client with one using `config` timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// Returns the key, refusing to send an obviously malformed one.
    fn credentials(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            None => Err(failure("anthropic_request", "no API key configured")),
            Some(key) if !looks_like_api_key(key) => Err(failure(
                "anthropic_request",
                "API key is not in the expected sk-ant- format",
            )),
            Some(key) => Ok(key),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.endpoint)
    }

    fn send(&self, body: &MessagesRequest<'_>) -> Result<String> {
        let api_key = self.credentials()?;
        tracing::debug!(provider = "anthropic", model = %self.model, "Sending narration request");

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .map_err(|e| {
                let kind = send_error_kind(&e);
                tracing::warn!(provider = "anthropic", error_kind = kind, error = %e, "LLM request failed");
                failure("anthropic_request", format!("{kind} error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorResponse>()
                .map(|r| r.error.message)
                .unwrap_or_default();
            tracing::warn!(provider = "anthropic", status = %status, "LLM API returned error status");
            return Err(failure("anthropic_request", format!("status {status}: {detail}")));
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|e| failure("anthropic_response", e.to_string()))?;
        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            tracing::debug!("Narration reply hit the token budget");
        }
        parsed
            .joined_text()
            .ok_or_else(|| failure("anthropic_response", "reply had no text content"))
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.send(&MessagesRequest::new(self, None, prompt))
    }

    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        self.send(&MessagesRequest::new(self, Some(system), user))
    }
}

/// Anthropic keys look like `sk-ant-api03-...`: the prefix, at least 40
/// characters, and only ASCII alphanumerics, `-` and `_`.
fn looks_like_api_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX)
        && key.len() >= MIN_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn send_error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    }
}

fn failure(operation: &str, cause: impl Into<String>) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: cause.into(),
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [UserTurn<'a>; 1],
}

impl<'a> MessagesRequest<'a> {
    fn new(client: &'a AnthropicClient, system: Option<&'a str>, user: &'a str) -> Self {
        Self {
            model: &client.model,
            max_tokens: client.max_tokens,
            temperature: 0.0,
            system,
            messages: [UserTurn {
                role: "user",
                content: user,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

impl MessagesResponse {
    fn joined_text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const VALID_KEY: &str = "sk-ant-REDACTED";

    #[test]
    fn test_builder() {
        let client = AnthropicClient::new()
            .with_api_key(VALID_KEY)
            .with_endpoint("https://proxy.internal/v1/")
            .with_model("claude-3-opus-20240229")
            .with_max_tokens(64);

        assert_eq!(client.name(), "anthropic");
        assert_eq!(client.messages_url(), "https://proxy.internal/v1/messages");
        assert_eq!(client.model, "claude-3-opus-20240229");
        assert_eq!(client.max_tokens, 64);
        assert_eq!(client.credentials().unwrap(), VALID_KEY);
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let client = AnthropicClient::new();
        assert!(client.credentials().is_err());
        assert!(client.complete("hi").is_err());
    }

    #[test_case(VALID_KEY, true ; "standard key")]
    #[test_case("sk-ant-REDACTED", true ; "underscore")]
    #[test_case("", false ; "empty")]
    #[test_case("sk-ant-", false ; "prefix only")]
    #[test_case("sk-other-api03-ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789", false ; "wrong prefix")]
    #[test_case("sk-ant-REDACTED!@#$", false ; "symbols")]
    #[test_case("sk-ant-REDACTED\n", false ; "newline")]
    fn test_key_format(key: &str, valid: bool) {
        assert_eq!(looks_like_api_key(key), valid);
    }

    #[test]
    fn test_request_shape() {
        let client = AnthropicClient::new();
        let json = serde_json::to_value(MessagesRequest::new(&client, None, "hello")).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["max_tokens"], AnthropicClient::DEFAULT_MAX_TOKENS);

        let json =
            serde_json::to_value(MessagesRequest::new(&client, Some("be brief"), "hello")).unwrap();
        assert_eq!(json["system"], "be brief");
    }

    #[test]
    fn test_response_text_skips_non_text_blocks() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Hello "},{"type":"tool_use","id":"x"},{"type":"text","text":"world"}],"stop_reason":"end_turn"}"#,
        )
        .unwrap();
        assert_eq!(response.joined_text().as_deref(), Some("Hello world"));

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(empty.joined_text().is_none());
    }
}
