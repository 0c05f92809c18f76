//! LLM client abstraction.
//!
//! Only the optional session narrator talks to an LLM. Nothing on the
//! classification or reconstruction path depends on this module.

mod anthropic;

pub use anthropic::AnthropicClient;

use crate::config::LlmConfig;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Trait for LLM providers.
pub trait LlmProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Generates a completion with a system prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    ///
    /// Default implementation concatenates system and user prompts.
    /// Providers should override this to use native system prompt support.
    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        let combined = format!("{system}\n\n---\n\nUser message:\n{user}");
        self.complete(&combined)
    }
}

/// HTTP client configuration for LLM providers.
#[derive(Debug, Clone, Copy)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Derives HTTP timeouts from the LLM settings.
    ///
    /// The request timeout tracks the narration budget so a slow provider
    /// releases its worker thread soon after the caller has given up.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        let defaults = Self::default();
        Self {
            timeout_ms: config.timeout_ms,
            connect_timeout_ms: defaults.connect_timeout_ms.min(config.timeout_ms),
        }
    }
}

/// Builds a blocking HTTP client for LLM requests with configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build LLM HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

/// Builds the configured provider, or `None` if the provider is unknown.
#[must_use]
pub fn build_provider(config: &LlmConfig) -> Option<Arc<dyn LlmProvider>> {
    match config.provider.as_str() {
        "anthropic" => {
            let mut client =
                AnthropicClient::new().with_http_config(LlmHttpConfig::from_config(config));
            if let Some(key) = &config.api_key {
                client = client.with_api_key(key.clone());
            }
            if let Some(model) = &config.model {
                client = client.with_model(model.clone());
            }
            if let Some(base_url) = &config.base_url {
                client = client.with_endpoint(base_url.clone());
            }
            Some(Arc::new(client))
        },
        other => {
            tracing::warn!(provider = other, "Unknown LLM provider; narration disabled");
            None
        },
    }
}

/// Escapes XML special characters so embedded content cannot close the
/// surrounding tags.
#[must_use]
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}
