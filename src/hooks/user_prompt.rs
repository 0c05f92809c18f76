//! User prompt submit hook handler.

use super::{AdvisoryFormatter, HookHandler};
use crate::models::Advisory;
use crate::rules::RuleSet;
use crate::services::{ClassifierConfig, PromptAdvisor};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Handles `UserPromptSubmit` hook events.
///
/// Classifies the submitted prompt and answers with an advisory, or with
/// nothing when no rule matched.
pub struct UserPromptHandler {
    rules: Arc<RuleSet>,
    config: ClassifierConfig,
}

impl UserPromptHandler {
    /// Creates a new handler over a loaded rule set.
    #[must_use]
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            config: ClassifierConfig::default(),
        }
    }

    /// Sets the classifier configuration.
    #[must_use]
    pub const fn with_classifier_config(mut self, config: ClassifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Produces the advisory for a prompt.
    #[must_use]
    pub fn advise(&self, prompt: &str) -> Advisory {
        PromptAdvisor::new(&self.rules, self.config).advise(prompt)
    }
}

/// Pulls the prompt out of the hook input.
///
/// The host sends `{"prompt": "..."}`; anything that is not a JSON object
/// is taken as the prompt text itself.
fn extract_prompt(input: &str) -> Result<String> {
    if !input.trim_start().starts_with('{') {
        return Ok(input.to_string());
    }
    let value: serde_json::Value = serde_json::from_str(input).map_err(|e| {
        Error::InvalidInput(format!("prompt hook input is not valid JSON: {e}"))
    })?;
    Ok(value
        .get("prompt")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string())
}

impl HookHandler for UserPromptHandler {
    fn event_type(&self) -> &'static str {
        "UserPromptSubmit"
    }

    #[instrument(skip(self, input), fields(hook = "UserPromptSubmit", kind = tracing::field::Empty))]
    fn handle(&self, input: &str) -> Result<Option<String>> {
        let prompt = extract_prompt(input)?;
        let advisory = self.advise(&prompt);
        tracing::Span::current().record("kind", advisory.kind());

        let Some(response) = AdvisoryFormatter::build_hook_response(&advisory) else {
            tracing::debug!("No rule matched; staying silent");
            return Ok(None);
        };

        if let Some(body) = advisory.body() {
            tracing::info!(
                kind = advisory.kind(),
                matches = body.matches.len(),
                modules = body.suggested_modules.len(),
                "Advisory produced"
            );
        }

        serde_json::to_string(&response)
            .map(Some)
            .map_err(|e| Error::OperationFailed {
                operation: "serialize_response".to_string(),
                cause: e.to_string(),
            })
    }
}
