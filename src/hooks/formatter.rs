//! Response formatting for the prompt hook.
//!
//! Builds the human-readable advisory text and wraps it in the JSON shape
//! the host expects for suggestions and for blocking decisions.

use crate::models::{Advisory, AdvisoryBody};

/// Formats advisories for the host runtime.
pub struct AdvisoryFormatter;

impl AdvisoryFormatter {
    /// Builds the markdown context block for an advisory body.
    #[must_use]
    pub fn build_context_message(body: &AdvisoryBody) -> String {
        let mut lines = vec!["## Suggested modules\n".to_string()];

        let matched: Vec<String> = body
            .matches
            .iter()
            .map(|m| format!("`{}` ({})", m.category, m.priority))
            .collect();
        lines.push(format!("Detected task context: {}\n", matched.join(", ")));

        if !body.suggested_modules.is_empty() {
            lines.push("Consider loading:".to_string());
            for module in &body.suggested_modules {
                lines.push(format!("- {module}"));
            }
        }

        if !body.notes.is_empty() {
            if !body.suggested_modules.is_empty() {
                lines.push(String::new());
            }
            lines.push("Notes:".to_string());
            for note in &body.notes {
                lines.push(format!("- {note}"));
            }
        }

        lines.join("\n")
    }

    /// Builds the reason shown to the user when a prompt is blocked.
    #[must_use]
    pub fn build_block_reason(body: &AdvisoryBody) -> String {
        let blocking: Vec<&str> = body
            .matches
            .iter()
            .filter(|m| m.enforcement == crate::rules::Enforcement::Block)
            .map(|m| m.category.as_str())
            .collect();

        let mut reason = format!("Blocked by rule: {}.", blocking.join(", "));
        if !body.suggested_modules.is_empty() {
            reason.push_str(&format!(
                " Load these modules first: {}.",
                body.suggested_modules.join(", ")
            ));
        }
        for note in &body.notes {
            reason.push_str(&format!("\n- {note}"));
        }
        reason
    }

    /// Builds the hook response JSON, or `None` for a silent advisory.
    #[must_use]
    pub fn build_hook_response(advisory: &Advisory) -> Option<serde_json::Value> {
        match advisory {
            Advisory::NoAdvisory => None,
            Advisory::Suggestion(body) => {
                let categories: Vec<&str> =
                    body.matches.iter().map(|m| m.category.as_str()).collect();
                let metadata = serde_json::json!({ "categories": categories });
                let context = format!(
                    "{}\n\n<!-- hookwise-metadata: {metadata} -->",
                    Self::build_context_message(body)
                );
                Some(serde_json::json!({
                    "hookSpecificOutput": {
                        "hookEventName": "UserPromptSubmit",
                        "additionalContext": context
                    }
                }))
            },
            Advisory::Blocking(body) => Some(serde_json::json!({
                "decision": "block",
                "reason": Self::build_block_reason(body)
            })),
        }
    }
}
