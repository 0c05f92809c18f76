//! Rule catalog documents.
//!
//! A catalog maps category names to rule entries:
//!
//! ```yaml
//! frontend-forms:
//!   keywords: [form, input, validation]
//!   patterns: ['\b(create|add|build)\b.*\bform\b']
//!   priority: high
//!   enforcement: suggest
//!   notes: ["Reuse the shared field components"]
//!   recommendedModules: [frontend-dev-guidelines]
//! ```
//!
//! The map may also be nested under a top-level `rules` or `skills` key
//! (when that key is the only category-like entry), and entries may carry their triggers under `promptTriggers`
//! (`keywords` / `intentPatterns`).

use super::rule::RuleDraft;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Serialization format of a catalog document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// YAML document.
    Yaml,
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

impl CatalogFormat {
    /// Picks a format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

/// Trigger block used by skill-style catalogs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptTriggers {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    intent_patterns: Vec<String>,
}

/// One catalog entry as written.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleEntry {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default, alias = "intentPatterns")]
    patterns: Vec<String>,
    #[serde(default)]
    prompt_triggers: Option<PromptTriggers>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    enforcement: Option<String>,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(default, alias = "recommended_modules")]
    recommended_modules: Vec<String>,
}

impl RuleEntry {
    fn into_draft(self, category: &str) -> RuleDraft {
        let mut keywords = self.keywords;
        let mut patterns = self.patterns;
        if let Some(triggers) = self.prompt_triggers {
            keywords.extend(triggers.keywords);
            patterns.extend(triggers.intent_patterns);
        }
        RuleDraft {
            category: category.to_string(),
            keywords,
            patterns,
            priority: self.priority,
            enforcement: self.enforcement,
            notes: self.notes,
            recommended_modules: self.recommended_modules,
        }
    }
}

/// Parses catalog text into per-category drafts.
///
/// The outer result fails only when the document is not structured data or
/// is not a mapping. Entries that cannot be deserialized come back as
/// per-entry [`Error::MalformedRule`] values so the caller can skip them.
///
/// Drafts are returned in category order.
///
/// # Errors
///
/// Returns [`Error::CatalogUnreadable`] if the document cannot be parsed.
pub fn parse_catalog(
    content: &str,
    format: Option<CatalogFormat>,
    source_name: &str,
) -> Result<Vec<Result<RuleDraft>>> {
    let document = parse_document(content, format, source_name)?;

    let Value::Object(mut map) = document else {
        return Err(unreadable(source_name, "top-level value is not a mapping"));
    };

    if let Some(inner) = take_wrapped_catalog(&mut map) {
        map = inner;
    }

    Ok(map
        .into_iter()
        .filter(|(key, value)| {
            let metadata = is_metadata(key, value);
            if metadata {
                tracing::debug!(source = source_name, key = %key, "Skipping catalog metadata");
            }
            !metadata
        })
        .map(|(category, value)| {
            serde_json::from_value::<RuleEntry>(value)
                .map(|entry| entry.into_draft(&category))
                .map_err(|e| Error::MalformedRule {
                    category,
                    reason: e.to_string(),
                })
        })
        .collect())
}

/// Top-level keys that may hold the real category map.
const WRAPPER_KEYS: [&str; 2] = ["rules", "skills"];

/// Keys a rule entry understands; a wrapper never holds these directly.
const ENTRY_FIELDS: [&str; 9] = [
    "keywords",
    "patterns",
    "intentPatterns",
    "promptTriggers",
    "priority",
    "enforcement",
    "notes",
    "recommendedModules",
    "recommended_modules",
];

/// A `version` or `description` key with a scalar value describes the
/// catalog itself. The same key holding a mapping is an ordinary category.
fn is_metadata(key: &str, value: &Value) -> bool {
    matches!(key, "version" | "description") && !value.is_object()
}

/// Removes and returns the category map nested under `rules` or `skills`.
///
/// The document counts as wrapped only when the wrapper is its sole
/// non-metadata key, holds only mappings and has no rule fields of its
/// own. Anything else is a flat catalog where `rules` or `skills`
/// is just a category name.
fn take_wrapped_catalog(map: &mut Map<String, Value>) -> Option<Map<String, Value>> {
    let mut categories = map.iter().filter(|(key, value)| !is_metadata(key, value));
    let (key, Value::Object(inner)) = categories.next()? else {
        return None;
    };
    if categories.next().is_some() || !WRAPPER_KEYS.contains(&key.as_str()) {
        return None;
    }
    let nested = inner.values().all(Value::is_object)
        && !inner.keys().any(|field| ENTRY_FIELDS.contains(&field.as_str()));
    if !nested {
        return None;
    }

    let key = key.clone();
    match map.remove(&key) {
        Some(Value::Object(inner)) => Some(inner),
        _ => None,
    }
}

/// Parses a document in the given (or sniffed) format into a JSON value.
fn parse_document(
    content: &str,
    format: Option<CatalogFormat>,
    source_name: &str,
) -> Result<Value> {
    let format = format.unwrap_or_else(|| sniff_format(content));
    tracing::debug!(source = source_name, format = format.as_str(), "Parsing rule catalog");

    match format {
        CatalogFormat::Json => serde_json::from_str(content)
            .map_err(|e| unreadable(source_name, &format!("invalid JSON: {e}"))),
        CatalogFormat::Yaml => serde_yaml_ng::from_str(content)
            .map_err(|e| unreadable(source_name, &format!("invalid YAML: {e}"))),
        CatalogFormat::Toml => toml::from_str(content)
            .map_err(|e| unreadable(source_name, &format!("invalid TOML: {e}"))),
    }
}

/// Guesses the format of extension-less content.
fn sniff_format(content: &str) -> CatalogFormat {
    let trimmed = content.trim_start();
    if trimmed.starts_with('{') {
        return CatalogFormat::Json;
    }
    if trimmed.starts_with('[') && toml::from_str::<toml::Table>(content).is_ok() {
        return CatalogFormat::Toml;
    }
    CatalogFormat::Yaml
}

fn unreadable(source_name: &str, cause: &str) -> Error {
    Error::CatalogUnreadable {
        source_name: source_name.to_string(),
        cause: cause.to_string(),
    }
}
