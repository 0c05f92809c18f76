//! Compiled rule definitions.

use crate::{Error, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on compiled regex size for catalog-supplied patterns.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Priority tier of a rule.
///
/// Ordering follows severity: `Critical > High > Medium > Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Background guidance.
    Low,
    /// Regular guidance.
    #[default]
    Medium,
    /// Important guidance.
    High,
    /// Must-see guidance.
    Critical,
}

impl Priority {
    /// Parses a priority tag (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the advisor does when a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    /// Surface the rule's modules as suggestions.
    #[default]
    Suggest,
    /// Flag the advisory as blocking.
    Block,
}

impl Enforcement {
    /// Parses an enforcement tag (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "suggest" => Some(Self::Suggest),
            "block" => Some(Self::Block),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Suggest => "suggest",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for Enforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A keyword with its word-boundary matcher.
#[derive(Debug, Clone)]
pub struct Keyword {
    term: String,
    matcher: Regex,
}

impl Keyword {
    /// Compiles a keyword into a case-insensitive, word-boundary aware matcher.
    ///
    /// Boundaries are non-word characters or the ends of the text, so keywords
    /// such as `c++` or `.env` still match on their own. Internal whitespace in
    /// multi-word keywords matches any run of whitespace.
    fn compile(term: &str) -> Result<Self> {
        let body = term
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let pattern = format!(r"(?i)(?:^|\W){body}(?:\W|$)");
        let matcher = Regex::new(&pattern).map_err(|e| Error::MalformedRule {
            category: String::new(),
            reason: format!("keyword '{term}' failed to compile: {e}"),
        })?;
        Ok(Self {
            term: term.to_string(),
            matcher,
        })
    }

    /// The normalized (lowercase) keyword.
    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Whether the keyword occurs in `text` as a whole word.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Uncompiled rule fields, as read from a catalog entry.
#[derive(Debug, Clone, Default)]
pub struct RuleDraft {
    /// Category name.
    pub category: String,
    /// Raw keywords.
    pub keywords: Vec<String>,
    /// Raw regex sources.
    pub patterns: Vec<String>,
    /// Priority tag as written in the catalog.
    pub priority: Option<String>,
    /// Enforcement tag as written in the catalog.
    pub enforcement: Option<String>,
    /// Free-text notes.
    pub notes: Vec<String>,
    /// Modules recommended when the rule matches.
    pub recommended_modules: Vec<String>,
}

/// An immutable, validated classification rule.
#[derive(Debug, Clone)]
pub struct Rule {
    category: String,
    keywords: Vec<Keyword>,
    patterns: Vec<Regex>,
    priority: Priority,
    enforcement: Enforcement,
    notes: Vec<String>,
    recommended_modules: Vec<String>,
}

impl Rule {
    /// Validates and compiles a draft.
    ///
    /// Keywords are trimmed, lowercased and deduplicated. A rule without a
    /// category, without any keyword or pattern, with an unknown priority or
    /// enforcement tag, or with a pattern that does not compile is rejected.
    /// A missing enforcement tag means [`Enforcement::Suggest`]. A rule with no
    /// recommended modules recommends its own category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRule`] describing the first problem found.
    pub fn compile(draft: RuleDraft) -> Result<Self> {
        let category = draft.category.trim().to_string();
        let malformed = |reason: String| Error::MalformedRule {
            category: category.clone(),
            reason,
        };

        if category.is_empty() {
            return Err(malformed("empty category".to_string()));
        }

        let priority = match draft.priority.as_deref() {
            Some(tag) => {
                Priority::parse(tag).ok_or_else(|| malformed(format!("invalid priority '{tag}'")))?
            },
            None => return Err(malformed("missing priority".to_string())),
        };

        let enforcement = match draft.enforcement.as_deref() {
            Some(tag) => Enforcement::parse(tag)
                .ok_or_else(|| malformed(format!("invalid enforcement '{tag}'")))?,
            None => Enforcement::Suggest,
        };

        let mut terms: Vec<String> = draft
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        terms.sort();
        terms.dedup();

        let keywords = terms
            .iter()
            .map(|t| Keyword::compile(t))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| match e {
                Error::MalformedRule { reason, .. } => malformed(reason),
                other => other,
            })?;

        let mut patterns = Vec::with_capacity(draft.patterns.len());
        for source in draft.patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let regex = RegexBuilder::new(source)
                .case_insensitive(true)
                .size_limit(PATTERN_SIZE_LIMIT)
                .build()
                .map_err(|e| malformed(format!("pattern '{source}' failed to compile: {e}")))?;
            patterns.push(regex);
        }

        if keywords.is_empty() && patterns.is_empty() {
            return Err(malformed("no keywords or patterns".to_string()));
        }

        let notes = dedup_preserving_order(draft.notes);
        let mut recommended_modules = dedup_preserving_order(draft.recommended_modules);
        if recommended_modules.is_empty() {
            recommended_modules.push(category.clone());
        }

        Ok(Self {
            category,
            keywords,
            patterns,
            priority,
            enforcement,
            notes,
            recommended_modules,
        })
    }

    /// The unique category name.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Compiled keywords, sorted by term.
    #[must_use]
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Compiled regex patterns, in catalog order.
    #[must_use]
    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// Priority tier.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Enforcement mode.
    #[must_use]
    pub const fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    /// Notes surfaced when the rule matches.
    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Modules recommended when the rule matches.
    #[must_use]
    pub fn recommended_modules(&self) -> &[String] {
        &self.recommended_modules
    }
}

/// Trims entries, drops empty ones and removes later duplicates.
fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
