//! Classification results and prompt-time advisories.

use crate::rules::{Enforcement, Priority};
use serde::{Deserialize, Serialize};

/// A rule that matched an input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Rule category.
    pub category: String,
    /// Rule priority.
    pub priority: Priority,
    /// Rule enforcement mode.
    pub enforcement: Enforcement,
    /// Distinct keyword hits plus distinct pattern hits.
    pub strength: usize,
    /// Keywords and pattern excerpts that matched.
    pub matched_terms: Vec<String>,
    /// Modules the rule recommends.
    pub recommended_modules: Vec<String>,
    /// Notes the rule carries.
    pub notes: Vec<String>,
}

/// Content of a non-empty advisory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryBody {
    /// Recommended modules, deduplicated, in match rank order.
    pub suggested_modules: Vec<String>,
    /// Notes, deduplicated, in match rank order.
    pub notes: Vec<String>,
    /// The ranked matches behind the advice.
    pub matches: Vec<MatchResult>,
}

/// Prompt-time advice for one instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Advisory {
    /// Nothing matched; the advisor stays silent.
    NoAdvisory,
    /// Modules worth loading.
    Suggestion(AdvisoryBody),
    /// At least one matched rule is enforced as blocking.
    Blocking(AdvisoryBody),
}

impl Advisory {
    /// Whether there is nothing to emit.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::NoAdvisory)
    }

    /// Whether the advisory blocks the instruction.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocking(_))
    }

    /// The advisory content, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&AdvisoryBody> {
        match self {
            Self::NoAdvisory => None,
            Self::Suggestion(body) | Self::Blocking(body) => Some(body),
        }
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoAdvisory => "none",
            Self::Suggestion(_) => "suggestion",
            Self::Blocking(_) => "blocking",
        }
    }
}
