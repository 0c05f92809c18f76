//! # Hookwise
//!
//! Session intelligence hooks for AI coding assistants.
//!
//! Hookwise runs inside the host runtime's hook framework and does two things:
//!
//! - On every submitted instruction it classifies the text against a rule
//!   catalog and recommends knowledge modules (the prompt-time advisory).
//! - At session end it folds the session's event stream into a timeline and
//!   renders a structured record plus a human-readable report.
//!
//! Both paths are deterministic keyword/regex matching. Optional LLM
//! narration of the summary runs behind a timeout and never blocks the
//! deterministic output.
//!
//! ## Example
//!
//! ```rust
//! use hookwise::rules::RuleSet;
//! use hookwise::services::{ClassifierConfig, PromptAdvisor};
//!
//! let (rules, _report) = RuleSet::builtin();
//! let advisor = PromptAdvisor::new(&rules, ClassifierConfig::default());
//! let advisory = advisor.advise("add a login form with validation");
//! assert!(!advisory.is_silent());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod hooks;
pub mod llm;
pub mod models;
pub mod observability;
pub mod rules;
pub mod services;

pub use config::{FeatureFlags, HookwiseConfig};
pub use models::{
    Advisory, AdvisoryBody, Event, EventKind, FileOperation, MatchResult, SessionSummary,
    SessionTimeline,
};
pub use rules::{Enforcement, LoadReport, Priority, Rule, RuleSet};
pub use services::{PromptAdvisor, SessionStore, SummaryRenderer, TextClassifier, reconstruct};

/// Error type for hookwise operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Hook input or CLI arguments cannot be interpreted |
/// | `OperationFailed` | I/O, serialization or HTTP failures |
/// | `CatalogUnreadable` | The rule catalog cannot be read or is not structured data |
/// | `MalformedRule` | A single catalog entry fails validation (recovered by the loader) |
/// | `OutOfOrderEvent` | Session events arrive with a decreasing sequence index |
/// | `SummaryAlreadyWritten` | A session summary already exists for the session id |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The rule catalog could not be read or parsed as structured data.
    ///
    /// Fatal to one load attempt. Callers degrade to an empty rule set.
    #[error("rule catalog '{source_name}' unreadable: {cause}")]
    CatalogUnreadable {
        /// Path or label of the catalog source.
        source_name: String,
        /// The underlying cause.
        cause: String,
    },

    /// A single rule failed validation.
    #[error("malformed rule '{category}': {reason}")]
    MalformedRule {
        /// Category of the rejected rule (may be empty).
        category: String,
        /// Why the rule was rejected.
        reason: String,
    },

    /// An event arrived with a sequence index lower than its predecessor.
    #[error("out-of-order event: sequence {found} follows {previous}")]
    OutOfOrderEvent {
        /// Index of the preceding event.
        previous: u64,
        /// Offending index.
        found: u64,
    },

    /// Summary artifacts already exist for this session.
    #[error("summary already written for session '{session_id}'")]
    SummaryAlreadyWritten {
        /// Host-supplied session identifier.
        session_id: String,
    },
}

/// Result type alias for hookwise operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::OutOfOrderEvent {
            previous: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "out-of-order event: sequence 2 follows 3");

        let err = Error::MalformedRule {
            category: "forms".to_string(),
            reason: "no keywords or patterns".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed rule 'forms': no keywords or patterns"
        );
    }
}
