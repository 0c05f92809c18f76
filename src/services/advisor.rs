//! Prompt-time advisor.
//!
//! Turns the classifier's ranked matches into a single advisory for the
//! current instruction. Zero matches yield [`Advisory::NoAdvisory`] so the
//! caller emits nothing at all.

use super::classifier::{ClassifierConfig, TextClassifier};
use crate::models::{Advisory, AdvisoryBody, MatchResult};
use crate::rules::{Enforcement, RuleSet};

/// Builds advisories from a rule set.
#[derive(Debug, Clone, Copy)]
pub struct PromptAdvisor<'a> {
    classifier: TextClassifier<'a>,
}

impl<'a> PromptAdvisor<'a> {
    /// Creates an advisor over `rules`.
    #[must_use]
    pub const fn new(rules: &'a RuleSet, config: ClassifierConfig) -> Self {
        Self {
            classifier: TextClassifier::new(rules, config),
        }
    }

    /// Advises on one instruction.
    #[must_use]
    pub fn advise(&self, prompt: &str) -> Advisory {
        let advisory = assemble(self.classifier.classify(prompt));
        metrics::counter!("hookwise_advisories_total", "kind" => advisory.kind()).increment(1);
        advisory
    }
}

/// Merges ranked matches into an advisory.
///
/// Modules and notes keep rank order and appear once each, even when several
/// matched rules share them.
#[must_use]
pub fn assemble(matches: Vec<MatchResult>) -> Advisory {
    if matches.is_empty() {
        return Advisory::NoAdvisory;
    }

    let mut body = AdvisoryBody::default();
    for m in &matches {
        for module in &m.recommended_modules {
            if !body.suggested_modules.contains(module) {
                body.suggested_modules.push(module.clone());
            }
        }
        for note in &m.notes {
            if !body.notes.contains(note) {
                body.notes.push(note.clone());
            }
        }
    }

    let blocking = matches.iter().any(|m| m.enforcement == Enforcement::Block);
    body.matches = matches;

    if blocking {
        Advisory::Blocking(body)
    } else {
        Advisory::Suggestion(body)
    }
}
