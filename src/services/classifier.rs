//! Rule-based text classification.
//!
//! Scores every rule against one input text. A rule's strength is the number
//! of distinct keywords found as whole words plus the number of distinct
//! patterns that match. Results are ranked by priority, then strength, then
//! category name, so equal-priority ties never depend on catalog order.

use crate::models::MatchResult;
use crate::rules::{Rule, RuleSet};
use serde::{Deserialize, Serialize};

/// Default cap on the number of matches returned.
pub const DEFAULT_MAX_MATCHES: usize = 5;

/// Classifier tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Maximum matches kept after ranking; `0` keeps all of them.
    pub max_matches: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

impl ClassifierConfig {
    /// Sets the match cap.
    #[must_use]
    pub const fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches;
        self
    }
}

/// Classifies text against a borrowed rule set.
#[derive(Debug, Clone, Copy)]
pub struct TextClassifier<'a> {
    rules: &'a RuleSet,
    config: ClassifierConfig,
}

impl<'a> TextClassifier<'a> {
    /// Creates a classifier.
    #[must_use]
    pub const fn new(rules: &'a RuleSet, config: ClassifierConfig) -> Self {
        Self { rules, config }
    }

    /// Returns the ranked, capped list of matching rules.
    ///
    /// Calling this twice with the same text yields identical output.
    #[must_use]
    pub fn classify(&self, text: &str) -> Vec<MatchResult> {
        classify(text, self.rules, &self.config)
    }
}

/// Returns the ranked, capped list of rules matching `text`.
#[must_use]
pub fn classify(text: &str, rules: &RuleSet, config: &ClassifierConfig) -> Vec<MatchResult> {
    if text.trim().is_empty() || rules.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<MatchResult> = rules.iter().filter_map(|r| match_rule(r, text)).collect();

    matches.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.strength.cmp(&a.strength))
            .then_with(|| a.category.cmp(&b.category))
    });

    if config.max_matches > 0 && matches.len() > config.max_matches {
        for dropped in &matches[config.max_matches..] {
            tracing::debug!(category = %dropped.category, "Match dropped by cap");
        }
        matches.truncate(config.max_matches);
    }

    matches
}

/// Scores one rule against the text.
fn match_rule(rule: &Rule, text: &str) -> Option<MatchResult> {
    let mut matched_terms: Vec<String> = rule
        .keywords()
        .iter()
        .filter(|k| k.is_match(text))
        .map(|k| k.term().to_string())
        .collect();
    let keyword_hits = matched_terms.len();

    let mut pattern_hits = 0;
    for pattern in rule.patterns() {
        if let Some(found) = pattern.find(text) {
            pattern_hits += 1;
            let excerpt = found.as_str().trim().to_lowercase();
            if !excerpt.is_empty() && !matched_terms.contains(&excerpt) {
                matched_terms.push(excerpt);
            }
        }
    }

    let strength = keyword_hits + pattern_hits;
    if strength == 0 {
        return None;
    }

    tracing::debug!(
        category = rule.category(),
        strength,
        keyword_hits,
        pattern_hits,
        "Rule matched"
    );

    Some(MatchResult {
        category: rule.category().to_string(),
        priority: rule.priority(),
        enforcement: rule.enforcement(),
        strength,
        matched_terms,
        recommended_modules: rule.recommended_modules().to_vec(),
        notes: rule.notes().to_vec(),
    })
}
