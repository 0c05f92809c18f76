//! Rule catalog loading and validation.
//!
//! The [`RuleSet`] is built once per process and never mutated afterwards.
//! Loading is partial-failure tolerant: entries that fail validation are
//! skipped and recorded in the [`LoadReport`], while an unreadable or
//! unparseable document fails the whole load with
//! [`Error::CatalogUnreadable`](crate::Error::CatalogUnreadable).

mod catalog;
mod rule;

pub use catalog::{CatalogFormat, parse_catalog};
pub use rule::{Enforcement, Keyword, Priority, Rule, RuleDraft};

use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Source label used for the compiled-in catalog.
pub const BUILTIN_SOURCE: &str = "builtin";

const BUILTIN_CATALOG: &str = include_str!("../../rules/builtin.yaml");

/// A rule that was rejected during loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleWarning {
    /// Category of the rejected entry.
    pub category: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Outcome of a catalog load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Path or label of the catalog.
    pub source: String,
    /// Number of rules accepted.
    pub loaded: usize,
    /// Rejected entries, in category order.
    pub warnings: Vec<RuleWarning>,
}

impl LoadReport {
    /// Whether every entry was accepted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// An immutable, category-unique collection of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set with no rules.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Builds a rule set from already compiled rules.
    ///
    /// Later rules whose category duplicates an earlier one are dropped and
    /// reported.
    #[must_use]
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> (Self, Vec<RuleWarning>) {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut warnings = Vec::new();

        for rule in rules {
            if seen.insert(rule.category().to_string()) {
                accepted.push(rule);
            } else {
                warnings.push(RuleWarning {
                    category: rule.category().to_string(),
                    reason: "duplicate category".to_string(),
                });
            }
        }

        accepted.sort_by(|a, b| a.category().cmp(b.category()));
        (Self { rules: accepted }, warnings)
    }

    /// Loads a catalog file.
    ///
    /// The format is taken from the file extension, or sniffed from the
    /// content when the extension is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CatalogUnreadable`] if the file cannot be read or is
    /// not a structured mapping. Invalid individual rules never fail the load.
    pub fn load(path: &Path) -> Result<(Self, LoadReport)> {
        let source_name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| Error::CatalogUnreadable {
            source_name: source_name.clone(),
            cause: e.to_string(),
        })?;
        Self::parse(&content, CatalogFormat::from_path(path), &source_name)
    }

    /// Parses catalog text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CatalogUnreadable`] if the text is not a structured
    /// mapping.
    pub fn parse(
        content: &str,
        format: Option<CatalogFormat>,
        source_name: &str,
    ) -> Result<(Self, LoadReport)> {
        let drafts = parse_catalog(content, format, source_name)?;

        let mut warnings = Vec::new();
        let mut compiled = Vec::with_capacity(drafts.len());
        for draft in drafts {
            match draft.and_then(Rule::compile) {
                Ok(rule) => compiled.push(rule),
                Err(Error::MalformedRule { category, reason }) => {
                    tracing::warn!(
                        source = source_name,
                        category = %category,
                        reason = %reason,
                        "Skipping malformed rule"
                    );
                    metrics::counter!("hookwise_rules_skipped_total").increment(1);
                    warnings.push(RuleWarning { category, reason });
                },
                Err(other) => return Err(other),
            }
        }

        let (set, duplicates) = Self::from_rules(compiled);
        for warning in &duplicates {
            tracing::warn!(
                source = source_name,
                category = %warning.category,
                "Skipping rule with duplicate category"
            );
        }
        warnings.extend(duplicates);

        let report = LoadReport {
            source: source_name.to_string(),
            loaded: set.len(),
            warnings,
        };
        tracing::debug!(
            source = source_name,
            loaded = report.loaded,
            skipped = report.warnings.len(),
            "Rule catalog loaded"
        );
        Ok((set, report))
    }

    /// Loads the compiled-in catalog.
    ///
    /// Falls back to an empty set if the embedded document is unreadable.
    #[must_use]
    pub fn builtin() -> (Self, LoadReport) {
        Self::parse(BUILTIN_CATALOG, Some(CatalogFormat::Yaml), BUILTIN_SOURCE).unwrap_or_else(
            |e| {
                tracing::error!(error = %e, "Built-in rule catalog unreadable");
                (
                    Self::empty(),
                    LoadReport {
                        source: BUILTIN_SOURCE.to_string(),
                        ..Default::default()
                    },
                )
            },
        )
    }

    /// Loads `path` if given, otherwise the built-in catalog.
    ///
    /// An unreadable catalog degrades to an empty set: the advisor then stays
    /// silent while session summaries still work.
    #[must_use]
    pub fn load_or_empty(path: Option<&Path>) -> (Self, LoadReport) {
        let Some(path) = path else {
            return Self::builtin();
        };
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Rule catalog unavailable, continuing without rules");
            (
                Self::empty(),
                LoadReport {
                    source: path.display().to_string(),
                    ..Default::default()
                },
            )
        })
    }

    /// Looks up a rule by category.
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&Rule> {
        self.rules
            .binary_search_by(|r| r.category().cmp(category))
            .ok()
            .map(|idx| &self.rules[idx])
    }

    /// Iterates rules in category order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
