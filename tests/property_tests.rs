//! Property-based tests for classification and timeline reconstruction.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Classification is deterministic and respects the match cap
//! - Prompts matching nothing never produce an advisory
//! - Reconstruction is deterministic and accumulates file operations as sets
//! - Decreasing sequence indices always fail reconstruction

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use hookwise::Error;
use hookwise::models::{Advisory, Event, FileOperation};
use hookwise::rules::RuleSet;
use hookwise::services::{ClassifierConfig, PromptAdvisor, classify, reconstruct};
use proptest::prelude::*;

fn builtin() -> RuleSet {
    RuleSet::builtin().0
}

fn operation() -> impl Strategy<Value = FileOperation> {
    prop::sample::select(vec![FileOperation::Read, FileOperation::Write, FileOperation::Edit])
}

/// Builds a well-ordered event stream from generated steps.
fn events_from(steps: &[(u8, String, FileOperation)]) -> Vec<Event> {
    let mut events = Vec::new();
    let mut sequence = 0u64;
    for (kind, text, op) in steps {
        sequence += 1;
        match kind % 4 {
            0 => events.push(Event::user_message(sequence, text.clone())),
            1 => events.push(Event::file_tool(sequence, "Write", format!("{text}.rs"), *op)),
            2 => events.push(Event::command(sequence, "Bash", text.clone())),
            _ => events.push(Event::failure(sequence, Some(sequence.saturating_sub(1)), text.clone())),
        }
    }
    events
}

proptest! {
    /// Property: classification returns the same ordered matches every time.
    #[test]
    fn prop_classify_is_deterministic(text in ".{0,200}") {
        let rules = builtin();
        let config = ClassifierConfig::default();
        prop_assert_eq!(classify(&text, &rules, &config), classify(&text, &rules, &config));
    }

    /// Property: the match cap bounds the result size.
    #[test]
    fn prop_classify_respects_cap(
        words in prop::collection::vec(prop::sample::select(vec![
            "form", "api", "test", "readme", "login", "cache", "sql", "react", "sentry", "hello",
        ]), 0..20),
        cap in 1usize..6,
    ) {
        let text = words.join(" ");
        let matches = classify(&text, &builtin(), &ClassifierConfig::default().with_max_matches(cap));
        prop_assert!(matches.len() <= cap);
    }

    /// Property: text made of non-matching filler never produces an advisory.
    #[test]
    fn prop_no_match_means_no_advisory(text in "[qxz ]{0,100}") {
        let rules = builtin();
        let advisory = PromptAdvisor::new(&rules, ClassifierConfig::default()).advise(&text);
        prop_assert_eq!(advisory, Advisory::NoAdvisory);
    }

    /// Property: an advisory that speaks always carries at least one match.
    #[test]
    fn prop_advisory_is_never_empty(text in ".{0,120}") {
        let rules = builtin();
        let advisory = PromptAdvisor::new(&rules, ClassifierConfig::default()).advise(&text);
        if let Some(body) = advisory.body() {
            prop_assert!(!body.matches.is_empty());
        }
    }

    /// Property: reconstruction is deterministic.
    #[test]
    fn prop_reconstruct_is_deterministic(
        steps in prop::collection::vec((any::<u8>(), "[a-z]{1,8}", operation()), 0..40),
    ) {
        let events = events_from(&steps);
        prop_assert_eq!(reconstruct(&events).unwrap(), reconstruct(&events).unwrap());
    }

    /// Property: repeated operations on one path never grow its set past the
    /// distinct kinds seen.
    #[test]
    fn prop_file_operations_are_sets(ops in prop::collection::vec(operation(), 1..30)) {
        let events: Vec<Event> = ops
            .iter()
            .zip(1u64..)
            .map(|(op, seq)| Event::file_tool(seq, "Edit", "src/lib.rs", *op))
            .collect();
        let timeline = reconstruct(&events).unwrap();

        let distinct: std::collections::BTreeSet<FileOperation> = ops.iter().copied().collect();
        prop_assert_eq!(timeline.files_touched.get("src/lib.rs"), Some(&distinct));
        prop_assert_eq!(timeline.tool_counts.get("Edit").copied(), Some(ops.len() as u64));
    }

    /// Property: every failed result yields exactly one error entry.
    #[test]
    fn prop_each_failure_recorded_once(
        steps in prop::collection::vec((any::<u8>(), "[a-z]{1,8}", operation()), 0..40),
    ) {
        let events = events_from(&steps);
        let failures = steps.iter().filter(|(k, _, _)| k % 4 == 3).count();
        prop_assert_eq!(reconstruct(&events).unwrap().errors.len(), failures);
    }

    /// Property: a decreasing sequence index always fails.
    #[test]
    fn prop_decreasing_sequence_fails(start in 2u64..1000, drop in 1u64..1000) {
        let found = start.saturating_sub(drop);
        prop_assume!(found < start);
        let events = vec![
            Event::notification(start, "first"),
            Event::notification(found, "second"),
        ];
        let is_out_of_order = matches!(
            reconstruct(&events),
            Err(Error::OutOfOrderEvent { previous, found: f }) if previous == start && f == found
        );
        prop_assert!(is_out_of_order);
    }
}
