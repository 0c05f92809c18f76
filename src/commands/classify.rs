//! Classify command handler.

use hookwise::config::HookwiseConfig;
use hookwise::rules::RuleSet;
use hookwise::services::{PromptAdvisor, TextClassifier};
use std::process::ExitCode;

/// Classify command.
///
/// Prints the ranked matches and the advisory the prompt hook would give.
pub fn cmd_classify(
    config: &HookwiseConfig,
    text: &str,
    limit: Option<usize>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (rules, report) = RuleSet::load_or_empty(config.rules_path.as_deref());
    let classifier_config = limit.map_or(config.classifier, |n| {
        config.classifier.with_max_matches(n)
    });

    let matches = TextClassifier::new(&rules, classifier_config).classify(text);
    println!("Rules: {} loaded from {}", rules.len(), report.source);

    if matches.is_empty() {
        println!("No rules matched.");
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    for (i, m) in matches.iter().enumerate() {
        println!(
            "{}. {} [{}, {}] strength {}",
            i + 1,
            m.category,
            m.priority,
            m.enforcement,
            m.strength
        );
        println!("   matched: {}", m.matched_terms.join(", "));
        if !m.recommended_modules.is_empty() {
            println!("   modules: {}", m.recommended_modules.join(", "));
        }
    }

    let advisory = PromptAdvisor::new(&rules, classifier_config).advise(text);
    println!();
    println!("Advisory: {}", advisory.kind());
    Ok(ExitCode::SUCCESS)
}
