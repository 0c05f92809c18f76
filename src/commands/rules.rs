//! Rules command handler.

use hookwise::rules::{LoadReport, RuleSet};
use std::process::ExitCode;

use super::RulesAction;

/// Rules command.
///
/// Exits non-zero when the catalog is unreadable or any entry was rejected.
pub fn cmd_rules(action: RulesAction) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match action {
        RulesAction::Validate { path } => {
            let (rules, report) = match path {
                Some(path) => RuleSet::load(&path)?,
                None => RuleSet::builtin(),
            };
            print_report(&rules, &report);
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        },
    }
}

fn print_report(rules: &RuleSet, report: &LoadReport) {
    println!("Catalog: {}", report.source);
    println!("Rules loaded: {}", report.loaded);

    for rule in rules.iter() {
        println!(
            "  {} [{}, {}] {} keywords, {} patterns",
            rule.category(),
            rule.priority(),
            rule.enforcement(),
            rule.keywords().len(),
            rule.patterns().len()
        );
    }

    if report.is_clean() {
        println!("No problems found.");
        return;
    }

    println!();
    println!("Rejected entries: {}", report.warnings.len());
    for warning in &report.warnings {
        println!("  {}: {}", warning.category, warning.reason);
    }
}
