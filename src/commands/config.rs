//! Config command handler.

use hookwise::config::HookwiseConfig;
use std::process::ExitCode;

/// Config command.
///
/// Prints the effective configuration as TOML. The API key is never shown.
pub fn cmd_config(
    config: &HookwiseConfig,
    show: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if !show {
        println!("Use --show to display the current configuration.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("# Effective configuration");
    println!(
        "# API key: {}",
        if config.llm.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(ExitCode::SUCCESS)
}
