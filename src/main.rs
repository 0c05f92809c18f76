//! Binary entry point for hookwise.
//!
//! This binary provides the hook entry points and a few inspection commands.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::{HookEvent, RulesAction};
use hookwise::config::{HookwiseConfig, LoggingSettings};
use hookwise::observability::{self, InitOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Hookwise - session intelligence hooks for AI coding assistants.
#[derive(Parser)]
#[command(name = "hookwise")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Handle a host hook event (reads the event JSON from stdin).
    Hook {
        /// The hook event to handle.
        #[command(subcommand)]
        event: HookEvent,
    },

    /// Classify text against the rule catalog and print ranked matches.
    Classify {
        /// The text to classify.
        text: String,

        /// Maximum number of matches (0 for unlimited).
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the summary report for a transcript without persisting it.
    Summarize {
        /// Path to the JSONL transcript.
        transcript: PathBuf,

        /// Print the structured record instead of the report.
        #[arg(long)]
        json: bool,
    },

    /// Rule catalog utilities.
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Show configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

fn main() -> ExitCode {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let options = InitOptions {
        verbose: cli.verbose,
    };

    // Hooks must not fail the host session, so setup errors degrade to
    // defaults and stderr logging instead of a non-zero exit.
    if let Commands::Hook { event } = cli.command {
        run_hook(event, cli.config.as_deref(), options);
        return ExitCode::SUCCESS;
    }

    let config = match HookwiseConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(&config.logging, options) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs a hook event with best-effort configuration and logging.
fn run_hook(event: HookEvent, config_path: Option<&Path>, options: InitOptions) {
    let (config, config_error) = match HookwiseConfig::load(config_path) {
        Ok(config) => (config, None),
        Err(e) => (HookwiseConfig::default().with_env_overrides(), Some(e)),
    };

    if let Err(e) = observability::init(&config.logging, options) {
        let stderr_only = LoggingSettings {
            file: None,
            ..config.logging.clone()
        };
        match observability::init(&stderr_only, options) {
            Ok(()) => tracing::warn!(error = %e, "Failed to initialize logging; using stderr"),
            Err(_) => eprintln!("hookwise: failed to initialize logging: {e}"),
        }
    }

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Failed to load configuration; using defaults");
    }

    commands::cmd_hook(event, &config);
}

/// Runs the selected command.
fn run_command(
    command: Commands,
    config: HookwiseConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Commands::Hook { event } => {
            commands::cmd_hook(event, &config);
            Ok(ExitCode::SUCCESS)
        },
        Commands::Classify { text, limit } => commands::cmd_classify(&config, &text, limit),
        Commands::Summarize { transcript, json } => {
            commands::cmd_summarize(&config, &transcript, json)
        },
        Commands::Rules { action } => commands::cmd_rules(action),
        Commands::Config { show } => commands::cmd_config(&config, show),
    }
}
