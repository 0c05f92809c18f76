//! Command handlers module.
//!
//! - `hook.rs`: host hook event handlers
//! - `classify.rs`: ad-hoc classification of a piece of text
//! - `summarize.rs`: render a transcript's report without persisting it
//! - `rules.rs`: rule catalog validation
//! - `config.rs`: configuration display

mod classify;
mod config;
mod hook;
mod rules;
mod summarize;

use clap::Subcommand;
use std::path::PathBuf;

pub use classify::cmd_classify;
pub use config::cmd_config;
pub use hook::cmd_hook;
pub use rules::cmd_rules;
pub use summarize::cmd_summarize;

/// Hook events.
#[derive(Subcommand, Clone, Copy)]
pub enum HookEvent {
    /// User prompt submit hook.
    UserPromptSubmit,
    /// Stop hook.
    Stop,
}

impl HookEvent {
    /// Returns the hook event as a lowercase hyphenated string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserPromptSubmit => "user-prompt-submit",
            Self::Stop => "stop",
        }
    }
}

/// Rules subcommands.
#[derive(Subcommand)]
pub enum RulesAction {
    /// Load a catalog and report rejected entries.
    Validate {
        /// Path to the catalog (YAML or JSON). Defaults to the built-in catalog.
        path: Option<PathBuf>,
    },
}
