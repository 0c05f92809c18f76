//! Host runtime hooks.
//!
//! Implements handlers for the two hook events the engine serves.
//!
//! # Hook Response JSON Format
//!
//! | Event | Handler | Stdout |
//! |-------|---------|--------|
//! | `UserPromptSubmit` | [`UserPromptHandler`] | advisory JSON, or nothing |
//! | `Stop` | [`StopHandler`] | nothing (artifacts are written to disk) |
//!
//! A suggestion is injected into model context:
//!
//! ```json
//! {
//!   "hookSpecificOutput": {
//!     "hookEventName": "UserPromptSubmit",
//!     "additionalContext": "## Suggested modules\n..."
//!   }
//! }
//! ```
//!
//! A blocking advisory stops the prompt and tells the user why:
//!
//! ```json
//! { "decision": "block", "reason": "..." }
//! ```
//!
//! When nothing matched, the handler returns `None` and the caller writes
//! nothing at all, which the host treats differently from any JSON body.

mod formatter;
mod stop;
mod user_prompt;

pub use formatter::AdvisoryFormatter;
pub use stop::{StopHandler, StopInput};
pub use user_prompt::UserPromptHandler;

use crate::Result;

/// Trait for hook handlers.
pub trait HookHandler: Send + Sync {
    /// The hook event type this handler processes.
    fn event_type(&self) -> &'static str;

    /// Handles the hook event.
    ///
    /// Returns the text to write to stdout, or `None` to stay silent.
    ///
    /// # Errors
    ///
    /// Returns an error if handling fails.
    fn handle(&self, input: &str) -> Result<Option<String>>;
}
