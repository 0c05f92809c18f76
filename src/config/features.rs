//! Feature flags for optional functionality.

use serde::Serialize;

/// Feature flags for controlling optional session-end behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    /// Write the session summary record and report.
    pub summary: bool,
    /// Copy the parsed transcript to `chat.json`.
    pub chat_copy: bool,
    /// Append raw Stop hook inputs to `stop.json`.
    pub hook_log: bool,
    /// Ask the LLM for a narrative of the session.
    pub narration: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            summary: true,
            chat_copy: false,
            hook_log: true,
            narration: false,
        }
    }
}

impl FeatureFlags {
    /// Creates feature flags with all features disabled.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            summary: false,
            chat_copy: false,
            hook_log: false,
            narration: false,
        }
    }

    /// Creates feature flags with all features enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            summary: true,
            chat_copy: true,
            hook_log: true,
            narration: true,
        }
    }

    /// Whether anything needs to be written for a session.
    #[must_use]
    pub const fn persists_anything(&self) -> bool {
        self.summary || self.chat_copy || self.hook_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(!FeatureFlags::none().persists_anything());
        assert!(FeatureFlags::all().narration);

        let defaults = FeatureFlags::default();
        assert!(defaults.summary && defaults.hook_log);
        assert!(!defaults.chat_copy && !defaults.narration);
    }
}
