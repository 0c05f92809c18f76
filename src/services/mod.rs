//! Business logic services.
//!
//! Classification and advice run per prompt; transcript ingestion, timeline
//! reconstruction, rendering, narration and storage run once per session.

mod advisor;
mod classifier;
mod narrator;
mod session_store;
mod summary;
mod timeline;
mod transcript;

pub use advisor::{PromptAdvisor, assemble};
pub use classifier::{ClassifierConfig, DEFAULT_MAX_MATCHES, TextClassifier, classify};
pub use narrator::{LlmNarrator, SummaryNarrator, narrate_with_timeout};
pub use session_store::{
    CHAT_COPY_NAME, HOOK_LOG_NAME, SUMMARY_RECORD_NAME, SUMMARY_REPORT_NAME, SessionStore,
    SummaryPaths, sanitize_session_id,
};
pub use summary::{ReportLimits, SummaryRenderer};
pub use timeline::{UNKNOWN_TOOL, reconstruct};
pub use transcript::Transcript;
