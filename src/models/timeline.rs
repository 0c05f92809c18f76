//! Normalized session timeline.

use super::event::FileOperation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Why an entry landed in [`SessionTimeline::errors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineErrorKind {
    /// A tool reported failure.
    ToolFailure,
    /// A tool result did not reference any earlier invocation.
    OrphanedResult,
}

/// One error encountered during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineError {
    /// Tool that failed, or `unknown` for orphaned results.
    pub tool_name: String,
    /// Error text.
    pub message: String,
    /// Sequence index of the offending result.
    pub sequence: u64,
    /// Failure or anomaly.
    pub kind: TimelineErrorKind,
}

/// Activity reconstructed from a session's events.
///
/// Built once by [`reconstruct`](crate::services::reconstruct). Every failed
/// tool result and every orphaned result contributes exactly one entry to
/// `errors`; `files_touched` records the set of operation kinds seen per
/// path, while only `tool_counts` counts repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimeline {
    /// User requests in encounter order, exact duplicates collapsed.
    pub requests: Vec<String>,
    /// Operation kinds seen per path.
    pub files_touched: BTreeMap<String, BTreeSet<FileOperation>>,
    /// Invocation count per tool.
    pub tool_counts: BTreeMap<String, u64>,
    /// Shell commands in invocation order.
    pub commands: Vec<String>,
    /// Errors in encounter order.
    pub errors: Vec<TimelineError>,
    /// Number of events folded into the timeline.
    pub event_count: u64,
}

impl SessionTimeline {
    /// Paths with at least one write or edit.
    pub fn modified_files(&self) -> impl Iterator<Item = &str> {
        self.files_touched
            .iter()
            .filter(|(_, ops)| ops.iter().any(FileOperation::is_modification))
            .map(|(path, _)| path.as_str())
    }

    /// Paths that were read.
    pub fn read_files(&self) -> impl Iterator<Item = &str> {
        self.files_touched
            .iter()
            .filter(|(_, ops)| ops.contains(&FileOperation::Read))
            .map(|(path, _)| path.as_str())
    }

    /// Whether nothing happened in the session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_count == 0
    }
}
