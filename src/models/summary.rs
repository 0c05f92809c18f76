//! Session summary record.

use super::event::FileOperation;
use super::timeline::TimelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display class for a file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconClass {
    /// File was read.
    FileRead,
    /// File was written.
    FileWrite,
    /// File was edited.
    FileEdit,
}

impl IconClass {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FileRead => "file-read",
            Self::FileWrite => "file-write",
            Self::FileEdit => "file-edit",
        }
    }

    /// Glyph used in the text report.
    #[must_use]
    pub const fn glyph(&self) -> &'static str {
        match self {
            Self::FileRead => "📖",
            Self::FileWrite => "📝",
            Self::FileEdit => "✏️",
        }
    }
}

impl From<FileOperation> for IconClass {
    fn from(operation: FileOperation) -> Self {
        match operation {
            FileOperation::Read => Self::FileRead,
            FileOperation::Write => Self::FileWrite,
            FileOperation::Edit => Self::FileEdit,
        }
    }
}

/// One `(path, operation)` pair, flattened for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTouch {
    /// File path.
    pub path: String,
    /// Operation kind.
    pub operation: FileOperation,
    /// Display class.
    pub icon_class: IconClass,
}

/// Headline counts for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    /// Transcript entries when the session came from a transcript,
    /// otherwise folded events.
    pub total_messages: u64,
    /// Distinct paths written or edited.
    pub files_modified: u64,
    /// Distinct paths read.
    pub files_read: u64,
    /// Shell commands run.
    pub commands_run: u64,
}

/// Final, write-once summary of a session.
///
/// The structured record (JSON) and the text report are both derived from
/// this value; the report never shows anything the record lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Capture time, taken once per render.
    pub generated_at: DateTime<Utc>,
    /// User requests in order.
    pub requests: Vec<String>,
    /// Files touched, ordered by path then operation.
    pub files_touched: Vec<FileTouch>,
    /// Invocation count per tool.
    pub tool_counts: BTreeMap<String, u64>,
    /// Shell commands in order.
    pub commands: Vec<String>,
    /// Errors in order.
    pub errors: Vec<TimelineError>,
    /// Headline counts.
    pub statistics: SessionStatistics,
    /// Optional LLM narrative of the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl SessionSummary {
    /// Reports `count` messages instead of the folded event count.
    #[must_use]
    pub fn with_message_count(mut self, count: u64) -> Self {
        self.statistics.total_messages = count;
        self
    }
}
