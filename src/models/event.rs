//! Session events.
//!
//! Events are emitted by the host runtime in sequence order. Their JSON form
//! is internally tagged:
//!
//! ```json
//! {"sequence": 2, "type": "tool_invocation", "tool": "Write",
//!  "target": {"path": "LoginForm.tsx", "operation": "write"}}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of file access performed by a tool.
///
/// Ordered `Read < Write < Edit` for deterministic set iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// File contents were read.
    Read,
    /// File was written wholesale (created or overwritten).
    Write,
    /// File was edited in place.
    Edit,
}

impl FileOperation {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Edit => "edit",
        }
    }

    /// Whether the operation changes the file.
    #[must_use]
    pub const fn is_modification(&self) -> bool {
        matches!(self, Self::Write | Self::Edit)
    }

    /// Infers the operation performed by a known file tool.
    #[must_use]
    pub fn for_tool(tool: &str) -> Option<Self> {
        match tool {
            "Read" => Some(Self::Read),
            "Write" => Some(Self::Write),
            "Edit" | "MultiEdit" | "NotebookEdit" => Some(Self::Edit),
            _ => None,
        }
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File targeted by a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTarget {
    /// Path as reported by the tool.
    pub path: String,
    /// Kind of access.
    pub operation: FileOperation,
}

/// Event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// An instruction typed by the user.
    UserMessage {
        /// Raw text.
        text: String,
    },
    /// A tool call made by the assistant.
    ToolInvocation {
        /// Tool name, e.g. `Write` or `Bash`.
        tool: String,
        /// File accessed, for file I/O tools.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<FileTarget>,
        /// Shell command, for command tools.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    /// Completion of a tool call.
    ToolResult {
        /// Whether the tool succeeded.
        success: bool,
        /// Error text when it did not.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Sequence index of the invocation this result completes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        invocation: Option<u64>,
    },
    /// Anything else the host reports (assistant text, system notices).
    Notification {
        /// Notice text.
        #[serde(default)]
        message: String,
    },
}

/// One entry in a session's event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence index.
    pub sequence: u64,
    /// When the host recorded the event, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub const fn new(sequence: u64, kind: EventKind) -> Self {
        Self {
            sequence,
            timestamp: None,
            kind,
        }
    }

    /// A user message.
    #[must_use]
    pub fn user_message(sequence: u64, text: impl Into<String>) -> Self {
        Self::new(sequence, EventKind::UserMessage { text: text.into() })
    }

    /// A tool invocation without file or command details.
    #[must_use]
    pub fn tool(sequence: u64, tool: impl Into<String>) -> Self {
        Self::new(
            sequence,
            EventKind::ToolInvocation {
                tool: tool.into(),
                target: None,
                command: None,
            },
        )
    }

    /// A file tool invocation.
    #[must_use]
    pub fn file_tool(
        sequence: u64,
        tool: impl Into<String>,
        path: impl Into<String>,
        operation: FileOperation,
    ) -> Self {
        Self::new(
            sequence,
            EventKind::ToolInvocation {
                tool: tool.into(),
                target: Some(FileTarget {
                    path: path.into(),
                    operation,
                }),
                command: None,
            },
        )
    }

    /// A shell command invocation.
    #[must_use]
    pub fn command(sequence: u64, tool: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(
            sequence,
            EventKind::ToolInvocation {
                tool: tool.into(),
                target: None,
                command: Some(command.into()),
            },
        )
    }

    /// A successful tool result.
    #[must_use]
    pub const fn success(sequence: u64, invocation: Option<u64>) -> Self {
        Self::new(
            sequence,
            EventKind::ToolResult {
                success: true,
                error: None,
                invocation,
            },
        )
    }

    /// A failed tool result.
    #[must_use]
    pub fn failure(sequence: u64, invocation: Option<u64>, error: impl Into<String>) -> Self {
        Self::new(
            sequence,
            EventKind::ToolResult {
                success: false,
                error: Some(error.into()),
                invocation,
            },
        )
    }

    /// A notification.
    #[must_use]
    pub fn notification(sequence: u64, message: impl Into<String>) -> Self {
        Self::new(
            sequence,
            EventKind::Notification {
                message: message.into(),
            },
        )
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
