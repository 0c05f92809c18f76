//! Host transcript ingestion.
//!
//! The host runtime keeps a JSONL transcript per session. Each line is one
//! entry; assistant entries carry `tool_use` blocks and the following user
//! entries carry the matching `tool_result` blocks. [`Transcript::events`]
//! flattens these into the ordered [`Event`] stream consumed by
//! [`reconstruct`](crate::services::reconstruct).
//!
//! Older flat entries (`type: human | tool_use | tool_result` with the
//! payload at the top level) are accepted as well.

use crate::models::{Event, EventKind, FileOperation, FileTarget};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Tool whose `command` input is recorded.
const SHELL_TOOL: &str = "Bash";

/// Parsed transcript entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<Value>,
}

impl Transcript {
    /// Reads a JSONL transcript from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read. Malformed lines are
    /// skipped, not reported.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_transcript".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Ok(Self::parse(&content))
    }

    /// Parses JSONL content, skipping blank and unparseable lines.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut skipped = 0usize;
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                serde_json::from_str::<Value>(line)
                    .inspect_err(|_| skipped += 1)
                    .ok()
            })
            .collect::<Vec<_>>();

        if skipped > 0 {
            tracing::debug!(skipped, "Skipped unparseable transcript lines");
        }
        Self { entries }
    }

    /// Raw entries, in file order.
    #[must_use]
    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    /// Number of entries, counted as the session's messages.
    #[must_use]
    pub fn message_count(&self) -> u64 {
        u64::try_from(self.entries.len()).unwrap_or(u64::MAX)
    }

    /// Whether the transcript has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the entries into events with sequence indices from 1.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        let mut sink = EventSink::default();
        for entry in &self.entries {
            sink.entry(entry);
        }
        sink.events
    }
}

#[derive(Debug, Default)]
struct EventSink {
    events: Vec<Event>,
    tool_ids: HashMap<String, u64>,
}

impl EventSink {
    fn push(&mut self, kind: EventKind, timestamp: Option<DateTime<Utc>>) -> u64 {
        let sequence = self.events.len() as u64 + 1;
        self.events.push(Event {
            sequence,
            timestamp,
            kind,
        });
        sequence
    }

    fn entry(&mut self, entry: &Value) {
        let timestamp = entry
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|ts| ts.parse::<DateTime<Utc>>().ok());
        let entry_type = entry.get("type").and_then(Value::as_str).unwrap_or_default();

        match entry_type {
            "user" | "assistant" => {
                let Some(message) = entry.get("message") else {
                    self.notification(entry_type, timestamp);
                    return;
                };
                let is_user = entry_type == "user";
                match message.get("content") {
                    Some(Value::String(text)) => self.text(is_user, text, timestamp),
                    Some(Value::Array(blocks)) => {
                        for block in blocks {
                            self.block(is_user, block, timestamp);
                        }
                    },
                    _ => self.notification(entry_type, timestamp),
                }
            },
            "human" => {
                let text = entry
                    .get("content")
                    .or_else(|| entry.get("message"))
                    .and_then(content_text)
                    .unwrap_or_default();
                self.text(true, &text, timestamp);
            },
            "tool_use" => self.tool_use(entry, timestamp),
            "tool_result" => self.tool_result(entry, timestamp, true),
            _ if entry.get("role").and_then(Value::as_str) == Some("user") => {
                let text = entry.get("content").and_then(content_text).unwrap_or_default();
                self.text(true, &text, timestamp);
            },
            other => self.notification(if other.is_empty() { "entry" } else { other }, timestamp),
        }
    }

    fn block(&mut self, is_user: bool, block: &Value, timestamp: Option<DateTime<Utc>>) {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                let text = block.get("text").and_then(Value::as_str).unwrap_or_default();
                self.text(is_user, text, timestamp);
            },
            Some("tool_use") => self.tool_use(block, timestamp),
            Some("tool_result") => self.tool_result(block, timestamp, false),
            Some(other) => self.notification(other, timestamp),
            None => {},
        }
    }

    fn text(&mut self, is_user: bool, text: &str, timestamp: Option<DateTime<Utc>>) {
        if text.trim().is_empty() {
            return;
        }
        let kind = if is_user {
            EventKind::UserMessage {
                text: text.to_string(),
            }
        } else {
            EventKind::Notification {
                message: text.to_string(),
            }
        };
        self.push(kind, timestamp);
    }

    fn notification(&mut self, label: &str, timestamp: Option<DateTime<Utc>>) {
        self.push(
            EventKind::Notification {
                message: label.to_string(),
            },
            timestamp,
        );
    }

    fn tool_use(&mut self, value: &Value, timestamp: Option<DateTime<Utc>>) {
        let Some(tool) = value
            .get("name")
            .or_else(|| value.get("tool"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
        else {
            self.notification("tool_use", timestamp);
            return;
        };

        let input = value.get("input");
        let target = FileOperation::for_tool(tool).and_then(|operation| {
            input
                .and_then(file_path)
                .map(|path| FileTarget { path, operation })
        });
        let command = (tool == SHELL_TOOL)
            .then(|| input.and_then(|i| i.get("command")).and_then(Value::as_str))
            .flatten()
            .filter(|c| !c.trim().is_empty())
            .map(ToString::to_string);

        let sequence = self.push(
            EventKind::ToolInvocation {
                tool: tool.to_string(),
                target,
                command,
            },
            timestamp,
        );
        if let Some(id) = value.get("id").and_then(Value::as_str) {
            self.tool_ids.insert(id.to_string(), sequence);
        }
    }

    fn tool_result(&mut self, value: &Value, timestamp: Option<DateTime<Utc>>, flat: bool) {
        let invocation = value
            .get("tool_use_id")
            .and_then(Value::as_str)
            .and_then(|id| self.tool_ids.get(id).copied());
        let content = value
            .get("content")
            .or_else(|| value.get("output"))
            .and_then(content_text)
            .unwrap_or_default();

        let failed = match value.get("is_error").and_then(Value::as_bool) {
            Some(flag) => flag,
            // Flat entries rarely carry the flag; fall back to the content.
            None if flat => {
                let lower = content.to_lowercase();
                lower.contains("error") || lower.contains("failed")
            },
            None => false,
        };

        self.push(
            EventKind::ToolResult {
                success: !failed,
                error: failed.then_some(content),
                invocation,
            },
            timestamp,
        );
    }
}

fn file_path(input: &Value) -> Option<String> {
    ["file_path", "notebook_path", "path"]
        .iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
}

/// Flattens string or block-list content into plain text.
fn content_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(blocks) => {
            let parts: Vec<&str> = blocks
                .iter()
                .filter_map(|b| match b {
                    Value::String(s) => Some(s.as_str()),
                    _ => b.get("text").and_then(Value::as_str),
                })
                .collect();
            Some(parts.join("\n"))
        },
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
