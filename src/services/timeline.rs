//! Event timeline reconstruction.
//!
//! A session's event stream is folded, in order, into a [`SessionTimeline`].
//! The fold is pure: the same events always produce the same timeline.

use crate::models::{Event, EventKind, SessionTimeline, TimelineError, TimelineErrorKind};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Tool name recorded for results with no matching invocation.
pub const UNKNOWN_TOOL: &str = "unknown";

/// Builds a timeline from an ordered event list.
///
/// # Errors
///
/// Returns [`Error::OutOfOrderEvent`] when a sequence index is lower than the
/// one before it. Events are never reordered.
pub fn reconstruct(events: &[Event]) -> Result<SessionTimeline> {
    events
        .iter()
        .try_fold(TimelineAccumulator::default(), TimelineAccumulator::apply)
        .map(TimelineAccumulator::finish)
}

/// Fold state.
#[derive(Debug, Default)]
struct TimelineAccumulator {
    timeline: SessionTimeline,
    last_sequence: Option<u64>,
    invocations: HashMap<u64, String>,
    seen_requests: HashSet<String>,
}

impl TimelineAccumulator {
    fn apply(mut self, event: &Event) -> Result<Self> {
        if let Some(previous) = self.last_sequence {
            if event.sequence < previous {
                tracing::warn!(
                    previous,
                    found = event.sequence,
                    "Event sequence went backwards"
                );
                return Err(Error::OutOfOrderEvent {
                    previous,
                    found: event.sequence,
                });
            }
        }
        self.last_sequence = Some(event.sequence);
        self.timeline.event_count += 1;

        match &event.kind {
            EventKind::UserMessage { text } => self.record_request(text),
            EventKind::ToolInvocation {
                tool,
                target,
                command,
            } => {
                *self.timeline.tool_counts.entry(tool.clone()).or_insert(0) += 1;
                self.invocations.insert(event.sequence, tool.clone());
                if let Some(target) = target {
                    self.timeline
                        .files_touched
                        .entry(target.path.clone())
                        .or_default()
                        .insert(target.operation);
                }
                if let Some(command) = command.as_deref().filter(|c| !c.trim().is_empty()) {
                    self.timeline.commands.push(command.to_string());
                }
            },
            EventKind::ToolResult {
                success,
                error,
                invocation,
            } => self.record_result(event.sequence, *success, error.as_deref(), *invocation),
            EventKind::Notification { .. } => {},
        }

        Ok(self)
    }

    fn record_request(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.seen_requests.insert(text.to_string()) {
            self.timeline.requests.push(text.to_string());
        }
    }

    fn record_result(
        &mut self,
        sequence: u64,
        success: bool,
        error: Option<&str>,
        invocation: Option<u64>,
    ) {
        let tool = invocation.and_then(|idx| self.invocations.get(&idx));

        let Some(tool) = tool else {
            tracing::warn!(
                sequence,
                invocation = ?invocation,
                "Tool result has no matching invocation"
            );
            let reference = invocation.map_or_else(
                || "no invocation reference".to_string(),
                |idx| format!("references unknown invocation #{idx}"),
            );
            let message = match error {
                Some(err) => format!("orphaned tool result ({reference}): {err}"),
                None => format!("orphaned tool result ({reference})"),
            };
            self.timeline.errors.push(TimelineError {
                tool_name: UNKNOWN_TOOL.to_string(),
                message,
                sequence,
                kind: TimelineErrorKind::OrphanedResult,
            });
            return;
        };

        if !success {
            self.timeline.errors.push(TimelineError {
                tool_name: tool.clone(),
                message: error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or("tool reported failure")
                    .to_string(),
                sequence,
                kind: TimelineErrorKind::ToolFailure,
            });
        }
    }

    fn finish(self) -> SessionTimeline {
        self.timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileOperation;
    use std::collections::BTreeSet;

    #[test]
    fn test_login_form_scenario() {
        let events = vec![
            Event::user_message(1, "add login form"),
            Event::file_tool(2, "Write", "LoginForm.tsx", FileOperation::Write),
            Event::success(3, Some(2)),
            Event::user_message(4, "add login form"),
        ];
        let timeline = reconstruct(&events).unwrap();

        assert_eq!(timeline.requests, vec!["add login form"]);
        assert_eq!(
            timeline.files_touched.get("LoginForm.tsx"),
            Some(&BTreeSet::from([FileOperation::Write]))
        );
        assert_eq!(timeline.tool_counts.get("Write"), Some(&1));
        assert_eq!(timeline.tool_counts.len(), 1);
        assert!(timeline.errors.is_empty());
        assert_eq!(timeline.event_count, 4);
    }

    #[test]
    fn test_write_then_edit_keeps_both_kinds() {
        let events = vec![
            Event::file_tool(1, "Write", "src/app.ts", FileOperation::Write),
            Event::file_tool(2, "Edit", "src/app.ts", FileOperation::Edit),
        ];
        let timeline = reconstruct(&events).unwrap();
        assert_eq!(
            timeline.files_touched["src/app.ts"],
            BTreeSet::from([FileOperation::Write, FileOperation::Edit])
        );
    }

    #[test]
    fn test_repeated_touches_are_set_semantics() {
        let events = vec![
            Event::file_tool(1, "Write", "a.rs", FileOperation::Write),
            Event::file_tool(2, "Edit", "a.rs", FileOperation::Edit),
            Event::file_tool(3, "Write", "a.rs", FileOperation::Write),
        ];
        let timeline = reconstruct(&events).unwrap();
        assert_eq!(timeline.files_touched["a.rs"].len(), 2);
        assert_eq!(timeline.tool_counts["Write"], 2);
        assert_eq!(timeline.tool_counts["Edit"], 1);
    }

    #[test]
    fn test_out_of_order_fails() {
        let events = vec![
            Event::user_message(1, "a"),
            Event::user_message(3, "b"),
            Event::user_message(2, "c"),
        ];
        let err = reconstruct(&events).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfOrderEvent {
                previous: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_failed_result_recorded_once() {
        let events = vec![
            Event::command(1, "Bash", "cargo test"),
            Event::failure(2, Some(1), "exit status 101"),
        ];
        let timeline = reconstruct(&events).unwrap();
        assert_eq!(timeline.errors.len(), 1);
        let error = &timeline.errors[0];
        assert_eq!(error.tool_name, "Bash");
        assert_eq!(error.message, "exit status 101");
        assert_eq!(error.sequence, 2);
        assert_eq!(error.kind, TimelineErrorKind::ToolFailure);
        assert_eq!(timeline.commands, vec!["cargo test"]);
    }

    #[test]
    fn test_failure_without_message() {
        let events = vec![Event::tool(1, "Grep"), Event::failure(2, Some(1), "  ")];
        let timeline = reconstruct(&events).unwrap();
        assert_eq!(timeline.errors[0].message, "tool reported failure");
    }

    #[test]
    fn test_orphaned_result_is_tolerated() {
        let events = vec![
            Event::user_message(1, "hi"),
            Event::failure(2, Some(99), "boom"),
            Event::success(3, None),
        ];
        let timeline = reconstruct(&events).unwrap();
        assert_eq!(timeline.errors.len(), 2);
        assert!(
            timeline
                .errors
                .iter()
                .all(|e| e.kind == TimelineErrorKind::OrphanedResult && e.tool_name == UNKNOWN_TOOL)
        );
        assert!(timeline.errors[0].message.contains("#99"));
        assert!(timeline.errors[0].message.contains("boom"));
    }

    #[test]
    fn test_result_cannot_complete_later_invocation() {
        let events = vec![Event::failure(1, Some(2), "early"), Event::tool(2, "Read")];
        let timeline = reconstruct(&events).unwrap();
        assert_eq!(timeline.errors[0].kind, TimelineErrorKind::OrphanedResult);
    }

    #[test]
    fn test_near_duplicates_kept_and_blank_skipped() {
        let events = vec![
            Event::user_message(1, "add login form"),
            Event::user_message(2, "add login form!"),
            Event::user_message(3, "   "),
            Event::notification(4, "assistant reply"),
        ];
        let timeline = reconstruct(&events).unwrap();
        assert_eq!(timeline.requests, vec!["add login form", "add login form!"]);
        assert_eq!(timeline.event_count, 4);
    }

    #[test]
    fn test_empty_events() {
        let timeline = reconstruct(&[]).unwrap();
        assert!(timeline.is_empty());
        assert_eq!(timeline, SessionTimeline::default());
    }

    #[test]
    fn test_deterministic() {
        let events = vec![
            Event::user_message(1, "fix the build"),
            Event::command(2, "Bash", "cargo build"),
            Event::failure(3, Some(2), "error[E0308]"),
            Event::file_tool(4, "Edit", "src/lib.rs", FileOperation::Edit),
            Event::success(5, Some(4)),
        ];
        assert_eq!(reconstruct(&events).unwrap(), reconstruct(&events).unwrap());
    }
}
