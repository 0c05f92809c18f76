//! Stop hook handler.
//!
//! Runs once when the host session ends: logs the raw input, ingests the
//! session's events, reconstructs the timeline and writes the summary
//! artifacts. The hook never writes to stdout.

use super::HookHandler;
use crate::config::FeatureFlags;
use crate::models::Event;
use crate::services::{
    SessionStore, SummaryNarrator, SummaryRenderer, Transcript, narrate_with_timeout, reconstruct,
};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Input the host sends to the Stop hook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopInput {
    /// Host session identifier.
    #[serde(default)]
    pub session_id: Option<String>,
    /// JSONL transcript location.
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
    /// Pre-built event stream; takes precedence over the transcript.
    #[serde(default)]
    pub events: Option<Vec<Event>>,
    /// Whether the host is already continuing because of a stop hook.
    #[serde(default)]
    pub stop_hook_active: bool,
}

/// Handles `Stop` hook events.
pub struct StopHandler {
    store: SessionStore,
    renderer: SummaryRenderer,
    features: FeatureFlags,
    narrator: Option<Arc<dyn SummaryNarrator>>,
    narration_timeout: Duration,
}

impl StopHandler {
    /// Creates a handler writing under `store`.
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            renderer: SummaryRenderer::new(),
            features: FeatureFlags::default(),
            narrator: None,
            narration_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the summary renderer.
    #[must_use]
    pub const fn with_renderer(mut self, renderer: SummaryRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Sets the feature flags.
    #[must_use]
    pub const fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Sets the narrator and its time budget.
    #[must_use]
    pub fn with_narrator(mut self, narrator: Arc<dyn SummaryNarrator>, timeout: Duration) -> Self {
        self.narrator = Some(narrator);
        self.narration_timeout = timeout;
        self
    }

    /// Collects the session's events and the raw transcript entries.
    fn collect_events(input: StopInput) -> Result<(Vec<Event>, Option<Transcript>)> {
        if let Some(events) = input.events {
            return Ok((events, None));
        }
        match input.transcript_path {
            Some(path) if path.exists() => {
                let transcript = Transcript::read(&path)?;
                Ok((transcript.events(), Some(transcript)))
            },
            Some(path) => {
                tracing::warn!(path = %path.display(), "Transcript not found");
                Ok((Vec::new(), None))
            },
            None => Ok((Vec::new(), None)),
        }
    }

    /// `message_count` overrides the event count when a transcript was read.
    fn summarize(
        &self,
        session_id: &str,
        events: &[Event],
        message_count: Option<u64>,
    ) -> Result<()> {
        if self.store.has_summary(session_id) {
            tracing::info!(session_id, "Summary already written; skipping");
            return Ok(());
        }

        let timeline = reconstruct(events)?;
        let mut summary = self.renderer.render_now(&timeline);
        if let Some(count) = message_count {
            summary = summary.with_message_count(count);
        }

        if self.features.narration {
            if let Some(narrator) = &self.narrator {
                summary.narrative =
                    narrate_with_timeout(Arc::clone(narrator), summary.clone(), self.narration_timeout);
            }
        }

        let record = self.renderer.record(&summary)?;
        let report = self.renderer.report(&summary);
        match self.store.write_summary(session_id, &record, &report) {
            Ok(_) => Ok(()),
            Err(Error::SummaryAlreadyWritten { .. }) => {
                tracing::info!(session_id, "Summary already written; skipping");
                Ok(())
            },
            Err(e) => Err(e),
        }
    }
}

impl HookHandler for StopHandler {
    fn event_type(&self) -> &'static str {
        "Stop"
    }

    #[instrument(skip(self, input), fields(hook = "Stop", session_id = tracing::field::Empty))]
    fn handle(&self, input: &str) -> Result<Option<String>> {
        let raw: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| Error::InvalidInput(format!("stop hook input is not valid JSON: {e}")))?;
        let parsed: StopInput = serde_json::from_value(raw.clone())
            .map_err(|e| Error::InvalidInput(format!("unexpected stop hook input: {e}")))?;

        let session_id = parsed
            .session_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("stop hook input has no session_id".to_string()))?;
        tracing::Span::current().record("session_id", session_id.as_str());

        if parsed.stop_hook_active {
            tracing::debug!("Stop hook re-entered while already active");
        }

        if !self.features.persists_anything() {
            tracing::debug!(session_id, "All session outputs disabled");
            return Ok(None);
        }

        if self.features.hook_log {
            self.store.append_hook_log(&session_id, &raw)?;
        }

        let (events, transcript) = Self::collect_events(parsed)?;

        if self.features.chat_copy {
            if let Some(transcript) = transcript.as_ref().filter(|t| !t.is_empty()) {
                self.store.write_chat(&session_id, transcript.entries())?;
            }
        }

        if !self.features.summary {
            return Ok(None);
        }
        if events.is_empty() {
            tracing::debug!(session_id, "No events to summarize");
            return Ok(None);
        }

        let message_count = transcript.as_ref().map(Transcript::message_count);
        self.summarize(&session_id, &events, message_count)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{CHAT_COPY_NAME, HOOK_LOG_NAME, SUMMARY_RECORD_NAME, SUMMARY_REPORT_NAME};
    use tempfile::TempDir;

    fn handler(dir: &TempDir) -> StopHandler {
        StopHandler::new(SessionStore::new(dir.path())).with_features(FeatureFlags::all())
    }

    const EVENTS_INPUT: &str = r#"{
        "session_id": "abc",
        "events": [
            {"sequence": 1, "type": "user_message", "text": "add login form"},
            {"sequence": 2, "type": "tool_invocation", "tool": "Write",
             "target": {"path": "LoginForm.tsx", "operation": "write"}},
            {"sequence": 3, "type": "tool_result", "success": true, "invocation": 2},
            {"sequence": 4, "type": "user_message", "text": "add login form"}
        ]
    }"#;

    #[test]
    fn test_event_type() {
        let dir = TempDir::new().unwrap();
        assert_eq!(handler(&dir).event_type(), "Stop");
    }

    #[test]
    fn test_writes_summary_from_events() {
        let dir = TempDir::new().unwrap();
        let output = handler(&dir).handle(EVENTS_INPUT).unwrap();
        assert!(output.is_none());

        let session_dir = dir.path().join("abc");
        let record: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(session_dir.join(SUMMARY_RECORD_NAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(record["requests"], serde_json::json!(["add login form"]));
        assert_eq!(record["statistics"]["files_modified"], 1);
        assert!(session_dir.join(SUMMARY_REPORT_NAME).exists());
        assert!(session_dir.join(HOOK_LOG_NAME).exists());
    }

    #[test]
    fn test_second_stop_does_not_rewrite_summary() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        handler.handle(EVENTS_INPUT).unwrap();
        let path = dir.path().join("abc").join(SUMMARY_RECORD_NAME);
        let first = std::fs::read_to_string(&path).unwrap();

        handler.handle(EVENTS_INPUT).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);

        let log: Vec<serde_json::Value> = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("abc").join(HOOK_LOG_NAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_missing_session_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = handler(&dir).handle(r#"{"events": []}"#);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_out_of_order_events_fail() {
        let dir = TempDir::new().unwrap();
        let input = r#"{"session_id": "s", "events": [
            {"sequence": 1, "type": "notification", "message": "a"},
            {"sequence": 3, "type": "notification", "message": "b"},
            {"sequence": 2, "type": "notification", "message": "c"}
        ]}"#;
        let result = handler(&dir).handle(input);
        assert!(matches!(result, Err(Error::OutOfOrderEvent { previous: 3, found: 2 })));
        assert!(!dir.path().join("s").join(SUMMARY_RECORD_NAME).exists());
    }

    #[test]
    fn test_transcript_and_chat_copy() {
        let dir = TempDir::new().unwrap();
        let transcript = dir.path().join("t.jsonl");
        std::fs::write(
            &transcript,
            "{\"type\":\"user\",\"message\":{\"role\":\"user\",\"content\":\"write docs\"}}\n",
        )
        .unwrap();
        let input = serde_json::json!({
            "session_id": "t1",
            "transcript_path": transcript,
        })
        .to_string();

        handler(&dir).handle(&input).unwrap();
        assert!(dir.path().join("t1").join(CHAT_COPY_NAME).exists());
        let report =
            std::fs::read_to_string(dir.path().join("t1").join(SUMMARY_REPORT_NAME)).unwrap();
        assert!(report.contains("  1. write docs"));
    }

    #[test]
    fn test_transcript_message_count_is_entry_count() {
        let dir = TempDir::new().unwrap();
        let transcript = dir.path().join("t.jsonl");
        // One assistant entry carries two blocks, so entries and events differ.
        let lines = [
            r#"{"type":"user","message":{"role":"user","content":"add login form"}}"#,
            r#"{"type":"assistant","message":{"role":"assistant","content":[{"type":"text","text":"On it."},{"type":"tool_use","id":"t1","name":"Write","input":{"file_path":"a.tsx"}}]}}"#,
            r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"ok"}]}}"#,
        ];
        std::fs::write(&transcript, lines.join("\n")).unwrap();
        let input = serde_json::json!({
            "session_id": "t2",
            "transcript_path": transcript,
        })
        .to_string();

        handler(&dir).handle(&input).unwrap();
        let record: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("t2").join(SUMMARY_RECORD_NAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(record["statistics"]["total_messages"], 3);
    }

    #[test]
    fn test_event_input_counts_events() {
        let dir = TempDir::new().unwrap();
        handler(&dir).handle(EVENTS_INPUT).unwrap();
        let record: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("abc").join(SUMMARY_RECORD_NAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(record["statistics"]["total_messages"], 4);
    }

    #[test]
    fn test_disabled_features_write_nothing() {
        let dir = TempDir::new().unwrap();
        let handler =
            StopHandler::new(SessionStore::new(dir.path())).with_features(FeatureFlags::none());
        handler.handle(EVENTS_INPUT).unwrap();
        assert!(!dir.path().join("abc").exists());
    }
}
