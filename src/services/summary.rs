//! Session summary rendering.
//!
//! A [`SessionTimeline`] is rendered once into a [`SessionSummary`]. Two
//! representations come out of that value: the structured record (pretty
//! JSON of every field) and the human-readable report. The report only
//! shortens or omits items for display; it never adds data the record
//! lacks, and its statistics are copied from the record verbatim.

use crate::models::{FileTouch, SessionStatistics, SessionSummary, SessionTimeline};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const RULE_WIDTH: usize = 60;
const MAX_REQUEST_CHARS: usize = 200;
const MAX_COMMAND_CHARS: usize = 100;
const MAX_ERROR_CHARS: usize = 100;

/// How many items each report section lists before eliding the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLimits {
    /// Requests listed.
    pub max_requests_shown: usize,
    /// File touches listed.
    pub max_files_shown: usize,
    /// Commands listed.
    pub max_commands_shown: usize,
    /// Errors listed.
    pub max_errors_shown: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            max_requests_shown: 5,
            max_files_shown: 10,
            max_commands_shown: 5,
            max_errors_shown: 3,
        }
    }
}

/// Renders timelines into summaries, records and reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryRenderer {
    limits: ReportLimits,
}

impl SummaryRenderer {
    /// Creates a renderer with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the report limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: ReportLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Builds the summary for `timeline`, stamped with `generated_at`.
    ///
    /// Apart from the supplied timestamp the output depends only on the
    /// timeline.
    #[must_use]
    pub fn render(&self, timeline: &SessionTimeline, generated_at: DateTime<Utc>) -> SessionSummary {
        let files_touched = timeline
            .files_touched
            .iter()
            .flat_map(|(path, ops)| {
                ops.iter().map(move |op| FileTouch {
                    path: path.clone(),
                    operation: *op,
                    icon_class: (*op).into(),
                })
            })
            .collect();

        let statistics = SessionStatistics {
            total_messages: timeline.event_count,
            files_modified: count(timeline.modified_files()),
            files_read: count(timeline.read_files()),
            commands_run: count(timeline.commands.iter()),
        };

        SessionSummary {
            generated_at,
            requests: timeline.requests.clone(),
            files_touched,
            tool_counts: timeline.tool_counts.clone(),
            commands: timeline.commands.clone(),
            errors: timeline.errors.clone(),
            statistics,
            narrative: None,
        }
    }

    /// Builds the summary, capturing the current time once.
    #[must_use]
    pub fn render_now(&self, timeline: &SessionTimeline) -> SessionSummary {
        self.render(timeline, Utc::now())
    }

    /// Serializes the structured record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn record(&self, summary: &SessionSummary) -> Result<String> {
        serde_json::to_string_pretty(summary).map_err(|e| Error::OperationFailed {
            operation: "serialize_summary".to_string(),
            cause: e.to_string(),
        })
    }

    /// Formats the human-readable report.
    #[must_use]
    pub fn report(&self, summary: &SessionSummary) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![
            rule.clone(),
            "SESSION SUMMARY".to_string(),
            rule.clone(),
            format!(
                "Generated: {}",
                summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            String::new(),
        ];

        if !summary.requests.is_empty() {
            lines.push("## What Was Requested".to_string());
            for (i, request) in summary
                .requests
                .iter()
                .take(self.limits.max_requests_shown)
                .enumerate()
            {
                let cleaned = collapse_whitespace(request);
                lines.push(format!("  {}. {}", i + 1, truncate(&cleaned, MAX_REQUEST_CHARS)));
            }
            push_elided(&mut lines, summary.requests.len(), self.limits.max_requests_shown, "prompts");
            lines.push(String::new());
        }

        if !summary.files_touched.is_empty() {
            lines.push("## Files Touched".to_string());
            for touch in summary.files_touched.iter().take(self.limits.max_files_shown) {
                lines.push(format!(
                    "  {}  {} ({})",
                    touch.icon_class.glyph(),
                    touch.path,
                    touch.operation
                ));
            }
            push_elided(&mut lines, summary.files_touched.len(), self.limits.max_files_shown, "files");
            lines.push(String::new());
        }

        if !summary.tool_counts.is_empty() {
            lines.push("## Tools Used".to_string());
            let tools: Vec<String> = summary
                .tool_counts
                .iter()
                .map(|(tool, n)| format!("{tool} ({n})"))
                .collect();
            lines.push(format!("  {}", tools.join(", ")));
            lines.push(String::new());
        }

        if !summary.commands.is_empty() {
            lines.push("## Commands Executed".to_string());
            for command in summary.commands.iter().take(self.limits.max_commands_shown) {
                lines.push(format!("  $ {}", truncate(command, MAX_COMMAND_CHARS)));
            }
            push_elided(&mut lines, summary.commands.len(), self.limits.max_commands_shown, "commands");
            lines.push(String::new());
        }

        if !summary.errors.is_empty() {
            lines.push("## Errors Encountered".to_string());
            for error in summary.errors.iter().take(self.limits.max_errors_shown) {
                let message = collapse_whitespace(&error.message);
                lines.push(format!(
                    "  ⚠️  [{}] {}",
                    error.tool_name,
                    truncate(&message, MAX_ERROR_CHARS)
                ));
            }
            push_elided(&mut lines, summary.errors.len(), self.limits.max_errors_shown, "errors");
            lines.push(String::new());
        }

        if let Some(narrative) = summary.narrative.as_deref() {
            lines.push("## Narrative".to_string());
            lines.extend(narrative.lines().map(|l| format!("  {l}")));
            lines.push(String::new());
        }

        let stats = &summary.statistics;
        lines.push("## Statistics".to_string());
        lines.push(format!("  • Total messages: {}", stats.total_messages));
        lines.push(format!("  • Files modified: {}", stats.files_modified));
        lines.push(format!("  • Files read: {}", stats.files_read));
        lines.push(format!("  • Commands run: {}", stats.commands_run));
        lines.push(String::new());
        lines.push(rule);

        lines.join("\n")
    }
}

fn count<I: Iterator>(iter: I) -> u64 {
    u64::try_from(iter.count()).unwrap_or(u64::MAX)
}

fn push_elided(lines: &mut Vec<String>, total: usize, shown: usize, noun: &str) {
    if total > shown {
        lines.push(format!("  ... and {} more {noun}", total - shown));
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to `max` characters, appending `...` when shortened.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, FileOperation, IconClass};
    use crate::services::reconstruct;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    fn sample_timeline() -> SessionTimeline {
        reconstruct(&[
            Event::user_message(1, "add login form"),
            Event::file_tool(2, "Read", "src/App.tsx", FileOperation::Read),
            Event::file_tool(3, "Write", "src/LoginForm.tsx", FileOperation::Write),
            Event::file_tool(4, "Edit", "src/LoginForm.tsx", FileOperation::Edit),
            Event::command(5, "Bash", "npm test"),
            Event::failure(6, Some(5), "1 test failed"),
            Event::user_message(7, "fix the failing test"),
        ])
        .unwrap()
    }

    fn stat_from_report(report: &str, label: &str) -> u64 {
        let prefix = format!("  • {label}: ");
        report
            .lines()
            .find_map(|l| l.strip_prefix(&prefix))
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_render_flattens_file_touches() {
        let summary = SummaryRenderer::new().render(&sample_timeline(), fixed_time());
        let touches: Vec<(&str, IconClass)> = summary
            .files_touched
            .iter()
            .map(|t| (t.path.as_str(), t.icon_class))
            .collect();
        assert_eq!(
            touches,
            vec![
                ("src/App.tsx", IconClass::FileRead),
                ("src/LoginForm.tsx", IconClass::FileWrite),
                ("src/LoginForm.tsx", IconClass::FileEdit),
            ]
        );
        assert_eq!(
            summary.statistics,
            SessionStatistics {
                total_messages: 7,
                files_modified: 1,
                files_read: 1,
                commands_run: 1,
            }
        );
    }

    #[test]
    fn test_render_is_pure() {
        let renderer = SummaryRenderer::new();
        let timeline = sample_timeline();
        assert_eq!(
            renderer.render(&timeline, fixed_time()),
            renderer.render(&timeline, fixed_time())
        );
    }

    #[test]
    fn test_report_statistics_match_record() {
        let renderer = SummaryRenderer::new();
        let summary = renderer.render(&sample_timeline(), fixed_time());
        let report = renderer.report(&summary);
        let record: serde_json::Value =
            serde_json::from_str(&renderer.record(&summary).unwrap()).unwrap();

        for (label, field) in [
            ("Total messages", "total_messages"),
            ("Files modified", "files_modified"),
            ("Files read", "files_read"),
            ("Commands run", "commands_run"),
        ] {
            assert_eq!(
                stat_from_report(&report, label),
                record["statistics"][field].as_u64().unwrap(),
                "{label}"
            );
        }
    }

    #[test]
    fn test_report_layout() {
        let renderer = SummaryRenderer::new();
        let report = renderer.report(&renderer.render(&sample_timeline(), fixed_time()));

        assert!(report.starts_with(&"=".repeat(60)));
        assert!(report.contains("Generated: 2026-03-14 09:26:53 UTC"));
        assert!(report.contains("  1. add login form"));
        assert!(report.contains("  2. fix the failing test"));
        assert!(report.contains("✏️  src/LoginForm.tsx (edit)"));
        assert!(report.contains("  Bash (1), Edit (1), Read (1), Write (1)"));
        assert!(report.contains("  $ npm test"));
        assert!(report.contains("⚠️  [Bash] 1 test failed"));
        assert!(!report.contains("## Narrative"));
    }

    #[test]
    fn test_report_elides_beyond_limits() {
        let events: Vec<Event> = (1..=8)
            .map(|i| Event::user_message(i, format!("request {i}")))
            .collect();
        let renderer = SummaryRenderer::new().with_limits(ReportLimits {
            max_requests_shown: 3,
            ..ReportLimits::default()
        });
        let summary = renderer.render(&reconstruct(&events).unwrap(), fixed_time());
        let report = renderer.report(&summary);

        assert!(report.contains("  3. request 3"));
        assert!(!report.contains("request 4"));
        assert!(report.contains("  ... and 5 more prompts"));
        assert_eq!(summary.requests.len(), 8);
    }

    #[test]
    fn test_report_truncates_long_text() {
        let long = "é".repeat(250);
        let summary = SummaryRenderer::new().render(
            &reconstruct(&[Event::user_message(1, long.clone())]).unwrap(),
            fixed_time(),
        );
        let report = SummaryRenderer::new().report(&summary);
        let expected = format!("  1. {}...", "é".repeat(200));
        assert!(report.lines().any(|l| l == expected));
        assert_eq!(summary.requests[0], long);
    }

    #[test]
    fn test_report_includes_narrative() {
        let renderer = SummaryRenderer::new();
        let mut summary = renderer.render(&sample_timeline(), fixed_time());
        summary.narrative = Some("Built a login form.\nOne test still fails.".to_string());
        let report = renderer.report(&summary);
        assert!(report.contains("## Narrative\n  Built a login form.\n  One test still fails."));

        let record = renderer.record(&summary).unwrap();
        assert!(record.contains("Built a login form."));
    }

    #[test]
    fn test_empty_timeline_renders_statistics_only() {
        let renderer = SummaryRenderer::new();
        let summary = renderer.render(&SessionTimeline::default(), fixed_time());
        let report = renderer.report(&summary);
        assert!(!report.contains("## What Was Requested"));
        assert_eq!(stat_from_report(&report, "Total messages"), 0);
    }

    #[test]
    fn test_truncate_boundaries() {
        assert_eq!(truncate("abc", 3), "abc");
        assert_eq!(truncate("abcd", 3), "abc...");
        assert_eq!(truncate("", 3), "");
    }
}
