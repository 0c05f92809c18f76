//! Hook command handler.
//!
//! Hooks must never break the host session: every failure is logged and
//! the process still exits successfully with nothing on stdout.

use std::sync::Arc;
use std::time::Duration;

use hookwise::config::HookwiseConfig;
use hookwise::hooks::{HookHandler, StopHandler, UserPromptHandler};
use hookwise::llm::build_provider;
use hookwise::observability::{RequestContext, enter_request_context};
use hookwise::rules::RuleSet;
use hookwise::services::{LlmNarrator, SessionStore, SummaryRenderer};
use tracing::info_span;

use super::HookEvent;

/// Hook command.
pub fn cmd_hook(event: HookEvent, config: &HookwiseConfig) {
    let request_context = RequestContext::new();
    let request_id = request_context.request_id().to_string();
    let _request_guard = enter_request_context(request_context);
    let span = info_span!(
        "hookwise.hook.invoke",
        request_id = %request_id,
        component = "hooks",
        hook = event.as_str()
    );
    let _span_guard = span.enter();

    metrics::counter!("hookwise_hook_invocations_total", "hook" => event.as_str()).increment(1);

    let input = match read_hook_input() {
        Ok(input) => input,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read hook input");
            return;
        },
    };

    let handler = build_handler(event, config);
    match handler.handle(&input) {
        Ok(Some(response)) => println!("{response}"),
        Ok(None) => {},
        Err(e) => {
            metrics::counter!("hookwise_hook_failures_total", "hook" => event.as_str())
                .increment(1);
            tracing::error!(error = %e, hook = handler.event_type(), "Hook failed");
        },
    }
}

/// Builds the handler for `event` from configuration.
fn build_handler(event: HookEvent, config: &HookwiseConfig) -> Box<dyn HookHandler> {
    match event {
        HookEvent::UserPromptSubmit => {
            // Rejected rules are already logged while the catalog loads.
            let (rules, _report) = RuleSet::load_or_empty(config.rules_path.as_deref());
            Box::new(
                UserPromptHandler::new(Arc::new(rules)).with_classifier_config(config.classifier),
            )
        },
        HookEvent::Stop => {
            let mut handler = StopHandler::new(SessionStore::new(&config.data_dir))
                .with_renderer(SummaryRenderer::new().with_limits(config.summary))
                .with_features(config.features);
            if config.features.narration {
                if let Some(provider) = build_provider(&config.llm) {
                    handler = handler.with_narrator(
                        Arc::new(LlmNarrator::new(provider)),
                        Duration::from_millis(config.llm.timeout_ms),
                    );
                }
            }
            Box::new(handler)
        },
    }
}

/// Reads hook input from stdin as a string.
fn read_hook_input() -> std::io::Result<String> {
    use std::io::{self, Read};

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    if input.trim().is_empty() {
        Ok("{}".to_string())
    } else {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rejected_rule_is_logged_once() {
        let dir = TempDir::new().unwrap();
        let rules_path = dir.path().join("rules.yaml");
        std::fs::write(
            &rules_path,
            "good:\n  keywords: [form]\n  priority: high\nbroken:\n  keywords: 42\n",
        )
        .unwrap();
        let config = HookwiseConfig {
            rules_path: Some(rules_path),
            ..HookwiseConfig::default()
        };

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let handler = tracing::subscriber::with_default(subscriber, || {
            build_handler(HookEvent::UserPromptSubmit, &config)
        });

        assert_eq!(handler.event_type(), "UserPromptSubmit");
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("category=broken").count(), 1, "{output}");
    }
}
