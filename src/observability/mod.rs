//! Observability and telemetry.
//!
//! Logs go to stderr (or a file) because stdout carries hook responses.
//! Metrics are emitted through the `metrics` facade; no exporter is
//! installed here, so counters are no-ops unless the embedding process
//! installs a recorder.

mod request_context;

pub use request_context::{
    RequestContext, RequestContextGuard, current_request_id, enter_request_context,
};

use crate::config::LoggingSettings;
use crate::{Error, Result};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Env var holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "HOOKWISE_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Options for initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Picks the filter directive.
///
/// `HOOKWISE_LOG` wins, then `--verbose`, then the configured level, then
/// `RUST_LOG`, then `info`.
#[must_use]
pub fn filter_directive(
    settings: &LoggingSettings,
    options: InitOptions,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    non_empty(lookup(LOG_FILTER_ENV))
        .or_else(|| options.verbose.then(|| "debug".to_string()))
        .or_else(|| non_empty(settings.level.clone()))
        .or_else(|| non_empty(lookup("RUST_LOG")))
        .unwrap_or_else(|| "info".to_string())
}

/// Initializes logging for the process.
///
/// # Errors
///
/// Returns an error if logging has already been initialized or the log
/// file cannot be opened.
pub fn init(settings: &LoggingSettings, options: InitOptions) -> Result<()> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "observability already initialized".to_string(),
        });
    }

    let directive = filter_directive(settings, options, |key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        // The subscriber is not up yet, so this cannot be logged.
        let _ = writeln!(io::stderr(), "hookwise: invalid log filter {directive:?}: {e}");
        EnvFilter::new("info")
    });

    let to_file = settings.file.is_some();
    let writer = match &settings.file {
        Some(path) => BoxMakeWriter::new(open_log_file(path)?),
        None => BoxMakeWriter::new(io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(writer).with_ansi(!to_file))
            .try_init(),
    };
    installed.map_err(init_error)?;

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "failed to mark observability initialized".to_string(),
        })
}

/// Shared append handle to the log file.
#[derive(Clone)]
struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl LogFileWriter {
    fn with_file<T>(&self, f: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        f(&mut file)
    }
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(File::flush)
    }
}

impl<'a> fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Opens a log file for appending.
fn open_log_file(path: &Path) -> Result<LogFileWriter> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_log_dir".to_string(),
            cause: e.to_string(),
        })?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::OperationFailed {
            operation: "open_log_file".to_string(),
            cause: format!("{}: {}", path.display(), e),
        })?;

    Ok(LogFileWriter {
        file: Arc::new(Mutex::new(file)),
    })
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("bogus"), LogFormat::Pretty);
    }

    #[test]
    fn test_filter_directive_precedence() {
        let settings = LoggingSettings {
            level: Some("warn".to_string()),
            ..LoggingSettings::default()
        };
        let verbose = InitOptions { verbose: true };

        assert_eq!(filter_directive(&LoggingSettings::default(), InitOptions::default(), no_env), "info");
        assert_eq!(filter_directive(&settings, InitOptions::default(), no_env), "warn");
        assert_eq!(filter_directive(&settings, verbose, no_env), "debug");
        assert_eq!(
            filter_directive(&settings, verbose, |k| (k == LOG_FILTER_ENV).then(|| "trace".to_string())),
            "trace"
        );
        assert_eq!(
            filter_directive(&LoggingSettings::default(), InitOptions::default(), |k| {
                (k == "RUST_LOG").then(|| "error".to_string())
            }),
            "error"
        );
    }

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("hookwise.log");
        let mut writer = open_log_file(&path).unwrap();
        writer.write_all(b"line\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "line\n");
    }
}
