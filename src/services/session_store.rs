//! Per-session durable storage.
//!
//! Every artifact lives under `{root}/{session_id}/`. The session id comes
//! from the host runtime and is only sanitized here, never generated.
//!
//! | File | Contents | Write mode |
//! |------|----------|------------|
//! | `session_summary.json` | structured record | staged, then renamed |
//! | `session_summary.txt` | human-readable report | staged, then linked once |
//! | `stop.json` | raw Stop hook inputs | append to JSON array |
//! | `chat.json` | parsed transcript entries | overwrite |

use crate::{Error, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Structured summary file name.
pub const SUMMARY_RECORD_NAME: &str = "session_summary.json";

/// Text report file name.
pub const SUMMARY_REPORT_NAME: &str = "session_summary.txt";

/// Stop hook input log file name.
pub const HOOK_LOG_NAME: &str = "stop.json";

/// Transcript copy file name.
pub const CHAT_COPY_NAME: &str = "chat.json";

/// Paths of a persisted summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPaths {
    /// Structured record.
    pub record: PathBuf,
    /// Text report.
    pub report: PathBuf,
}

/// Session-keyed artifact storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory for a session, without creating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the id has no usable characters.
    pub fn session_dir(&self, session_id: &str) -> Result<PathBuf> {
        Ok(self.root.join(sanitize_session_id(session_id)?))
    }

    /// Whether a complete summary has already been written for the session.
    ///
    /// The report is written last, so a record without a report is an
    /// interrupted write and does not count.
    #[must_use]
    pub fn has_summary(&self, session_id: &str) -> bool {
        self.session_dir(session_id).is_ok_and(|dir| {
            dir.join(SUMMARY_RECORD_NAME).exists() && dir.join(SUMMARY_REPORT_NAME).exists()
        })
    }

    /// Writes the summary record and report.
    ///
    /// Each file is staged under a temporary name first. The record then
    /// replaces any leftover from an interrupted write, and the report is
    /// linked into place only if it does not exist yet, so a session's
    /// summary is published exactly once and never half-written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SummaryAlreadyWritten`] if the report exists, or an
    /// I/O error wrapped in [`Error::OperationFailed`].
    pub fn write_summary(&self, session_id: &str, record: &str, report: &str) -> Result<SummaryPaths> {
        let dir = self.ensure_session_dir(session_id)?;
        let paths = SummaryPaths {
            record: dir.join(SUMMARY_RECORD_NAME),
            report: dir.join(SUMMARY_REPORT_NAME),
        };
        let already_written = || Error::SummaryAlreadyWritten {
            session_id: session_id.to_string(),
        };

        if paths.report.exists() {
            return Err(already_written());
        }

        let staged_record = stage(&dir, SUMMARY_RECORD_NAME, record)?;
        let renamed = std::fs::rename(&staged_record, &paths.record);
        if let Err(e) = renamed {
            let _ = std::fs::remove_file(&staged_record);
            return Err(write_failure(&paths.record, &e));
        }

        let staged_report = stage(&dir, SUMMARY_REPORT_NAME, report)?;
        let linked = std::fs::hard_link(&staged_report, &paths.report);
        let _ = std::fs::remove_file(&staged_report);
        match linked {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(already_written()),
            Err(e) => return Err(write_failure(&paths.report, &e)),
        }

        tracing::info!(
            session_id,
            record = %paths.record.display(),
            "Session summary written"
        );
        Ok(paths)
    }

    /// Appends a raw hook input to the session's `stop.json` array.
    ///
    /// An unreadable or non-array log is replaced by a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn append_hook_log(&self, session_id: &str, input: &Value) -> Result<PathBuf> {
        let path = self.ensure_session_dir(session_id)?.join(HOOK_LOG_NAME);

        let mut log: Vec<Value> = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        log.push(input.clone());

        write_json(&path, &log, "append_hook_log")?;
        Ok(path)
    }

    /// Writes the parsed transcript to `chat.json`, replacing any copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_chat(&self, session_id: &str, entries: &[Value]) -> Result<PathBuf> {
        let path = self.ensure_session_dir(session_id)?.join(CHAT_COPY_NAME);
        write_json(&path, entries, "write_chat")?;
        Ok(path)
    }

    fn ensure_session_dir(&self, session_id: &str) -> Result<PathBuf> {
        let dir = self.session_dir(session_id)?;
        std::fs::create_dir_all(&dir).map_err(|e| Error::OperationFailed {
            operation: "create_session_dir".to_string(),
            cause: format!("Cannot create {}: {e}", dir.display()),
        })?;
        Ok(dir)
    }
}

/// Bytes kept as-is in a session directory name. `%` is always escaped,
/// so distinct ids never share a directory.
const SESSION_ID_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Maps a host session id to a safe single path component.
///
/// Bytes outside `[A-Za-z0-9._-]` are percent-encoded, and a leading `.`
/// becomes `%2E` so the result is never hidden, `.` or `..`. Distinct ids
/// always map to distinct names.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the id is empty.
pub fn sanitize_session_id(session_id: &str) -> Result<String> {
    if session_id.is_empty() {
        return Err(Error::InvalidInput("session id is empty".to_string()));
    }
    let (prefix, rest) = match session_id.strip_prefix('.') {
        Some(rest) => ("%2E", rest),
        None => ("", session_id),
    };
    Ok(format!("{prefix}{}", utf8_percent_encode(rest, SESSION_ID_SET)))
}

/// Writes `content` to a fresh temporary file next to `name` in `dir`.
fn stage(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(format!(".{name}.{}.tmp", std::process::id()));
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .map_err(|e| write_failure(&path, &e))?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            let _ = std::fs::remove_file(&path);
            write_failure(&path, &e)
        })?;
    Ok(path)
}

fn write_failure(path: &Path, e: &std::io::Error) -> Error {
    Error::OperationFailed {
        operation: "write_summary".to_string(),
        cause: format!("{}: {e}", path.display()),
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T, operation: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}
