//! Action audit trail.
//!
//! Every public automation operation is wrapped by [`instrument`]: one
//! `started` entry on entry, exactly one terminal `success` or `error`
//! entry on exit, with the wrapped call's result passed through untouched.
//! Entries are appended to an ordered per-session log and flushed to disk
//! before the wrapped call returns, so the log is durable up to the most
//! recently completed action.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AutomationError, Result};

/// Lifecycle of one instrumented action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Started,
    Success,
    Error,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Started => "started",
            ActionStatus::Success => "success",
            ActionStatus::Error => "error",
        }
    }
}

impl FromStr for ActionStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "started" => Ok(ActionStatus::Started),
            "success" => Ok(ActionStatus::Success),
            "error" => Ok(ActionStatus::Error),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// One appended, never edited, audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub action: String,
    pub arguments: String,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

struct LogSink {
    entries: Vec<ActionLogEntry>,
    file: Option<BufWriter<File>>,
}

/// Per-session audit logger.
///
/// The audit log is mutated only through this type; writes happen through
/// `&self` behind a mutex so the logger can be shared with the components it
/// observes.
pub struct ActionLogger {
    session_id: Uuid,
    path: Option<PathBuf>,
    sink: Mutex<LogSink>,
}

impl ActionLogger {
    /// Logger persisting to `<dir>/session_<timestamp>.jsonl`, one JSON
    /// record per line, flushed per entry.
    pub fn to_file(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| anyhow::anyhow!("failed to create log dir {}: {e}", dir.display()))?;

        let session_id = Uuid::new_v4();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("session_{timestamp}_{session_id}.jsonl"));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| anyhow::anyhow!("failed to open log file {}: {e}", path.display()))?;

        Ok(Self {
            session_id,
            path: Some(path),
            sink: Mutex::new(LogSink {
                entries: Vec::new(),
                file: Some(BufWriter::new(file)),
            }),
        })
    }

    /// Logger keeping entries in memory only.
    pub fn in_memory() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            path: None,
            sink: Mutex::new(LogSink {
                entries: Vec::new(),
                file: None,
            }),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Snapshot of the ordered entries recorded so far.
    pub fn entries(&self) -> Vec<ActionLogEntry> {
        self.sink
            .lock()
            .map(|s| s.entries.clone())
            .unwrap_or_default()
    }

    pub fn started(&self, action: &str, arguments: &str) {
        tracing::info!(action, arguments, "starting action");
        self.append(ActionLogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: format!("Starting action: {action}"),
            action: action.to_string(),
            arguments: arguments.to_string(),
            status: ActionStatus::Started,
            error: None,
            error_kind: None,
        });
    }

    pub fn success(&self, action: &str, arguments: &str) {
        tracing::info!(action, "action completed");
        self.append(ActionLogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: format!("Completed action: {action}"),
            action: action.to_string(),
            arguments: arguments.to_string(),
            status: ActionStatus::Success,
            error: None,
            error_kind: None,
        });
    }

    pub fn error(&self, action: &str, arguments: &str, error: &AutomationError) {
        tracing::error!(action, kind = error.kind(), %error, "action failed");
        self.append(ActionLogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Error,
            message: format!("Error in {action}: {error}"),
            action: action.to_string(),
            arguments: arguments.to_string(),
            status: ActionStatus::Error,
            error: Some(error.to_string()),
            error_kind: Some(error.kind().to_string()),
        });
    }

    /// Append and flush synchronously. Persistence trouble is reported but
    /// never fails the action being logged.
    fn append(&self, entry: ActionLogEntry) {
        let Ok(mut sink) = self.sink.lock() else {
            tracing::error!("audit log sink poisoned, dropping entry");
            return;
        };

        if let Some(file) = sink.file.as_mut() {
            let write = serde_json::to_string(&entry)
                .map_err(anyhow::Error::from)
                .and_then(|line| {
                    writeln!(file, "{line}")?;
                    file.flush()?;
                    Ok(())
                });
            if let Err(e) = write {
                tracing::error!(error = %e, "failed to persist audit entry");
            }
        }

        sink.entries.push(entry);
    }
}

/// Wrap an automation call with start/success/error logging.
///
/// Observes but never intercepts: the return value is passed through
/// unchanged and failures re-raise unmodified after being recorded.
pub fn instrument<T, F>(
    logger: &ActionLogger,
    action: &str,
    arguments: impl Into<String>,
    f: F,
) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let arguments = arguments.into();
    logger.started(action, &arguments);

    match f() {
        Ok(value) => {
            logger.success(action, &arguments);
            Ok(value)
        }
        Err(error) => {
            logger.error(action, &arguments, &error);
            Err(error)
        }
    }
}
