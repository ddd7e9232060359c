use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// Append-only audit trail consumed by the processors.
///
/// Strictly best-effort: a sink must never fail a transaction, so the
/// interface has no error channel. Implementations report their own trouble
/// through tracing and move on.
pub trait AuditSink: Send + Sync {
    fn append(&self, timestamp: DateTime<Utc>, message: &str);
}

#[derive(Serialize)]
struct AuditRecord<'a> {
    #[serde(rename = "Timestamp")]
    timestamp: DateTime<Utc>,
    #[serde(rename = "Message")]
    message: &'a str
}

/// Writes one JSON object per line, `logs.json` style.
pub struct FileAuditSink {
    file: Mutex<File>
}

impl FileAuditSink {
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            file: Mutex::new(file)
        })
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, timestamp: DateTime<Utc>, message: &str) {
        let record = AuditRecord { timestamp, message };

        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(err) => {
                warn!("Audit record could not be serialized: {err}");
                return;
            }
        };

        match self.file.lock() {
            Ok(mut file) => {
                if let Err(err) = writeln!(file, "{line}") {
                    warn!("Audit log write failed: {err}");
                }
            }
            Err(_) => warn!("Audit log mutex poisoned, entry dropped")
        }
    }
}

/// Swallows every entry; used where no audit trail is wanted.
pub struct DiscardAuditSink;

impl AuditSink for DiscardAuditSink {
    fn append(&self, _timestamp: DateTime<Utc>, _message: &str) {}
}
