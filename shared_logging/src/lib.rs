#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured JSON logging shared by the timeline and aggregation crates.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Log severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Routine operational events.
    Info,
    /// Recoverable anomalies.
    Warn,
    /// Failures.
    Error,
}

/// One structured log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Capture time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Emitting component (e.g. `timeline-store`).
    pub component: String,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Structured context fields.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl LogRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(component: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.into(),
            level,
            message: message.into(),
            fields: serde_json::Map::new(),
        }
    }

    /// Attaches structured fields taken from a JSON object value.
    /// Non-object values are stored under a single `payload` key.
    #[must_use]
    pub fn with_fields(mut self, value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => self.fields = map,
            serde_json::Value::Null => {}
            other => {
                self.fields.insert("payload".into(), other);
            }
        }
        self
    }
}

/// Append-only JSON-lines logger shared across threads.
#[derive(Debug)]
pub struct JsonLogger {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonLogger {
    /// Opens (or creates) the log file, creating parent directories as needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Appends one record as a JSON line and flushes it.
    pub fn record(&self, record: &LogRecord) -> Result<()> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn records_json_lines() {
        let dir = tempdir().unwrap();
        let logger = JsonLogger::new(dir.path().join("timeline.log")).unwrap();
        logger
            .record(
                &LogRecord::new("timeline-store", LogLevel::Info, "node created")
                    .with_fields(serde_json::json!({ "kind": "activity" })),
            )
            .unwrap();
        logger
            .record(&LogRecord::new("timeline-store", LogLevel::Warn, "purged link"))
            .unwrap();
        let content = fs::read_to_string(logger.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"message\":\"node created\""));
        assert!(content.contains("\"kind\":\"activity\""));
    }

    #[test]
    fn scalar_fields_land_under_payload() {
        let record = LogRecord::new("aggregation", LogLevel::Debug, "query")
            .with_fields(serde_json::json!(42));
        assert_eq!(record.fields.get("payload"), Some(&serde_json::json!(42)));
    }
}
