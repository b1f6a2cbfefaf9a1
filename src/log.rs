//! Operator log: the durable record of every synchronisation step.
//!
//! Each event is one line, `<YYYY-MM-DD HH:MM:SS> - <message>`, appended to
//! the log file and echoed to stdout. The file is opened, appended and
//! closed per event, so an external `tail -f` always sees whole lines and
//! history is never truncated.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Result, SyncError};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator written under the start and finish markers.
pub const SEPARATOR: &str = "-------------------------------------------------------------------";

pub const START_MARKER: &str = "Starting synchronisation";
pub const FINISH_MARKER: &str = "Synchronisation finished";

/// One timestamped log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{} - {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }
}

/// Append-only log sink backed by a file, mirrored to the console.
#[derive(Debug, Clone)]
pub struct SyncLog {
    path: PathBuf,
    echo: bool,
}

impl SyncLog {
    /// Open (or create) the log file for appending.
    ///
    /// Fails with `SyncError::LogSink` when the file cannot be created or
    /// opened, which callers treat as fatal.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let log = Self {
            path: path.into(),
            echo: true,
        };
        log.touch()?;
        Ok(log)
    }

    /// Disable the stdout echo (file output only).
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the log file exists again, e.g. after it was deleted between ticks.
    pub fn touch(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SyncError::LogSink {
                path: self.path.clone(),
                source,
            })?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map(drop)
            .map_err(|source| SyncError::LogSink {
                path: self.path.clone(),
                source,
            })
    }

    /// Append one event and echo it.
    pub fn record(&self, message: impl Into<String>) -> Result<LogEvent> {
        let event = LogEvent::new(message);
        let line = event.render();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| SyncError::LogSink {
                path: self.path.clone(),
                source,
            })?;
        // Single write so the line lands whole
        file.write_all(format!("{}\n", line).as_bytes())
            .map_err(|source| SyncError::LogSink {
                path: self.path.clone(),
                source,
            })?;

        if self.echo {
            println!("{}", line);
        }
        Ok(event)
    }

    pub fn start_marker(&self) -> Result<LogEvent> {
        self.record(format!("{}\n{}", START_MARKER, SEPARATOR))
    }

    pub fn finish_marker(&self) -> Result<LogEvent> {
        self.record(format!("{}\n{}", FINISH_MARKER, SEPARATOR))
    }
}
