// Centralized error handling module
// Error types carry the path and operation so every log line names what failed

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for mirroring operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{operation}: {} not found", .path.display())]
    NotFound { path: PathBuf, operation: String },

    #[error("{operation}: permission denied for {}", .path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("{operation}: I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Directories and other non-regular entries are not mirrored
    #[error("{operation}: {} is not a regular file", .path.display())]
    UnsupportedEntry { path: PathBuf, operation: String },

    #[error("unsupported hash algorithm: {algorithm} (expected md5, sha256 or blake3)")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("cannot open log file {}: {source}", .path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl SyncError {
    /// Build an error from an `io::Error`, mapping the kinds the executor
    /// treats as skippable onto their own variants.
    pub fn from_io_error(err: io::Error, operation: &str, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SyncError::NotFound {
                path: path.to_path_buf(),
                operation: operation.to_string(),
            },
            io::ErrorKind::PermissionDenied => SyncError::PermissionDenied {
                path: path.to_path_buf(),
                operation: operation.to_string(),
            },
            _ => SyncError::Io {
                path: path.to_path_buf(),
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// Whether a single action may fail with this error without aborting the tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::NotFound { .. }
                | SyncError::PermissionDenied { .. }
                | SyncError::UnsupportedEntry { .. }
        )
    }
}
