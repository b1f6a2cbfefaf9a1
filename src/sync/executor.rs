//! Applies planned actions to the replica.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::fs::LocalFs;
use crate::sync::engine::SyncAction;

/// Result of applying one action.
#[derive(Debug)]
pub enum ActionOutcome {
    /// New file written to the replica.
    Copied { source: PathBuf, bytes: u64 },
    /// Existing replica file replaced.
    Updated { source: PathBuf, bytes: u64 },
    /// Replica-only file deleted.
    Removed { replica: PathBuf },
    /// Dry run: what would have happened.
    Planned(SyncAction),
    /// Skippable failure; the rest of the tick carries on.
    Failed { action: SyncAction, error: SyncError },
}

impl ActionOutcome {
    /// Log line for this outcome.
    pub fn message(&self) -> String {
        match self {
            Self::Copied { source, .. } => format!("Copied \"{}\"", source.display()),
            Self::Updated { source, .. } => format!("Updated \"{}\"", source.display()),
            Self::Removed { replica } => format!("Removed \"{}\"", replica.display()),
            Self::Planned(action) => match action {
                SyncAction::Copy { source, .. } => format!("Would copy \"{}\"", source.display()),
                SyncAction::Overwrite { source, .. } => format!("Would update \"{}\"", source.display()),
                SyncAction::Delete { replica, .. } => format!("Would remove \"{}\"", replica.display()),
            },
            Self::Failed { action, error } => {
                let verb = match action {
                    SyncAction::Copy { .. } => "copy",
                    SyncAction::Overwrite { .. } => "update",
                    SyncAction::Delete { .. } => "remove",
                };
                format!("Failed to {} \"{}\": {}", verb, action.replica_path().display(), error)
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    dry_run: bool,
}

impl Executor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Apply one action.
    ///
    /// Permission problems, files that vanished and non-regular entries come
    /// back as `ActionOutcome::Failed`. Any other error is returned and
    /// aborts the tick.
    pub fn execute(&self, action: &SyncAction) -> Result<ActionOutcome> {
        if self.dry_run {
            return Ok(ActionOutcome::Planned(action.clone()));
        }

        let result = match action {
            SyncAction::Copy { source, replica, .. } => {
                LocalFs::copy_file_atomic(source, replica).map(|bytes| ActionOutcome::Copied {
                    source: source.clone(),
                    bytes,
                })
            }
            SyncAction::Overwrite { source, replica, .. } => {
                LocalFs::copy_file_atomic(source, replica).map(|bytes| ActionOutcome::Updated {
                    source: source.clone(),
                    bytes,
                })
            }
            SyncAction::Delete { replica, .. } => LocalFs::remove_file(replica).map(|()| ActionOutcome::Removed {
                replica: replica.clone(),
            }),
        };

        match result {
            Ok(outcome) => {
                debug!(name = ?action.name(), outcome = ?outcome, "Action applied");
                Ok(outcome)
            }
            Err(error) if error.is_recoverable() => {
                warn!(name = ?action.name(), error = %error, "Action skipped");
                Ok(ActionOutcome::Failed {
                    action: action.clone(),
                    error,
                })
            }
            Err(error) => Err(error),
        }
    }
}
