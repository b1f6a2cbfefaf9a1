//! Reconciliation: decides what must happen to the replica.
//!
//! Change detection compares content fingerprints, never timestamps. The
//! plan lists every copy and overwrite before any delete, so content that
//! moved to a new name in the source is written under that name before the
//! old replica copy goes away.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::SyncError;
use crate::fs::Snapshot;
use crate::hash::Fingerprinter;

/// One planned mutation of the replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Name exists only in the source.
    Copy {
        name: OsString,
        source: PathBuf,
        replica: PathBuf,
    },
    /// Name exists on both sides with different content.
    Overwrite {
        name: OsString,
        source: PathBuf,
        replica: PathBuf,
    },
    /// Name exists only in the replica.
    Delete { name: OsString, replica: PathBuf },
}

impl SyncAction {
    pub fn name(&self) -> &OsStr {
        match self {
            Self::Copy { name, .. } | Self::Overwrite { name, .. } | Self::Delete { name, .. } => name,
        }
    }

    /// Replica location the action writes or removes.
    pub fn replica_path(&self) -> &Path {
        match self {
            Self::Copy { replica, .. } | Self::Overwrite { replica, .. } | Self::Delete { replica, .. } => {
                replica
            }
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }
}

/// Output of one reconciliation.
#[derive(Debug, Default)]
pub struct Plan {
    /// Actions in execution order.
    pub actions: Vec<SyncAction>,
    /// Names whose action was dropped because fingerprinting failed.
    pub issues: Vec<SyncError>,
    /// Names already in sync.
    pub unchanged: usize,
}

/// Compares a source snapshot against a replica snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    fingerprinter: Fingerprinter,
}

impl Reconciler {
    pub fn new(fingerprinter: Fingerprinter) -> Self {
        Self { fingerprinter }
    }

    /// Plan the actions that make `replica` match `source`.
    pub fn reconcile(&self, source: &Snapshot, replica: &Snapshot) -> Plan {
        let mut plan = Plan::default();

        for (name, entry) in source.iter() {
            match replica.get(name) {
                None => plan.actions.push(SyncAction::Copy {
                    name: name.clone(),
                    source: entry.path.clone(),
                    replica: replica.path_for(name),
                }),
                Some(existing) if !entry.is_file() || !existing.is_file() => {
                    let path = if entry.is_file() { &existing.path } else { &entry.path };
                    plan.issues.push(SyncError::UnsupportedEntry {
                        path: path.clone(),
                        operation: "comparing".to_string(),
                    });
                }
                Some(existing) => match self.differs(&entry.path, &existing.path) {
                    Ok(true) => plan.actions.push(SyncAction::Overwrite {
                        name: name.clone(),
                        source: entry.path.clone(),
                        replica: existing.path.clone(),
                    }),
                    Ok(false) => plan.unchanged += 1,
                    Err(err) => {
                        warn!(name = ?name, error = %err, "Dropping action, fingerprint failed");
                        plan.issues.push(err);
                    }
                },
            }
        }

        for (name, entry) in replica.iter() {
            if !source.contains(name) {
                plan.actions.push(SyncAction::Delete {
                    name: name.clone(),
                    replica: entry.path.clone(),
                });
            }
        }

        debug!(
            actions = plan.actions.len(),
            unchanged = plan.unchanged,
            issues = plan.issues.len(),
            "Reconciled"
        );
        plan
    }

    fn differs(&self, source: &Path, replica: &Path) -> Result<bool, SyncError> {
        let source_fp = self.fingerprinter.fingerprint(source)?;
        let replica_fp = self.fingerprinter.fingerprint(replica)?;
        Ok(source_fp != replica_fp)
    }
}
