use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::fs::types::{Entry, EntryKind, Snapshot};

pub struct LocalFs;

impl LocalFs {
    /// List the immediate children of `path`.
    ///
    /// Subdirectories are recorded as `EntryKind::Other` and not descended
    /// into. Symlinks are classified by what they point to.
    pub fn snapshot(path: &Path) -> Result<Snapshot> {
        let read_dir = fs::read_dir(path)
            .map_err(|e| SyncError::from_io_error(e, "listing directory", path))?;

        let mut snapshot = Snapshot::new(path);
        for entry in read_dir {
            let entry = entry.map_err(|e| SyncError::from_io_error(e, "listing directory", path))?;
            let entry_path = entry.path();

            let kind = match fs::metadata(&entry_path) {
                Ok(meta) if meta.is_file() => EntryKind::File,
                _ => EntryKind::Other,
            };

            snapshot.insert(Entry {
                name: entry.file_name(),
                path: entry_path,
                kind,
            });
        }

        debug!(dir = %path.display(), entries = snapshot.len(), "Snapshot taken");
        Ok(snapshot)
    }

    /// Create `path` (and parents) if it does not exist. Returns whether it was created.
    pub fn ensure_dir(path: &Path) -> Result<bool> {
        if path.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(path).map_err(|e| SyncError::from_io_error(e, "creating directory", path))?;
        Ok(true)
    }

    /// Copy a regular file's bytes, permissions and modification time onto `to`.
    ///
    /// The data lands in a temporary file next to `to` and is renamed over it,
    /// so readers of `to` see either the old or the new content. Returns the
    /// number of bytes copied.
    pub fn copy_file_atomic(from: &Path, to: &Path) -> Result<u64> {
        let meta = fs::metadata(from).map_err(|e| SyncError::from_io_error(e, "copying", from))?;
        if !meta.is_file() {
            return Err(SyncError::UnsupportedEntry {
                path: from.to_path_buf(),
                operation: "copying".to_string(),
            });
        }

        let temp_path = temp_path_for(to);
        let result = Self::copy_via_temp(from, &temp_path, to, &meta);
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn copy_via_temp(from: &Path, temp_path: &Path, to: &Path, meta: &fs::Metadata) -> Result<u64> {
        let mut source = File::open(from).map_err(|e| SyncError::from_io_error(e, "copying", from))?;
        let mut temp = File::create(temp_path).map_err(|e| SyncError::from_io_error(e, "copying", temp_path))?;

        let bytes = io::copy(&mut source, &mut temp).map_err(|e| SyncError::from_io_error(e, "copying", from))?;

        if let Ok(modified) = meta.modified() {
            temp.set_modified(modified)
                .map_err(|e| SyncError::from_io_error(e, "setting modification time", temp_path))?;
        }
        drop(temp);

        // Permissions last: a read-only source would otherwise lock us out of the temp file
        fs::set_permissions(temp_path, meta.permissions())
            .map_err(|e| SyncError::from_io_error(e, "setting permissions", temp_path))?;

        fs::rename(temp_path, to).map_err(|e| SyncError::from_io_error(e, "replacing", to))?;
        Ok(bytes)
    }

    /// Remove a replica file. Directories are refused rather than removed recursively.
    pub fn remove_file(path: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| SyncError::from_io_error(e, "removing", path))?;
        if meta.is_dir() {
            return Err(SyncError::UnsupportedEntry {
                path: path.to_path_buf(),
                operation: "removing".to_string(),
            });
        }
        fs::remove_file(path).map_err(|e| SyncError::from_io_error(e, "removing", path))
    }
}

/// Hidden sibling of `target` tagged with the process id, on the same filesystem.
fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or_default());
    name.push(format!(".{}.tmp", std::process::id()));
    target.with_file_name(name)
}
