use std::collections::hash_map::{HashMap, Iter};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// What a directory entry is, as far as mirroring cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    /// Directories, sockets, broken links and anything else that is not a regular file
    Other,
}

/// One top-level item of a directory.
///
/// Names are kept as the OS hands them over; they need not be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: OsString,
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl Entry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Listing of one directory at one instant, keyed by entry name.
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: PathBuf,
    entries: HashMap<OsString, Entry>,
}

impl Snapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: impl AsRef<OsStr>) -> Option<&Entry> {
        self.entries.get(name.as_ref())
    }

    pub fn contains(&self, name: impl AsRef<OsStr>) -> bool {
        self.entries.contains_key(name.as_ref())
    }

    /// Location an entry called `name` has (or would have) in this directory.
    pub fn path_for(&self, name: impl AsRef<OsStr>) -> PathBuf {
        self.root.join(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> Iter<'_, OsString, Entry> {
        self.entries.iter()
    }
}
