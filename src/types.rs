//! Core data types used throughout the fru library
//!
//! This module contains the data model shared by the tree collaborators,
//! the differ, and the consumers of its output.
//!
//! ## Overview
//!
//! - **Traversal**: [`Entry`], [`EntryKind`], [`SpecialKind`] - what a tree
//!   reports for one node while it is being walked
//! - **Results**: [`ChangeRecord`], [`ChangeKind`] - one line of a change list
//! - **Statistics**: [`ChangeSummary`] - counts derived from a change list
//!
//! ## Examples
//!
//! ```rust
//! use fru::types::{ChangeKind, ChangeRecord, ChangeSummary};
//!
//! let records = vec![
//!     ChangeRecord::deleted("notes"),
//!     ChangeRecord::added("notes"),
//!     ChangeRecord::modified("todo.txt"),
//! ];
//!
//! let summary = ChangeSummary::from_records(&records);
//! assert_eq!(summary.type_changed, 1);
//! assert_eq!(summary.modified, 1);
//! assert_eq!(records[2].kind, ChangeKind::Modified);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of a filesystem entry that the differ refuses to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    /// Symbolic link (never followed)
    Symlink,
    /// Named pipe
    Fifo,
    /// Unix domain socket
    Socket,
    /// Block device
    BlockDevice,
    /// Character device
    CharDevice,
    /// Anything the platform could not classify
    Unknown,
}

impl fmt::Display for SpecialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpecialKind::Symlink => "symbolic link",
            SpecialKind::Fifo => "named pipe",
            SpecialKind::Socket => "socket",
            SpecialKind::BlockDevice => "block device",
            SpecialKind::CharDevice => "character device",
            SpecialKind::Unknown => "unknown file type",
        };
        f.write_str(name)
    }
}

/// Kind of an entry observed during traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file, compared by content
    RegularFile,
    /// Directory, recursed into when present on both sides
    Directory,
    /// Unsupported entry; encountering one aborts the diff
    Other(SpecialKind),
}

impl EntryKind {
    /// Whether the differ can classify entries of this kind
    pub fn is_supported(&self) -> bool {
        !matches!(self, EntryKind::Other(_))
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::RegularFile => f.write_str("regular file"),
            EntryKind::Directory => f.write_str("directory"),
            EntryKind::Other(special) => special.fmt(f),
        }
    }
}

/// A filesystem object observed while listing one directory of a tree
///
/// `relative_path` is the identity used to match entries across the two
/// trees being compared. The root of a tree is the empty path, so a child
/// `a` of the root has relative path `a`, and its child `b` has `a/b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Base name, without path separators
    pub name: OsString,
    /// What kind of object this is
    pub kind: EntryKind,
    /// Path relative to the root of the tree being walked
    pub relative_path: PathBuf,
}

impl Entry {
    /// Create an entry for the child `name` of the directory `parent`
    pub fn new(parent: &Path, name: impl Into<OsString>, kind: EntryKind) -> Self {
        let name = name.into();
        let relative_path = parent.join(&name);
        Self {
            name,
            kind,
            relative_path,
        }
    }
}

/// How an entry differs between the original and the current tree
///
/// A type change (same path, different kind) is never a variant of its own:
/// it is reported as a `Deleted` record for the old entry plus an `Added`
/// record for the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present only in the current tree (or present with a new kind)
    Added,
    /// Present only in the original tree (or present with an old kind)
    Deleted,
    /// Regular file on both sides with different content
    Modified,
}

impl ChangeKind {
    /// Single-letter tag used in the plain-text rendering of a record
    pub fn tag(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Modified => 'M',
        }
    }
}

/// One line of a change list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Path relative to the roots of the compared trees
    ///
    /// Serialized as a string; bytes that are not valid UTF-8 become
    /// U+FFFD, as in [`Path::to_string_lossy`].
    #[serde(serialize_with = "lossy_path::serialize")]
    pub path: PathBuf,
    /// How the entry at `path` changed
    pub kind: ChangeKind,
}

impl ChangeRecord {
    /// Create a record
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Create an `Added` record
    pub fn added(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Added)
    }

    /// Create a `Deleted` record
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Deleted)
    }

    /// Create a `Modified` record
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Modified)
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.tag(), self.path.display())
    }
}

/// Serialize paths as text even when they are not valid UTF-8
pub(crate) mod lossy_path {
    use serde::Serializer;
    use std::path::{Path, PathBuf};

    pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&path.to_string_lossy())
    }

    pub fn serialize_all<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(paths.iter().map(|p| p.to_string_lossy()))
    }
}

/// Counts derived from a change list
///
/// `added` and `deleted` include the halves of type changes; `type_changed`
/// counts the paths that carry both an `Added` and a `Deleted` record.
///
/// # Examples
///
/// ```rust
/// # use fru::types::{ChangeRecord, ChangeSummary};
/// let summary = ChangeSummary::from_records(&[
///     ChangeRecord::added("a.txt"),
///     ChangeRecord::deleted("b"),
/// ]);
///
/// assert!(summary.has_changes());
/// assert_eq!(summary.total_records(), 2);
/// assert_eq!(summary.type_changed, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Number of `Added` records
    pub added: usize,
    /// Number of `Deleted` records
    pub deleted: usize,
    /// Number of `Modified` records
    pub modified: usize,
    /// Number of paths whose kind changed
    pub type_changed: usize,
}

impl ChangeSummary {
    /// Tally a change list
    pub fn from_records(records: &[ChangeRecord]) -> Self {
        let mut summary = Self::default();
        let mut added = BTreeSet::new();
        let mut deleted = BTreeSet::new();

        for record in records {
            match record.kind {
                ChangeKind::Added => {
                    summary.added += 1;
                    added.insert(record.path.as_path());
                }
                ChangeKind::Deleted => {
                    summary.deleted += 1;
                    deleted.insert(record.path.as_path());
                }
                ChangeKind::Modified => summary.modified += 1,
            }
        }

        summary.type_changed = added.intersection(&deleted).count();
        summary
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total_records() > 0
    }

    /// Total number of records tallied
    pub fn total_records(&self) -> usize {
        self.added + self.deleted + self.modified
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} deleted, {} modified ({} type changes)",
            self.added, self.deleted, self.modified, self.type_changed
        )
    }
}
