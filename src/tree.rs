//! Tree access capability consumed by the differ
//!
//! The differ never touches the filesystem itself. It asks a [`TreeHandle`]
//! for the children of a directory and for the bytes of a file, always using
//! paths relative to the tree's root (the root itself is the empty path).
//!
//! Two implementations ship with the crate:
//!
//! - [`FsTree`](crate::FsTree) reads a real directory on disk
//! - [`MemoryTree`](crate::MemoryTree) holds a tree in memory, for tests and
//!   for callers that build snapshots themselves
//!
//! ## Implementing a tree
//!
//! ```rust
//! use fru::error::Result;
//! use fru::tree::TreeHandle;
//! use fru::types::{Entry, EntryKind};
//! use std::path::Path;
//!
//! /// A tree with a single empty file in its root
//! struct OneFile;
//!
//! impl TreeHandle for OneFile {
//!     fn list_children(&self, dir: &Path) -> Result<Vec<Entry>> {
//!         if dir.as_os_str().is_empty() {
//!             Ok(vec![Entry::new(dir, "only.txt", EntryKind::RegularFile)])
//!         } else {
//!             Ok(Vec::new())
//!         }
//!     }
//!
//!     fn read_all_bytes(&self, _file: &Path) -> Result<Vec<u8>> {
//!         Ok(Vec::new())
//!     }
//! }
//! ```

use crate::error::Result;
use crate::types::Entry;
use std::path::Path;

/// Read-only access to a rooted directory tree
///
/// Implementations must be `Sync` so that sibling subtrees can be compared
/// from several worker threads at once.
pub trait TreeHandle: Sync {
    /// List the immediate children of the directory at `dir`
    ///
    /// Order does not matter; the differ sorts listings itself. Each entry's
    /// `relative_path` must be `dir` joined with its name.
    fn list_children(&self, dir: &Path) -> Result<Vec<Entry>>;

    /// Read the full content of the regular file at `file`
    fn read_all_bytes(&self, file: &Path) -> Result<Vec<u8>>;

    /// Length in bytes of the regular file at `file`, when cheaply known
    ///
    /// Used to skip reading content whose length already differs. Returning
    /// `None` makes the differ fall back to a full comparison.
    fn file_len(&self, _file: &Path) -> Result<Option<u64>> {
        Ok(None)
    }
}

impl<T: TreeHandle + ?Sized> TreeHandle for &T {
    fn list_children(&self, dir: &Path) -> Result<Vec<Entry>> {
        (**self).list_children(dir)
    }

    fn read_all_bytes(&self, file: &Path) -> Result<Vec<u8>> {
        (**self).read_all_bytes(file)
    }

    fn file_len(&self, file: &Path) -> Result<Option<u64>> {
        (**self).file_len(file)
    }
}
