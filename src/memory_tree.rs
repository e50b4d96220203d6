//! In-memory tree for tests and pre-built snapshots
//!
//! [`MemoryTree`] implements [`TreeHandle`] without touching the disk. It is
//! built with chained `with_*` calls; missing parent directories are created
//! on the way, and placing a node over an existing one replaces it together
//! with everything beneath it.
//!
//! ```rust
//! use fru::{MemoryTree, TreeDiffer};
//! use fru::types::{ChangeRecord, SpecialKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let original = MemoryTree::new()
//!     .with_file("docs/readme.md", "hello")
//!     .with_dir("empty");
//! let current = MemoryTree::new()
//!     .with_file("docs/readme.md", "hello, world");
//!
//! let records = TreeDiffer::new().diff(&original, &current)?;
//! assert_eq!(
//!     records,
//!     vec![ChangeRecord::deleted("empty"), ChangeRecord::modified("docs/readme.md")]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Paths are taken relative to the root: leading `/` and `.` components are
//! dropped, `..` steps back one component (never above the root), and an
//! empty path names the root, which is always a directory.

use crate::error::{DiffError, Result};
use crate::tree::TreeHandle;
use crate::types::{Entry, EntryKind, SpecialKind};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Directory,
    Special(SpecialKind),
}

impl Node {
    fn kind(&self) -> EntryKind {
        match self {
            Node::File(_) => EntryKind::RegularFile,
            Node::Directory => EntryKind::Directory,
            Node::Special(kind) => EntryKind::Other(*kind),
        }
    }
}

/// A directory tree held in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTree {
    nodes: BTreeMap<PathBuf, Node>,
    unreadable: BTreeSet<PathBuf>,
}

impl MemoryTree {
    /// Create a tree containing only its root directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file with the given content
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.insert_file(path, content);
        self
    }

    /// Add a directory
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dir(path);
        self
    }

    /// Add a special file the differ must refuse
    pub fn with_special(mut self, path: impl AsRef<Path>, kind: SpecialKind) -> Self {
        self.insert_special(path, kind);
        self
    }

    /// Make listing (for a directory) or reading (for a file) at `path` fail
    /// with `PermissionDenied`
    pub fn with_unreadable(mut self, path: impl AsRef<Path>) -> Self {
        self.unreadable.insert(normalize(path.as_ref()));
        self
    }

    /// Add or replace a regular file
    pub fn insert_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.place(normalize(path.as_ref()), Node::File(content.into()));
    }

    /// Add a directory, keeping its children if it already exists
    pub fn insert_dir(&mut self, path: impl AsRef<Path>) {
        self.place(normalize(path.as_ref()), Node::Directory);
    }

    /// Add or replace a special file
    pub fn insert_special(&mut self, path: impl AsRef<Path>, kind: SpecialKind) {
        self.place(normalize(path.as_ref()), Node::Special(kind));
    }

    /// Remove the node at `path` and everything beneath it
    ///
    /// Returns `false` if nothing was there. The root cannot be removed.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> bool {
        let path = normalize(path.as_ref());
        if path.as_os_str().is_empty() || !self.nodes.contains_key(&path) {
            return false;
        }
        self.remove_subtree(&path);
        true
    }

    /// Kind of the node at `path`, if any
    pub fn kind_of(&self, path: impl AsRef<Path>) -> Option<EntryKind> {
        let path = normalize(path.as_ref());
        if path.as_os_str().is_empty() {
            return Some(EntryKind::Directory);
        }
        self.nodes.get(&path).map(Node::kind)
    }

    /// Paths of all nodes in sorted order, not counting the root
    pub fn paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.nodes.keys().map(PathBuf::as_path)
    }

    /// Number of nodes, not counting the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn place(&mut self, path: PathBuf, node: Node) {
        if path.as_os_str().is_empty() {
            return;
        }

        // Every ancestor has to be a directory.
        let ancestors: Vec<PathBuf> = path
            .ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect();
        for ancestor in ancestors.into_iter().rev() {
            match self.nodes.get(&ancestor) {
                Some(Node::Directory) => {}
                Some(_) => {
                    self.remove_subtree(&ancestor);
                    self.nodes.insert(ancestor, Node::Directory);
                }
                None => {
                    self.nodes.insert(ancestor, Node::Directory);
                }
            }
        }

        let keep_children = node == Node::Directory && self.nodes.get(&path) == Some(&Node::Directory);
        if !keep_children {
            self.remove_subtree(&path);
        }
        self.nodes.insert(path, node);
    }

    fn remove_subtree(&mut self, path: &Path) {
        self.nodes.retain(|p, _| !p.starts_with(path));
    }

    fn check_readable(&self, path: &Path) -> Result<()> {
        if self.unreadable.contains(path) {
            return Err(DiffError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "marked unreadable"),
            ));
        }
        Ok(())
    }
}

impl TreeHandle for MemoryTree {
    fn list_children(&self, dir: &Path) -> Result<Vec<Entry>> {
        if !dir.as_os_str().is_empty() {
            match self.nodes.get(dir) {
                Some(Node::Directory) => {}
                Some(_) => {
                    return Err(DiffError::io(
                        dir,
                        io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
                    ))
                }
                None => {
                    return Err(DiffError::io(
                        dir,
                        io::Error::new(io::ErrorKind::NotFound, "no such directory"),
                    ))
                }
            }
        }
        self.check_readable(dir)?;

        Ok(self
            .nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, node)| {
                path.file_name()
                    .map(|name| Entry::new(dir, name, node.kind()))
            })
            .collect())
    }

    fn read_all_bytes(&self, file: &Path) -> Result<Vec<u8>> {
        self.check_readable(file)?;
        match self.nodes.get(file) {
            Some(Node::File(content)) => Ok(content.clone()),
            Some(_) => Err(DiffError::io(
                file,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            )),
            None => Err(DiffError::io(
                file,
                io::Error::new(io::ErrorKind::NotFound, "no such file"),
            )),
        }
    }

    fn file_len(&self, file: &Path) -> Result<Option<u64>> {
        match self.nodes.get(file) {
            Some(Node::File(content)) => Ok(Some(content.len() as u64)),
            _ => Ok(None),
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            // `..` above the root stays at the root.
            Component::ParentDir => {
                normalized.pop();
            }
            _ => {}
        }
    }
    normalized
}
