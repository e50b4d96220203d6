//! Tree access backed by a real directory on disk
//!
//! [`FsTree`] lists directories one level at a time with `walkdir`, never
//! following symbolic links. Links and other special files are reported as
//! [`EntryKind::Other`] so the differ can reject them.
//!
//! I/O errors carry the absolute on-disk path, which tells the caller which
//! of the two trees failed.
//!
//! The tree is not snapshotted: if another process mutates it during a diff,
//! vanished or unreadable paths surface as [`DiffError::Io`] and nothing is
//! made up to fill the gap.

use crate::error::{DiffError, Result};
use crate::tree::TreeHandle;
use crate::types::{Entry, EntryKind, SpecialKind};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// A directory on disk, seen as a tree
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
}

impl FsTree {
    /// Open the directory at `root`
    ///
    /// The root may itself be a symbolic link to a directory; links found
    /// below it are never followed.
    ///
    /// # Errors
    ///
    /// - [`DiffError::Io`] if `root` does not exist, cannot be inspected, or
    ///   is not a directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root).map_err(|e| DiffError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(DiffError::io(
                &root,
                io::Error::new(io::ErrorKind::InvalidInput, "tree root is not a directory"),
            ));
        }
        Ok(Self { root })
    }

    /// Root directory of this tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

impl TreeHandle for FsTree {
    fn list_children(&self, dir: &Path) -> Result<Vec<Entry>> {
        let absolute = self.absolute(dir);
        trace!("Listing {:?}", absolute);

        let mut entries = Vec::new();
        for item in WalkDir::new(&absolute)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let item = item.map_err(|e| walk_error(&absolute, e))?;
            let kind = classify(item.file_type());
            entries.push(Entry::new(dir, item.file_name(), kind));
        }
        Ok(entries)
    }

    fn read_all_bytes(&self, file: &Path) -> Result<Vec<u8>> {
        let absolute = self.absolute(file);
        fs::read(&absolute).map_err(|e| DiffError::io(absolute, e))
    }

    fn file_len(&self, file: &Path) -> Result<Option<u64>> {
        let absolute = self.absolute(file);
        let metadata = fs::symlink_metadata(&absolute).map_err(|e| DiffError::io(&absolute, e))?;
        Ok(metadata.is_file().then(|| metadata.len()))
    }
}

/// Map a type read without following links onto an entry kind
fn classify(file_type: fs::FileType) -> EntryKind {
    if file_type.is_symlink() {
        EntryKind::Other(SpecialKind::Symlink)
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::RegularFile
    } else {
        EntryKind::Other(special_kind(file_type))
    }
}

#[cfg(unix)]
fn special_kind(file_type: fs::FileType) -> SpecialKind {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_fifo() {
        SpecialKind::Fifo
    } else if file_type.is_socket() {
        SpecialKind::Socket
    } else if file_type.is_block_device() {
        SpecialKind::BlockDevice
    } else if file_type.is_char_device() {
        SpecialKind::CharDevice
    } else {
        SpecialKind::Unknown
    }
}

#[cfg(not(unix))]
fn special_kind(_file_type: fs::FileType) -> SpecialKind {
    SpecialKind::Unknown
}

fn walk_error(dir: &Path, err: walkdir::Error) -> DiffError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
    let source = match err.into_io_error() {
        Some(source) => source,
        None => io::Error::new(io::ErrorKind::Other, "filesystem loop while listing"),
    };
    DiffError::io(path, source)
}
