//! Content comparison for files present on both sides
//!
//! Only whole-file equality matters: a file is either unchanged or
//! `Modified`. How much I/O that takes depends on the strategy.

use crate::error::Result;
use crate::tree::TreeHandle;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::trace;

/// How two regular files at the same relative path are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentComparison {
    /// Always read and compare both files in full
    Bytes,
    /// Compare lengths first when both trees know them, then bytes
    #[default]
    LengthThenBytes,
}

/// Whether the file at `path` differs between the two trees
///
/// A length mismatch implies a content mismatch, so with
/// [`ContentComparison::LengthThenBytes`] such files are reported without
/// being read. If either tree cannot report a length the full content is
/// compared.
pub fn contents_differ<O, C>(
    original: &O,
    current: &C,
    path: &Path,
    strategy: ContentComparison,
) -> Result<bool>
where
    O: TreeHandle + ?Sized,
    C: TreeHandle + ?Sized,
{
    if strategy == ContentComparison::LengthThenBytes {
        if let (Some(old_len), Some(new_len)) = (original.file_len(path)?, current.file_len(path)?) {
            if old_len != new_len {
                trace!("{:?} changed length ({} -> {})", path, old_len, new_len);
                return Ok(true);
            }
        }
    }

    let old_content = original.read_all_bytes(path)?;
    let new_content = current.read_all_bytes(path)?;
    Ok(old_content != new_content)
}
