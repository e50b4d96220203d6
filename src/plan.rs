//! Incremental backup plans
//!
//! A change list says what differs; an [`IncrementalPlan`] says what an
//! incremental snapshot has to do about it: which paths to copy from the
//! current tree, and which paths to record as removed. Added directories
//! are copied as a whole, since the change list never expands them.
//!
//! A type change shows up in both sets: the old entry is removed and the new
//! one copied.

use crate::types::{lossy_path, ChangeKind, ChangeRecord, ChangeSummary};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What an incremental snapshot must copy and remove
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalPlan {
    /// Paths to copy from the current tree (`Added` and `Modified`), in
    /// change-list order
    #[serde(serialize_with = "lossy_path::serialize_all")]
    pub copy: Vec<PathBuf>,
    /// Paths to mark as removed (`Deleted`), in change-list order
    #[serde(serialize_with = "lossy_path::serialize_all")]
    pub remove: Vec<PathBuf>,
    /// Counts of the change list the plan was built from
    pub summary: ChangeSummary,
}

impl IncrementalPlan {
    /// Build a plan from a change list
    ///
    /// ```rust
    /// use fru::plan::IncrementalPlan;
    /// use fru::types::ChangeRecord;
    /// use std::path::PathBuf;
    ///
    /// let plan = IncrementalPlan::from_records(&[
    ///     ChangeRecord::deleted("old.txt"),
    ///     ChangeRecord::added("photos"),
    ///     ChangeRecord::modified("notes.md"),
    /// ]);
    ///
    /// assert_eq!(plan.copy, vec![PathBuf::from("photos"), PathBuf::from("notes.md")]);
    /// assert_eq!(plan.remove, vec![PathBuf::from("old.txt")]);
    /// ```
    pub fn from_records(records: &[ChangeRecord]) -> Self {
        let mut copy = Vec::new();
        let mut remove = Vec::new();

        for record in records {
            match record.kind {
                ChangeKind::Added | ChangeKind::Modified => copy.push(record.path.clone()),
                ChangeKind::Deleted => remove.push(record.path.clone()),
            }
        }

        Self {
            copy,
            remove,
            summary: ChangeSummary::from_records(records),
        }
    }

    /// Whether the snapshot would be empty
    pub fn is_empty(&self) -> bool {
        self.copy.is_empty() && self.remove.is_empty()
    }
}
