//! # fru - Folder diffing for incremental backups
//!
//! A library for computing what changed between two directory trees, so an
//! incremental backup knows what to copy and what to drop.
//!
//! ## Overview
//!
//! Given an *original* tree (the last backed-up state) and a *current* tree,
//! fru produces a flat, deterministic list of change records:
//!
//! - `Added` - the path exists only in the current tree
//! - `Deleted` - the path exists only in the original tree
//! - `Modified` - a regular file on both sides whose bytes differ
//!
//! A path whose kind changed (a file that became a directory, or the other
//! way round) is reported as a `Deleted` record followed later by an `Added`
//! record. Directories that appear or disappear as a whole are one record,
//! never one per descendant.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fru::{FsTree, TreeDiffer};
//! use fru::plan::IncrementalPlan;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let original = FsTree::open("./backup/docs")?;
//! let current = FsTree::open("./exchange/docs")?;
//!
//! let records = TreeDiffer::new().diff(&original, &current)?;
//! for record in &records {
//!     println!("{}", record);
//! }
//!
//! let plan = IncrementalPlan::from_records(&records);
//! println!("{} paths to copy, {} to remove", plan.copy.len(), plan.remove.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing Without a Disk
//!
//! The differ only talks to trees through the [`TreeHandle`] trait.
//! [`MemoryTree`] implements it in memory:
//!
//! ```rust
//! use fru::{MemoryTree, TreeDiffer};
//! use fru::types::ChangeRecord;
//!
//! let original = MemoryTree::new().with_file("foo", "a file");
//! let current = MemoryTree::new().with_file("foo/bar", "now a directory");
//!
//! let records = TreeDiffer::new().diff(&original, &current).unwrap();
//! assert_eq!(records, vec![ChangeRecord::deleted("foo"), ChangeRecord::added("foo")]);
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, DiffError>`. A diff fails as a whole on
//! the first problem it meets, in traversal order:
//!
//! - [`DiffError::UnsupportedEntryKind`] for symlinks, sockets, pipes and
//!   devices
//! - [`DiffError::Io`] for paths that cannot be listed or read
//! - [`DiffError::Cancelled`] when a [`CancellationToken`] fires
//!
//! ## Module Organization
//!
//! - [`differ`]: the diff walk and its builder
//! - [`tree`]: the tree access trait
//! - [`compare`]: file content comparison strategies
//! - [`config`]: serializable configuration
//! - [`plan`]: incremental backup plans built from change lists
//! - [`observer`]: diagnostics hooks
//! - [`types`]: entries, records and summaries
//! - [`error`]: error types and handling

// Public API modules
pub mod cancel;
pub mod compare;
pub mod config;
pub mod differ;
pub mod error;
pub mod fs_tree;
pub mod memory_tree;
pub mod observer;
pub mod plan;
pub mod tree;
pub mod types;

// Re-export main types for convenience
pub use cancel::CancellationToken;
pub use compare::ContentComparison;
pub use config::DiffConfig;
pub use differ::{TreeDiffer, TreeDifferBuilder};
pub use error::{DiffError, Result};
pub use fs_tree::FsTree;
pub use memory_tree::MemoryTree;
pub use observer::{DiffObserver, TracingObserver};
pub use plan::IncrementalPlan;
pub use tree::TreeHandle;
pub use types::*;
