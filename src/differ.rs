//! Recursive tree diffing
//!
//! [`TreeDiffer`] compares an *original* and a *current* tree and returns a
//! flat, ordered list of [`ChangeRecord`]s that an incremental backup can act
//! on.
//!
//! ## Classification
//!
//! For every directory present on both sides, the children are classified by
//! name:
//!
//! | original      | current       | result                        |
//! |---------------|---------------|-------------------------------|
//! | absent        | any           | `Added`                       |
//! | any           | absent        | `Deleted`                     |
//! | file          | directory     | `Deleted` + `Added`           |
//! | directory     | file          | `Deleted` + `Added`           |
//! | file          | file          | `Modified` if content differs |
//! | directory     | directory     | recurse                       |
//! | special file  | any           | [`DiffError::UnsupportedEntryKind`] |
//!
//! A directory that appears or disappears as a whole is a single record;
//! its contents are never listed.
//!
//! ## Ordering
//!
//! Records come out in a fixed order so that two runs over the same trees
//! produce identical lists. Within one directory level:
//!
//! 1. deletions, in name order
//! 2. additions, in name order
//! 3. entries present on both sides, in name order: a `Modified` record for
//!    a changed file, or the complete run of records of a shared
//!    subdirectory
//!
//! Names are ordered bytewise ([`OsString`] ordering).
//!
//! ## Errors
//!
//! The first error in that same order aborts the diff; no partial list is
//! ever returned. Special files are checked while classifying a level, so
//! all special files of a level are detected before any of its
//! subdirectories is entered.
//!
//! ## Parallelism
//!
//! With more than one worker the entries of step 3 are compared on a `rayon`
//! pool. Each subtree's run is buffered and spliced back in place, so the
//! output, and the error reported on failure, match the serial walk.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fru::{FsTree, TreeDiffer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let original = FsTree::open("/backups/docs@last")?;
//! let current = FsTree::open("/exchange/docs")?;
//!
//! let differ = TreeDiffer::builder()
//!     .parallel_workers(4)
//!     .exclude_patterns(vec!["*.tmp".to_string()])
//!     .build()?;
//!
//! for record in differ.diff(&original, &current)? {
//!     println!("{}", record);
//! }
//! # Ok(())
//! # }
//! ```

use crate::cancel::CancellationToken;
use crate::compare::{self, ContentComparison};
use crate::config::{self, DiffConfig};
use crate::error::{DiffError, Result};
use crate::observer::DiffObserver;
use crate::tree::TreeHandle;
use crate::types::{ChangeRecord, Entry, EntryKind};
use globset::GlobSet;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Compares two trees and produces their change list
///
/// A differ holds configuration only; it keeps no state between calls and
/// can be reused for any number of tree pairs.
pub struct TreeDiffer {
    comparison: ContentComparison,
    exclude: Option<GlobSet>,
    pool: Option<ThreadPool>,
    cancellation: Option<CancellationToken>,
    observer: Option<Arc<dyn DiffObserver>>,
}

impl std::fmt::Debug for TreeDiffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeDiffer")
            .field("comparison", &self.comparison)
            .field("excludes", &self.exclude.as_ref().map_or(0, GlobSet::len))
            .field("workers", &self.pool.as_ref().map_or(1, ThreadPool::current_num_threads))
            .field("cancellable", &self.cancellation.is_some())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl Default for TreeDiffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeDiffer {
    /// Create a serial differ with default settings
    ///
    /// Content is compared with [`ContentComparison::LengthThenBytes`],
    /// nothing is excluded, and there is no observer or cancellation.
    pub fn new() -> Self {
        Self {
            comparison: ContentComparison::default(),
            exclude: None,
            pool: None,
            cancellation: None,
            observer: None,
        }
    }

    /// Start configuring a differ
    pub fn builder() -> TreeDifferBuilder {
        TreeDifferBuilder::new()
    }

    /// Whether sibling subtrees are compared on a worker pool
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Compute the change list turning `original` into `current`
    ///
    /// Both trees are only read. The result is ordered as described in the
    /// [module documentation](self).
    ///
    /// # Errors
    ///
    /// - [`DiffError::UnsupportedEntryKind`] if a compared directory level
    ///   holds a special file on either side
    /// - [`DiffError::Io`] if either tree fails to list or read a path
    /// - [`DiffError::Cancelled`] if the cancellation token fires
    pub fn diff<O, C>(&self, original: &O, current: &C) -> Result<Vec<ChangeRecord>>
    where
        O: TreeHandle + ?Sized,
        C: TreeHandle + ?Sized,
    {
        let start = Instant::now();
        let walk = Walk {
            differ: self,
            original,
            current,
        };

        let root = Path::new("");
        let records = match &self.pool {
            Some(pool) => pool.install(|| walk.level(root)),
            None => walk.level(root),
        }?;

        if let Some(observer) = &self.observer {
            for record in &records {
                observer.on_record(record);
            }
        }

        debug!(
            "Diff produced {} records in {:?}",
            records.len(),
            start.elapsed()
        );
        Ok(records)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.as_ref().is_some_and(|set| set.is_match(path))
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(DiffError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// One diff call over a specific pair of trees
struct Walk<'a, O: ?Sized, C: ?Sized> {
    differ: &'a TreeDiffer,
    original: &'a O,
    current: &'a C,
}

impl<O, C> Walk<'_, O, C>
where
    O: TreeHandle + ?Sized,
    C: TreeHandle + ?Sized,
{
    /// Records for the directory `dir`, present on both sides
    fn level(&self, dir: &Path) -> Result<Vec<ChangeRecord>> {
        self.differ.check_cancelled()?;
        if let Some(observer) = &self.differ.observer {
            observer.on_directory(dir);
        }
        trace!("Comparing level {:?}", dir);

        let original = self.listing(self.original, dir)?;
        let current = self.listing(self.current, dir)?;
        let mut records = Vec::new();

        for (name, old) in &original {
            reject_special(old)?;
            match current.get(name) {
                None => records.push(ChangeRecord::deleted(&old.relative_path)),
                Some(new) => {
                    reject_special(new)?;
                    if new.kind != old.kind {
                        records.push(ChangeRecord::deleted(&old.relative_path));
                    }
                }
            }
        }

        for (name, new) in &current {
            reject_special(new)?;
            match original.get(name) {
                Some(old) if old.kind == new.kind => {}
                _ => records.push(ChangeRecord::added(&new.relative_path)),
            }
        }

        let shared: Vec<&Entry> = current
            .iter()
            .filter(|(name, new)| original.get(*name).is_some_and(|old| old.kind == new.kind))
            .map(|(_, new)| new)
            .collect();

        if self.differ.is_parallel() && shared.len() > 1 {
            let runs: Vec<Result<Vec<ChangeRecord>>> =
                shared.par_iter().map(|entry| self.shared(entry)).collect();
            for run in runs {
                records.extend(run?);
            }
        } else {
            for entry in shared {
                records.extend(self.shared(entry)?);
            }
        }

        Ok(records)
    }

    /// Records for an entry present with the same kind on both sides
    fn shared(&self, entry: &Entry) -> Result<Vec<ChangeRecord>> {
        match entry.kind {
            EntryKind::Directory => self.level(&entry.relative_path),
            EntryKind::RegularFile => {
                let changed = compare::contents_differ(
                    self.original,
                    self.current,
                    &entry.relative_path,
                    self.differ.comparison,
                )?;
                Ok(if changed {
                    vec![ChangeRecord::modified(&entry.relative_path)]
                } else {
                    Vec::new()
                })
            }
            EntryKind::Other(kind) => Err(DiffError::unsupported(&entry.relative_path, kind)),
        }
    }

    /// Sorted, validated children of `dir` in `tree`, minus excluded entries
    fn listing<T>(&self, tree: &T, dir: &Path) -> Result<BTreeMap<OsString, Entry>>
    where
        T: TreeHandle + ?Sized,
    {
        let mut children = BTreeMap::new();
        for mut entry in tree.list_children(dir)? {
            if !is_plain_name(&entry.name) {
                return Err(invalid_listing(
                    dir.join(&entry.name),
                    "entry name is empty or contains a path separator",
                ));
            }
            entry.relative_path = dir.join(&entry.name);
            if self.differ.is_excluded(&entry.relative_path) {
                trace!("Excluded {:?}", entry.relative_path);
                continue;
            }
            let path = entry.relative_path.clone();
            if children.insert(entry.name.clone(), entry).is_some() {
                return Err(invalid_listing(path, "directory listing repeats an entry name"));
            }
        }
        Ok(children)
    }
}

fn reject_special(entry: &Entry) -> Result<()> {
    match entry.kind {
        EntryKind::Other(kind) => Err(DiffError::unsupported(&entry.relative_path, kind)),
        _ => Ok(()),
    }
}

/// A single normal path component, identical to its own text
fn is_plain_name(name: &OsStr) -> bool {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => part == name,
        _ => false,
    }
}

fn invalid_listing(path: impl Into<std::path::PathBuf>, msg: &str) -> DiffError {
    DiffError::io(path, io::Error::new(io::ErrorKind::InvalidData, msg.to_string()))
}

/// Builder for [`TreeDiffer`]
///
/// # Default Values
///
/// - `comparison`: `ContentComparison::LengthThenBytes`
/// - `exclude_patterns`: empty
/// - `parallel_workers`: 1 (serial)
/// - no cancellation token, no observer
pub struct TreeDifferBuilder {
    comparison: ContentComparison,
    exclude_patterns: Vec<String>,
    parallel_workers: usize,
    cancellation: Option<CancellationToken>,
    observer: Option<Arc<dyn DiffObserver>>,
}

impl std::fmt::Debug for TreeDifferBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeDifferBuilder")
            .field("comparison", &self.comparison)
            .field("exclude_patterns", &self.exclude_patterns)
            .field("parallel_workers", &self.parallel_workers)
            .field("cancellable", &self.cancellation.is_some())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl Default for TreeDifferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeDifferBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::from_config(&DiffConfig::default())
    }

    /// Start from a loaded configuration
    pub fn from_config(config: &DiffConfig) -> Self {
        Self {
            comparison: config.comparison,
            exclude_patterns: config.exclude.clone(),
            parallel_workers: config.parallel_workers,
            cancellation: None,
            observer: None,
        }
    }

    /// Set how files present on both sides are compared
    pub fn comparison(mut self, comparison: ContentComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Set glob patterns of relative paths to ignore on both sides
    ///
    /// Excluded entries are invisible: they are neither classified nor
    /// checked for unsupported kinds.
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Set the number of worker threads
    ///
    /// `1` keeps the walk on the calling thread; `0` uses one worker per CPU.
    pub fn parallel_workers(mut self, count: usize) -> Self {
        self.parallel_workers = count;
        self
    }

    /// Make the diff abort with [`DiffError::Cancelled`] once `token` fires
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Attach a diagnostics observer
    pub fn observer(mut self, observer: Arc<dyn DiffObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the differ
    ///
    /// # Errors
    ///
    /// - [`DiffError::InvalidConfiguration`] if the worker count is too large
    ///   or an exclude pattern is blank
    /// - [`DiffError::InvalidPattern`] if an exclude pattern does not compile
    /// - [`DiffError::ThreadPool`] if the worker pool cannot be started
    pub fn build(self) -> Result<TreeDiffer> {
        config::check_workers(self.parallel_workers)?;
        config::check_patterns(&self.exclude_patterns)?;
        let exclude = config::compile_patterns(&self.exclude_patterns)?;

        let workers = match self.parallel_workers {
            0 => num_cpus::get(),
            n => n,
        };
        let pool = if workers > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("fru-diff-{}", i))
                    .build()?,
            )
        } else {
            None
        };

        debug!(
            "Built differ: {:?} comparison, {} exclude patterns, {} workers",
            self.comparison,
            self.exclude_patterns.len(),
            workers
        );

        Ok(TreeDiffer {
            comparison: self.comparison,
            exclude,
            pool,
            cancellation: self.cancellation,
            observer: self.observer,
        })
    }
}
