//! Differ configuration
//!
//! Everything the differ needs to know beyond the two trees lives in
//! [`DiffConfig`]: no process-wide constants. The struct is plain serde data,
//! so a front end can load it from a JSON file and hand it to
//! [`TreeDifferBuilder::from_config`](crate::TreeDifferBuilder::from_config).
//!
//! ```json
//! {
//!   "parallel_workers": 4,
//!   "comparison": "length_then_bytes",
//!   "exclude": ["*.tmp", "cache/**"]
//! }
//! ```
//!
//! Missing fields take their defaults.

use crate::compare::ContentComparison;
use crate::error::{DiffError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Upper bound on `parallel_workers`
pub const MAX_PARALLEL_WORKERS: usize = 1024;

/// Configuration for a [`TreeDiffer`](crate::TreeDiffer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Worker threads for comparing sibling subtrees
    ///
    /// `1` walks serially on the calling thread, `0` uses one worker per CPU.
    pub parallel_workers: usize,
    /// How regular files present on both sides are compared
    pub comparison: ContentComparison,
    /// Glob patterns, matched against relative paths, of entries to ignore
    /// on both sides
    pub exclude: Vec<String>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 1,
            comparison: ContentComparison::default(),
            exclude: Vec::new(),
        }
    }
}

impl DiffConfig {
    /// Parse and validate a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        check_workers(self.parallel_workers)?;
        check_patterns(&self.exclude)
    }

    /// Load a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// - [`DiffError::Io`] if the file cannot be read
    /// - [`DiffError::Json`] if it is not valid JSON for a configuration
    /// - [`DiffError::InvalidConfiguration`] if a value is out of range
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| DiffError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Number of worker threads this configuration resolves to
    pub fn effective_workers(&self) -> usize {
        match self.parallel_workers {
            0 => num_cpus::get(),
            n => n,
        }
    }

    /// Compile the exclusion patterns, or `None` when there are none
    pub fn exclude_set(&self) -> Result<Option<GlobSet>> {
        compile_patterns(&self.exclude)
    }
}

pub(crate) fn check_workers(count: usize) -> Result<()> {
    if count > MAX_PARALLEL_WORKERS {
        return Err(DiffError::invalid_configuration(format!(
            "parallel_workers is {}, at most {} allowed",
            count, MAX_PARALLEL_WORKERS
        )));
    }
    Ok(())
}

pub(crate) fn check_patterns(patterns: &[String]) -> Result<()> {
    if patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(DiffError::invalid_configuration("exclude patterns must not be empty"));
    }
    Ok(())
}

/// Compile glob patterns into a single matcher
pub(crate) fn compile_patterns(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}
