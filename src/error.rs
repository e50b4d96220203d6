//! Error types for the fru library
//!
//! The diff itself can fail in exactly three ways: an entry of an
//! unsupported kind was found, a collaborator failed to list or read a path,
//! or the caller cancelled the walk. The remaining variants belong to the
//! configuration layer around the differ.
//!
//! The categories stay distinguishable so that a front end can report
//! "unsupported file type at X" and "I/O error reading Y" differently; see
//! [`DiffError::exit_code`].

use crate::types::SpecialKind;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Type alias for Results in the fru library
pub type Result<T> = std::result::Result<T, DiffError>;

/// Main error type for all fru operations
#[derive(Debug, Error)]
pub enum DiffError {
    /// A special file was found in a directory level being compared
    #[error("Unsupported entry kind at {path:?}: {kind}")]
    UnsupportedEntryKind {
        /// Relative path of the offending entry
        path: PathBuf,
        /// What the entry turned out to be
        kind: SpecialKind,
    },

    /// Listing or reading a path failed
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// Path that could not be listed or read
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: io::Error,
    },

    /// The walk was cancelled through a [`CancellationToken`](crate::CancellationToken)
    #[error("Diff cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Exclusion pattern could not be compiled
    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),

    /// Errors reading a JSON configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl From<globset::Error> for DiffError {
    fn from(err: globset::Error) -> Self {
        DiffError::InvalidPattern(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for DiffError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        DiffError::ThreadPool(err.to_string())
    }
}

impl DiffError {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DiffError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an unsupported-entry error
    pub fn unsupported(path: impl Into<PathBuf>, kind: SpecialKind) -> Self {
        DiffError::UnsupportedEntryKind {
            path: path.into(),
            kind,
        }
    }

    /// Create a configuration error with a custom message
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        DiffError::InvalidConfiguration(msg.into())
    }

    /// Path the error is about, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            DiffError::UnsupportedEntryKind { path, .. } | DiffError::Io { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }

    /// Check if the caller can reasonably skip the affected subtree and go on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DiffError::UnsupportedEntryKind { .. } | DiffError::Io { .. }
        )
    }

    /// Process exit code a command-line front end should use
    pub fn exit_code(&self) -> i32 {
        match self {
            DiffError::UnsupportedEntryKind { .. } => 2,
            DiffError::Io { .. } => 3,
            DiffError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            DiffError::UnsupportedEntryKind { path, kind } => {
                format!(
                    "Unsupported file type at {:?} ({}). Remove it or add it to the exclude patterns.",
                    path, kind
                )
            }
            DiffError::Io { path, source } if source.kind() == io::ErrorKind::PermissionDenied => {
                format!(
                    "Permission denied reading {:?}. Check file permissions or run with appropriate privileges.",
                    path
                )
            }
            DiffError::Io { path, source } => {
                format!("I/O error reading {:?}: {}", path, source)
            }
            _ => self.to_string(),
        }
    }
}
