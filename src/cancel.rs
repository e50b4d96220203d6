//! Cooperative cancellation for long diffs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked by the differ before each directory level
///
/// Clones share the same flag, so one clone can be handed to the differ and
/// another kept by whoever decides to stop it. Once cancelled, a running
/// diff fails with [`DiffError::Cancelled`](crate::DiffError::Cancelled)
/// instead of returning a partial change list.
///
/// ```rust
/// use fru::{CancellationToken, DiffError, MemoryTree, TreeDiffer};
///
/// let token = CancellationToken::new();
/// let differ = TreeDiffer::builder()
///     .cancellation(token.clone())
///     .build()
///     .unwrap();
///
/// token.cancel();
/// let tree = MemoryTree::new();
/// assert!(matches!(differ.diff(&tree, &tree), Err(DiffError::Cancelled)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
