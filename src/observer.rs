//! Diagnostics hooks for the differ
//!
//! The walk itself never prints or logs change records. Callers that want to
//! see progress or results as they are produced hand the differ a
//! [`DiffObserver`].

use crate::types::ChangeRecord;
use std::path::Path;
use tracing::{debug, info};

/// Receives notifications from a running diff
///
/// Both methods default to doing nothing.
///
/// - `on_directory` fires when a directory level is entered. With parallel
///   walking enabled, calls for sibling subtrees may interleave.
/// - `on_record` fires once per record of a successful diff, in final
///   order, after the walk has finished. A failed diff reports no records.
pub trait DiffObserver: Send + Sync {
    /// A directory present on both sides is about to be compared
    fn on_directory(&self, _path: &Path) {}

    /// A record of the final change list
    fn on_record(&self, _record: &ChangeRecord) {}
}

/// Observer forwarding every notification to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DiffObserver for TracingObserver {
    fn on_directory(&self, path: &Path) {
        debug!("Comparing directory {:?}", path);
    }

    fn on_record(&self, record: &ChangeRecord) {
        info!("{}", record);
    }
}
