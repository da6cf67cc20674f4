//! Read-only snapshot handles.

use std::sync::Arc;

use rootstore_storage::{EntityStore, Snapshot};

/// Anything a derived view can be computed from.
///
/// Implementations must return a complete snapshot without blocking.
pub trait SnapshotSource: Send + Sync {
    /// Returns the live snapshot.
    fn current(&self) -> Arc<Snapshot>;

    /// Returns the live version.
    fn version(&self) -> u64 {
        self.current().version()
    }
}

impl SnapshotSource for EntityStore {
    fn current(&self) -> Arc<Snapshot> {
        EntityStore::current(self)
    }

    fn version(&self) -> u64 {
        EntityStore::version(self)
    }
}
