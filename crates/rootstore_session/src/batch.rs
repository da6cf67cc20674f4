//! Batches: many sessions, one diff, one commit.

use std::fmt;
use std::sync::Arc;

use rootstore_foundation::{EntitySource, Error, Result};
use rootstore_storage::{EntityStore, Snapshot};

use crate::owner::{BatchId, OwnerId};
use crate::shared::SharedDiff;

/// Owner of a shared diff.
///
/// Sessions opened with [`shared`](Self::shared) write into the same overlay;
/// [`commit`](Self::commit) publishes all of their changes in one snapshot
/// and [`discard`](Self::discard) drops all of them. Dropping an unfinished
/// batch discards it.
pub struct Batch {
    store: Arc<EntityStore>,
    shared: SharedDiff,
}

impl Batch {
    /// Opens a batch over the store's current snapshot.
    #[must_use]
    pub fn new(store: Arc<EntityStore>, source: EntitySource) -> Self {
        let shared = SharedDiff::new(store.begin(), source);
        tracing::debug!(
            event = "batch_open",
            batch = %shared.id(),
            base = store.version(),
            "opened batch"
        );
        Self { store, shared }
    }

    /// Returns the batch id.
    #[must_use]
    pub fn id(&self) -> BatchId {
        self.shared.id()
    }

    /// Returns the handle sessions join.
    #[must_use]
    pub fn shared(&self) -> &SharedDiff {
        &self.shared
    }

    /// Returns the provenance of everything created in the batch.
    #[must_use]
    pub fn source(&self) -> &EntitySource {
        self.shared.source()
    }

    /// Returns the owners that joined so far.
    #[must_use]
    pub fn participants(&self) -> Vec<OwnerId> {
        self.shared.participants()
    }

    /// Returns true if any session wrote into the batch.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.shared.has_changes()
    }

    /// Publishes every participant's changes as one snapshot.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the commit is refused (e.g. the store
    /// moved past the batch's base under [`CommitPolicy::Reject`]). The
    /// batch is closed either way.
    ///
    /// [`CommitPolicy::Reject`]: rootstore_storage::CommitPolicy::Reject
    pub fn commit(self) -> Result<Arc<Snapshot>> {
        let participants = self.shared.participants().len();
        let diff = self.shared.take().ok_or_else(Error::session_closed)?;
        let result = diff.commit(&self.store);
        match &result {
            Ok(snapshot) => tracing::debug!(
                event = "batch_commit",
                batch = %self.shared.id(),
                participants,
                version = snapshot.version(),
                "committed batch"
            ),
            Err(err) => tracing::debug!(
                event = "batch_commit_failed",
                batch = %self.shared.id(),
                participants,
                error = %err,
                "batch commit refused"
            ),
        }
        result
    }

    /// Drops every participant's changes.
    pub fn discard(self) {
        self.close("discarded batch");
    }

    fn close(&self, message: &'static str) {
        if let Some(diff) = self.shared.take() {
            tracing::debug!(
                event = "batch_discard",
                batch = %self.shared.id(),
                participants = self.shared.participants().len(),
                changes = diff.pending().len(),
                "{message}"
            );
            diff.discard();
        }
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        self.close("dropped unfinished batch");
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}
