//! Deciding between a fresh diff and a batch's shared one.

use std::sync::Arc;

use rootstore_foundation::{EntitySource, Result};
use rootstore_storage::EntityStore;

use crate::batch::Batch;
use crate::owner::OwnerId;
use crate::session::Session;
use crate::shared::SharedDiff;

/// Opens mutation sessions against one store.
#[derive(Clone, Debug)]
pub struct MutableSessionCoordinator {
    store: Arc<EntityStore>,
}

impl MutableSessionCoordinator {
    /// Creates a coordinator for `store`.
    #[must_use]
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Returns the store sessions write to.
    #[must_use]
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Opens a session for `owner`.
    ///
    /// With `explicit`, the session joins that shared diff: no new diff is
    /// created and the session takes the batch's provenance instead of
    /// `source`. Without it, the session gets a fresh diff over the current
    /// snapshot and owns its commit.
    ///
    /// # Errors
    ///
    /// Returns a session-closed error if `explicit` was already committed or
    /// discarded, and an inconsistent-batch error if it was built against
    /// another store or an older version of this one.
    pub fn open_session(
        &self,
        owner: OwnerId,
        explicit: Option<&SharedDiff>,
        source: EntitySource,
    ) -> Result<Session> {
        match explicit {
            Some(shared) => {
                shared.join(&owner, &self.store)?;
                tracing::debug!(
                    event = "session_open",
                    owner = %owner,
                    shared = true,
                    batch = %shared.id(),
                    "joined shared diff"
                );
                Ok(Session::joined(owner, Arc::clone(&self.store), shared.clone()))
            }
            None => Ok(self.open_fresh(owner, source)),
        }
    }

    /// Opens a session with its own diff over the current snapshot.
    #[must_use]
    pub fn open_fresh(&self, owner: OwnerId, source: EntitySource) -> Session {
        tracing::debug!(
            event = "session_open",
            owner = %owner,
            shared = false,
            base = self.store.version(),
            "opened fresh diff"
        );
        Session::exclusive(owner, Arc::clone(&self.store), source)
    }

    /// Starts a batch whose entities all carry `source`.
    #[must_use]
    pub fn begin_batch(&self, source: EntitySource) -> Batch {
        Batch::new(Arc::clone(&self.store), source)
    }
}
