//! A diff shared by every session of one batch.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rootstore_foundation::{BatchInconsistency, EntitySource, Error, Result};
use rootstore_storage::{DiffBuilder, EntityStore, StoreId};

use crate::owner::{BatchId, OwnerId};

thread_local! {
    /// Batches whose diff this thread is currently inside.
    static HELD: RefCell<Vec<BatchId>> = const { RefCell::new(Vec::new()) };
}

/// Marks a batch's diff as held by the current thread until dropped.
struct HeldGuard(BatchId);

impl HeldGuard {
    fn enter(id: BatchId) -> Result<Self> {
        HELD.with_borrow_mut(|held| {
            if held.contains(&id) {
                return Err(Error::reentrant_access(id.to_string()));
            }
            held.push(id);
            Ok(Self(id))
        })
    }
}

impl Drop for HeldGuard {
    fn drop(&mut self) {
        HELD.with_borrow_mut(|held| held.retain(|id| *id != self.0));
    }
}

struct SharedState {
    /// `None` once the batch committed or discarded.
    diff: Option<DiffBuilder>,
    participants: Vec<OwnerId>,
}

/// Cloneable handle to a batch's diff.
///
/// Every clone sees the same overlay. Only the [`Batch`](crate::Batch) that
/// created it can commit or discard it; sessions that join it can only write.
#[derive(Clone)]
pub struct SharedDiff {
    id: BatchId,
    store: StoreId,
    source: EntitySource,
    state: Arc<Mutex<SharedState>>,
}

impl SharedDiff {
    pub(crate) fn new(diff: DiffBuilder, source: EntitySource) -> Self {
        Self {
            id: BatchId::fresh(),
            store: diff.store_id(),
            source,
            state: Arc::new(Mutex::new(SharedState {
                diff: Some(diff),
                participants: Vec::new(),
            })),
        }
    }

    /// Returns the batch this diff belongs to.
    #[must_use]
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Returns the store the diff was built against.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.store
    }

    /// Returns the provenance every entity created in the batch carries.
    #[must_use]
    pub fn source(&self) -> &EntitySource {
        &self.source
    }

    /// Returns true until the batch commits or discards.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().diff.is_some()
    }

    /// Returns the version the diff was built from, if still open.
    #[must_use]
    pub fn base_version(&self) -> Option<u64> {
        self.state.lock().diff.as_ref().map(DiffBuilder::base_version)
    }

    /// Returns true if the diff is open and holds pending changes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.state
            .lock()
            .diff
            .as_ref()
            .is_some_and(|diff| !diff.is_empty())
    }

    /// Returns the owners that joined, in join order.
    #[must_use]
    pub fn participants(&self) -> Vec<OwnerId> {
        self.state.lock().participants.clone()
    }

    /// Returns true if both handles point at the same diff.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Admits `owner` into the batch after checking the diff still fits `store`.
    pub(crate) fn join(&self, owner: &OwnerId, store: &EntityStore) -> Result<()> {
        let _held = HeldGuard::enter(self.id)?;
        let mut state = self.state.lock();
        let diff = state
            .diff
            .as_ref()
            .ok_or_else(Error::session_closed)?;

        if diff.store_id() != store.id() {
            return Err(Error::inconsistent_batch(
                owner.as_str(),
                BatchInconsistency::ForeignStore {
                    expected: store.id().get(),
                    actual: diff.store_id().get(),
                },
            ));
        }
        let current = store.version();
        if diff.base_version() != current {
            return Err(Error::inconsistent_batch(
                owner.as_str(),
                BatchInconsistency::StaleBase {
                    batch_base: diff.base_version(),
                    current,
                },
            ));
        }

        if !state.participants.contains(owner) {
            state.participants.push(owner.clone());
        }
        Ok(())
    }

    /// Runs `f` against the open diff.
    ///
    /// The diff stays locked while `f` runs. Reaching the same batch again
    /// from inside `f` on this thread fails with a reentrant-access error.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut DiffBuilder) -> R) -> Result<R> {
        let _held = HeldGuard::enter(self.id)?;
        let mut state = self.state.lock();
        let diff = state
            .diff
            .as_mut()
            .ok_or_else(Error::session_closed)?;
        Ok(f(diff))
    }

    /// Closes the diff, handing it to the caller.
    pub(crate) fn take(&self) -> Option<DiffBuilder> {
        self.state.lock().diff.take()
    }
}

impl fmt::Debug for SharedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SharedDiff")
            .field("id", &self.id)
            .field("store", &self.store)
            .field("source", &self.source)
            .field("open", &state.diff.is_some())
            .field("participants", &state.participants.len())
            .finish()
    }
}
