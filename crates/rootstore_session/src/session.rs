//! One mutation session over a module's configuration.

use std::fmt;
use std::sync::Arc;

use rootstore_foundation::{EntitySource, Error, Result};
use rootstore_storage::{DiffBuilder, EntityStore, Snapshot};

use crate::owner::{BatchId, OwnerId};
use crate::shared::SharedDiff;

/// Who may commit a session's diff.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionKind {
    /// The session opened its own diff and owns commit and discard.
    Exclusive,
    /// The session writes into a batch's shared diff; the batch commits.
    Joined(BatchId),
}

enum SessionDiff {
    Exclusive(Option<DiffBuilder>),
    Joined { shared: SharedDiff, detached: bool },
}

/// A mutation session opened by a
/// [`MutableSessionCoordinator`](crate::MutableSessionCoordinator).
pub struct Session {
    owner: OwnerId,
    store: Arc<EntityStore>,
    source: EntitySource,
    diff: SessionDiff,
}

impl Session {
    pub(crate) fn exclusive(owner: OwnerId, store: Arc<EntityStore>, source: EntitySource) -> Self {
        let diff = store.begin();
        Self {
            owner,
            store,
            source,
            diff: SessionDiff::Exclusive(Some(diff)),
        }
    }

    pub(crate) fn joined(owner: OwnerId, store: Arc<EntityStore>, shared: SharedDiff) -> Self {
        Self {
            owner,
            store,
            source: shared.source().clone(),
            diff: SessionDiff::Joined {
                shared,
                detached: false,
            },
        }
    }

    /// Returns the session's owner.
    #[must_use]
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Returns whether the session owns its diff.
    #[must_use]
    pub fn kind(&self) -> SessionKind {
        match &self.diff {
            SessionDiff::Exclusive(_) => SessionKind::Exclusive,
            SessionDiff::Joined { shared, .. } => SessionKind::Joined(shared.id()),
        }
    }

    /// Returns true if the session writes into a batch's diff.
    #[must_use]
    pub fn is_joined(&self) -> bool {
        matches!(self.diff, SessionDiff::Joined { .. })
    }

    /// Returns the provenance given to entities this session creates.
    ///
    /// Joined sessions always use the batch's source.
    #[must_use]
    pub fn source(&self) -> &EntitySource {
        &self.source
    }

    /// Returns the store the session writes to.
    #[must_use]
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Returns true while the session can still read and write.
    #[must_use]
    pub fn is_open(&self) -> bool {
        match &self.diff {
            SessionDiff::Exclusive(diff) => diff.is_some(),
            SessionDiff::Joined { shared, detached } => !detached && shared.is_open(),
        }
    }

    /// Returns true if the diff holds pending changes.
    ///
    /// For a joined session this covers every participant's changes.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        match &self.diff {
            SessionDiff::Exclusive(diff) => diff.as_ref().is_some_and(|d| !d.is_empty()),
            SessionDiff::Joined { shared, detached } => !detached && shared.has_changes(),
        }
    }

    /// Runs `f` with read access to the diff.
    ///
    /// A joined session's diff stays locked while `f` runs, so `f` must not
    /// go through another session of the same batch.
    ///
    /// # Errors
    ///
    /// Returns a session-closed error once the diff is committed, discarded,
    /// or detached, and a reentrant-access error when called from inside
    /// another `read` or `write` on the same batch.
    pub fn read<R>(&self, f: impl FnOnce(&DiffBuilder) -> R) -> Result<R> {
        match &self.diff {
            SessionDiff::Exclusive(Some(diff)) => Ok(f(diff)),
            SessionDiff::Joined {
                shared,
                detached: false,
            } => shared.with(|diff| f(diff)),
            _ => Err(Error::session_closed()),
        }
    }

    /// Runs `f` with write access to the diff.
    ///
    /// A joined session's diff stays locked while `f` runs, so `f` must not
    /// go through another session of the same batch.
    ///
    /// # Errors
    ///
    /// Returns a session-closed error once the diff is committed, discarded,
    /// or detached, and a reentrant-access error when called from inside
    /// another `read` or `write` on the same batch.
    pub fn write<R>(&mut self, f: impl FnOnce(&mut DiffBuilder) -> R) -> Result<R> {
        match &mut self.diff {
            SessionDiff::Exclusive(Some(diff)) => Ok(f(diff)),
            SessionDiff::Joined {
                shared,
                detached: false,
            } => shared.with(f),
            _ => Err(Error::session_closed()),
        }
    }

    /// Commits an exclusive session's diff into the store.
    ///
    /// # Errors
    ///
    /// Returns a commit-authority error for joined sessions (the session
    /// stays usable), a session-closed error if already committed or
    /// discarded, or the store's error if the commit fails.
    pub fn commit(&mut self) -> Result<Arc<Snapshot>> {
        match &mut self.diff {
            SessionDiff::Joined { .. } => Err(Error::commit_authority(self.owner.as_str())),
            SessionDiff::Exclusive(slot) => {
                let diff = slot.take().ok_or_else(Error::session_closed)?;
                diff.commit(&self.store)
            }
        }
    }

    /// Ends the session without committing.
    ///
    /// An exclusive session drops its changes. A joined session only
    /// detaches: its writes stay in the batch's diff.
    pub fn discard(&mut self) {
        match &mut self.diff {
            SessionDiff::Exclusive(slot) => {
                if let Some(diff) = slot.take() {
                    diff.discard();
                }
            }
            SessionDiff::Joined { detached, .. } => *detached = true,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("owner", &self.owner)
            .field("kind", &self.kind())
            .field("source", &self.source)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}
