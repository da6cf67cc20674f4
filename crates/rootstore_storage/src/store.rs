//! The entity store: one current snapshot plus a version counter.
//!
//! Readers load the current snapshot through an `ArcSwap`, so `current()`
//! never blocks and always returns a complete snapshot. Commits are
//! serialized by the history lock and publish the new snapshot with a single
//! atomic pointer swap.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rootstore_foundation::{EntityId, Error, ErrorKind, IdAllocator, LtMap, Result};

use crate::builder::DiffBuilder;
use crate::config::{CommitPolicy, StoreConfig};
use crate::diff::{SnapshotDiff, diff_snapshots};
use crate::entity::Entity;
use crate::snapshot::{Snapshot, StoreId, check_tree};

/// Owns the current snapshot of one configuration tree.
pub struct EntityStore {
    id: StoreId,
    current: ArcSwap<Snapshot>,
    /// Superseded snapshots, newest first. Also serializes writers.
    history: Mutex<VecDeque<Arc<Snapshot>>>,
    config: StoreConfig,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// Creates an empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        let id = StoreId::fresh();
        Self {
            id,
            current: ArcSwap::from_pointee(Snapshot::empty(id)),
            history: Mutex::new(VecDeque::new()),
            config,
        }
    }

    /// Creates a store whose version-0 snapshot holds `entities`.
    ///
    /// # Errors
    ///
    /// Returns an error if two entities share an id, an entity's parent is
    /// missing, or the parent links form a cycle.
    pub fn seeded(entities: impl IntoIterator<Item = Entity>, config: StoreConfig) -> Result<Self> {
        let id = StoreId::fresh();
        let ids = IdAllocator::new();
        let mut content: LtMap<EntityId, Entity> = LtMap::new();

        for entity in entities {
            let entity_id = entity.id();
            ids.reserve(entity_id);
            if content.insert_mut(entity_id, entity).is_some() {
                return Err(Error::duplicate_entity(entity_id));
            }
        }
        check_tree(&content)?;

        let snapshot = Snapshot::from_parts(id, 0, content, Arc::new(ids));
        Ok(Self {
            id,
            current: ArcSwap::from_pointee(snapshot),
            history: Mutex::new(VecDeque::new()),
            config,
        })
    }

    /// Returns the store's identity.
    #[must_use]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the live snapshot. Never blocks, never fails.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Returns the current version. Increases by one on every commit.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    /// Alias of [`version`](Self::version) for hosts that count modifications.
    #[must_use]
    pub fn modification_count(&self) -> u64 {
        self.version()
    }

    /// Opens a fresh diff against the current snapshot.
    #[must_use]
    pub fn begin(&self) -> DiffBuilder {
        DiffBuilder::from(self.current())
    }

    /// Returns retained superseded snapshots, newest first.
    #[must_use]
    pub fn history(&self) -> Vec<Arc<Snapshot>> {
        self.history.lock().iter().cloned().collect()
    }

    /// Returns the snapshot published at `version`, if still retained.
    #[must_use]
    pub fn snapshot_at(&self, version: u64) -> Option<Arc<Snapshot>> {
        let current = self.current();
        if current.version() == version {
            return Some(current);
        }
        self.history
            .lock()
            .iter()
            .find(|s| s.version() == version)
            .cloned()
    }

    /// Describes what changed between `version` and the current snapshot.
    ///
    /// Returns `None` if that version is no longer retained.
    #[must_use]
    pub fn changes_since(&self, version: u64) -> Option<SnapshotDiff> {
        let old = self.snapshot_at(version)?;
        Some(diff_snapshots(&old, &self.current()))
    }

    /// Folds `diff` into the store and publishes the result.
    pub(crate) fn apply(&self, diff: DiffBuilder, policy: CommitPolicy) -> Result<Arc<Snapshot>> {
        if diff.store_id() != self.id {
            return Err(Error::new(ErrorKind::Internal(format!(
                "diff built against {} cannot commit into {}",
                diff.store_id(),
                self.id
            ))));
        }

        let mut history = self.history.lock();
        let current = self.current.load_full();
        let base = diff.base_version();

        if current.version() != base {
            match policy {
                CommitPolicy::Reject => {
                    tracing::debug!(
                        event = "commit_rejected",
                        store = %self.id,
                        base,
                        current = current.version(),
                        "diff base is stale"
                    );
                    return Err(Error::stale_base(base, current.version()));
                }
                CommitPolicy::LastWriterWins => {
                    tracing::warn!(
                        event = "forced_commit",
                        store = %self.id,
                        base,
                        current = current.version(),
                        "overwriting newer snapshot with stale diff"
                    );
                }
            }
        }

        let changes = diff.overlay_len();
        let entities = diff.merged_onto(current.entities());
        if current.version() != base {
            // The diff checked its links against its own base, not this one
            if let Err(err) = check_tree(&entities) {
                tracing::debug!(
                    event = "commit_rejected",
                    store = %self.id,
                    base,
                    current = current.version(),
                    error = %err,
                    "stale diff breaks the entity tree"
                );
                return Err(err);
            }
        }
        let next = Arc::new(Snapshot::from_parts(
            self.id,
            current.version() + 1,
            entities,
            Arc::clone(current.allocator()),
        ));
        self.publish(&mut history, current, Arc::clone(&next));

        tracing::debug!(
            event = "commit",
            store = %self.id,
            base,
            version = next.version(),
            changes,
            "committed diff"
        );
        Ok(next)
    }

    /// Swaps in `next` and retires `previous` into the history.
    fn publish(
        &self,
        history: &mut VecDeque<Arc<Snapshot>>,
        previous: Arc<Snapshot>,
        next: Arc<Snapshot>,
    ) {
        self.current.store(next);
        if self.config.history_size > 0 {
            history.push_front(previous);
            history.truncate(self.config.history_size);
        }
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("id", &self.id)
            .field("version", &self.version())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
