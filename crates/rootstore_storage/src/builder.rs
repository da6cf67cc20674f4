//! Copy-on-write diffs over a snapshot.
//!
//! A `DiffBuilder` records insertions, updates, and removals in a private
//! overlay. The base snapshot is never touched: creating a builder only
//! clones an `Arc`, and reads through the builder see overlay-over-base.
//! Committing folds the overlay into an [`EntityStore`], producing a new
//! snapshot; dropping (or [`discard`](DiffBuilder::discard)ing) the builder
//! throws the overlay away.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::iter::Peekable;
use std::sync::Arc;

use rootstore_foundation::{
    EntityId, EntityKind, EntitySource, Error, ErrorKind, LtMap, Result, Value,
};

use crate::config::CommitPolicy;
use crate::entity::Entity;
use crate::snapshot::{Snapshot, StoreId, check_tree};
use crate::store::EntityStore;

// =============================================================================
// Overlay entries
// =============================================================================

#[derive(Clone, Debug)]
enum Pending {
    Put(Entity),
    Removed,
}

/// How a pending change relates to the base snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// The entity does not exist in the base.
    Added,
    /// The entity exists in the base and will be replaced.
    Modified,
    /// The entity exists in the base and will be removed.
    Removed,
}

/// A single pending change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Change {
    /// Entity affected.
    pub id: EntityId,
    /// What happens to it.
    pub kind: ChangeKind,
}

// =============================================================================
// Diff Builder
// =============================================================================

/// Mutable overlay of pending changes against a base snapshot.
#[derive(Clone)]
pub struct DiffBuilder {
    base: Arc<Snapshot>,
    overlay: LtMap<EntityId, Pending>,
}

impl DiffBuilder {
    /// Creates a builder over `base`. O(1): only the `Arc` is cloned.
    #[must_use]
    pub fn from(base: Arc<Snapshot>) -> Self {
        Self {
            base,
            overlay: LtMap::new(),
        }
    }

    /// Returns the snapshot this builder was created from.
    #[must_use]
    pub fn base(&self) -> &Arc<Snapshot> {
        &self.base
    }

    /// Returns the version of the base snapshot.
    #[must_use]
    pub fn base_version(&self) -> u64 {
        self.base.version()
    }

    /// Returns the store the base snapshot belongs to.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.base.store_id()
    }

    /// Returns true if no changes are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlay.is_empty()
    }

    /// Returns true if `store` has moved past this builder's base.
    #[must_use]
    pub fn is_stale_against(&self, store: &EntityStore) -> bool {
        store.id() != self.store_id() || store.version() != self.base_version()
    }

    // --- Reads (overlay over base) ---

    /// Looks up an entity, preferring the overlay.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        match self.overlay.get(&id) {
            Some(Pending::Put(entity)) => Some(entity),
            Some(Pending::Removed) => None,
            None => self.base.get(id),
        }
    }

    /// Returns true if the entity is visible through the builder.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates over the visible entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        Overlaid {
            base: self.base.entities().iter().peekable(),
            overlay: self.overlay.iter().peekable(),
        }
    }

    /// Returns the number of visible entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Iterates over visible entities of one kind.
    pub fn of_kind<'a>(&'a self, kind: &'a EntityKind) -> impl Iterator<Item = &'a Entity> + 'a {
        self.iter().filter(move |e| e.kind() == kind)
    }

    /// Iterates over the visible direct children of `parent`.
    pub fn children_of(&self, parent: EntityId) -> impl Iterator<Item = &Entity> {
        self.iter().filter(move |e| e.parent() == Some(parent))
    }

    /// Finds the first visible entity of `kind` whose field `name` equals `value`.
    #[must_use]
    pub fn find_by_field(&self, kind: &EntityKind, name: &str, value: &Value) -> Option<&Entity> {
        self.iter()
            .find(|e| e.kind() == kind && e.field(name) == Some(value))
    }

    // --- Mutations (overlay only) ---

    /// Adds a new root-level entity and returns its freshly allocated id.
    pub fn add(&mut self, kind: EntityKind, source: EntitySource) -> EntityId {
        let id = self.base.allocator().allocate();
        self.overlay
            .insert_mut(id, Pending::Put(Entity::new(id, kind, source)));
        id
    }

    /// Adds a new entity under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is not visible through the builder.
    pub fn add_child(
        &mut self,
        parent: EntityId,
        kind: EntityKind,
        source: EntitySource,
    ) -> Result<EntityId> {
        if !self.contains(parent) {
            return Err(Error::entity_not_found(parent));
        }
        let id = self.base.allocator().allocate();
        let entity = Entity::new(id, kind, source).with_parent(parent);
        self.overlay.insert_mut(id, Pending::Put(entity));
        Ok(id)
    }

    /// Inserts a fully built entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already visible, or the entity's parent
    /// is not.
    pub fn insert(&mut self, entity: Entity) -> Result<()> {
        let id = entity.id();
        if self.contains(id) {
            return Err(Error::duplicate_entity(id));
        }
        if let Some(parent) = entity.parent() {
            if !self.contains(parent) {
                return Err(Error::dangling_parent(id, parent));
            }
        }
        self.base.allocator().reserve(id);
        self.overlay.insert_mut(id, Pending::Put(entity));
        Ok(())
    }

    /// Applies `f` to a copy of the entity and stores the result in the overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not visible, or `f` points it at a
    /// parent that is not visible or that lies beneath the entity itself.
    pub fn update(&mut self, id: EntityId, f: impl FnOnce(&mut Entity)) -> Result<()> {
        let mut entity = self
            .get(id)
            .cloned()
            .ok_or_else(|| Error::entity_not_found(id))?;
        f(&mut entity);
        if let Some(parent) = entity.parent() {
            if !self.contains(parent) {
                return Err(Error::dangling_parent(id, parent));
            }
            if self.reaches(parent, id) {
                return Err(Error::parent_cycle(id, parent));
            }
        }
        self.overlay.insert_mut(id, Pending::Put(entity));
        Ok(())
    }

    /// Sets one field on an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not visible.
    pub fn set_field(&mut self, id: EntityId, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.update(id, |e| e.set_field(name, value))
    }

    /// Re-tags an entity with a different provenance.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not visible.
    pub fn modify_source(&mut self, id: EntityId, source: EntitySource) -> Result<()> {
        self.update(id, |e| e.set_source(source))
    }

    /// Removes an entity together with every descendant.
    ///
    /// Returns the removed ids, the requested entity first.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not visible.
    pub fn remove(&mut self, id: EntityId) -> Result<Vec<EntityId>> {
        if !self.contains(id) {
            return Err(Error::entity_not_found(id));
        }

        let mut children: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for entity in self.iter() {
            if let Some(parent) = entity.parent() {
                children.entry(parent).or_default().push(entity.id());
            }
        }

        let mut removed = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                continue;
            }
            removed.push(next);
            if let Some(kids) = children.get(&next) {
                stack.extend(kids.iter().rev());
            }
        }

        for gone in &removed {
            if self.base.contains(*gone) {
                self.overlay.insert_mut(*gone, Pending::Removed);
            } else {
                // Never existed outside this overlay
                self.overlay.remove_mut(gone);
            }
        }
        Ok(removed)
    }

    // --- Introspection ---

    /// Lists the pending changes in id order.
    #[must_use]
    pub fn pending(&self) -> Vec<Change> {
        self.overlay
            .iter()
            .map(|(id, pending)| {
                let kind = match pending {
                    Pending::Removed => ChangeKind::Removed,
                    Pending::Put(_) if self.base.contains(*id) => ChangeKind::Modified,
                    Pending::Put(_) => ChangeKind::Added,
                };
                Change { id: *id, kind }
            })
            .collect()
    }

    /// Returns the ids with pending changes.
    #[must_use]
    pub fn changed_ids(&self) -> Vec<EntityId> {
        self.overlay.keys().copied().collect()
    }

    /// Replays the pending changes onto a newer snapshot of the same store.
    ///
    /// # Errors
    ///
    /// Returns an error if `snapshot` belongs to a different store, or if
    /// the replayed changes would leave an entity under a missing parent or
    /// inside a parent cycle.
    pub fn rebase_onto(&self, snapshot: Arc<Snapshot>) -> Result<DiffBuilder> {
        if snapshot.store_id() != self.store_id() {
            return Err(Error::new(ErrorKind::Internal(format!(
                "cannot rebase a diff of {} onto {}",
                self.store_id(),
                snapshot.store_id()
            ))));
        }
        check_tree(&self.merged_onto(snapshot.entities()))?;
        Ok(DiffBuilder {
            base: snapshot,
            overlay: self.overlay.clone(),
        })
    }

    // --- Commit / discard ---

    /// Folds the overlay into `store` following the store's commit policy.
    ///
    /// The builder is consumed: a committed diff cannot be reused.
    ///
    /// # Errors
    ///
    /// Returns a stale-base error if the store moved past the base and its
    /// policy is [`CommitPolicy::Reject`].
    pub fn commit(self, store: &EntityStore) -> Result<Arc<Snapshot>> {
        let policy = store.config().commit_policy;
        store.apply(self, policy)
    }

    /// Folds the overlay into `store`, overwriting whatever the store holds
    /// for the touched entities even if the base is stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the diff belongs to a different store.
    pub fn commit_forced(self, store: &EntityStore) -> Result<Arc<Snapshot>> {
        store.apply(self, CommitPolicy::LastWriterWins)
    }

    /// Drops the overlay. The base snapshot and the store are untouched.
    pub fn discard(self) {
        tracing::trace!(
            event = "discard",
            store = %self.store_id(),
            base = self.base_version(),
            changes = self.overlay.len(),
            "discarded diff"
        );
    }

    /// Returns true if walking up the parent chain from `start` reaches `target`.
    fn reaches(&self, start: EntityId, target: EntityId) -> bool {
        let mut seen = HashSet::new();
        let mut next = Some(start);
        while let Some(id) = next {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            next = self.get(id).and_then(Entity::parent);
        }
        false
    }

    pub(crate) fn overlay_len(&self) -> usize {
        self.overlay.len()
    }

    /// Applies the overlay on top of `target`.
    pub(crate) fn merged_onto(&self, target: &LtMap<EntityId, Entity>) -> LtMap<EntityId, Entity> {
        let mut merged = target.clone();
        for (id, pending) in self.overlay.iter() {
            match pending {
                Pending::Put(entity) => {
                    merged.insert_mut(*id, entity.clone());
                }
                Pending::Removed => {
                    merged.remove_mut(id);
                }
            }
        }
        merged
    }
}

impl fmt::Debug for DiffBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffBuilder")
            .field("store", &self.store_id())
            .field("base", &self.base_version())
            .field("pending", &self.overlay.len())
            .finish()
    }
}

// =============================================================================
// Overlay iteration
// =============================================================================

/// Merges two id-ordered streams, letting overlay entries shadow the base.
struct Overlaid<B: Iterator, O: Iterator> {
    base: Peekable<B>,
    overlay: Peekable<O>,
}

impl<'a, B, O> Iterator for Overlaid<B, O>
where
    B: Iterator<Item = (&'a EntityId, &'a Entity)>,
    O: Iterator<Item = (&'a EntityId, &'a Pending)>,
{
    type Item = &'a Entity;

    fn next(&mut self) -> Option<&'a Entity> {
        loop {
            let next_base = self.base.peek().map(|(id, _)| **id);
            let next_overlay = self.overlay.peek().map(|(id, _)| **id);

            match (next_base, next_overlay) {
                (None, None) => return None,
                (Some(_), None) => return self.base.next().map(|(_, e)| e),
                (Some(b), Some(o)) if b < o => return self.base.next().map(|(_, e)| e),
                (b, Some(o)) => {
                    if b == Some(o) {
                        // Shadowed by the overlay
                        self.base.next();
                    }
                    if let Some((_, Pending::Put(entity))) = self.overlay.next() {
                        return Some(entity);
                    }
                }
            }
        }
    }
}
