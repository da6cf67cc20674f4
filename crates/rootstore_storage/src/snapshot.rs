//! Immutable, versioned snapshots of configuration state.
//!
//! A `Snapshot` is never mutated after it is published. Clone is O(1) thanks
//! to the persistent entity map, so readers can hold on to one for as long as
//! they like without blocking writers.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rootstore_foundation::{EntityId, EntityKind, Error, IdAllocator, LtMap, Result, Value};

use crate::entity::Entity;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an [`EntityStore`](crate::EntityStore).
///
/// Snapshots and diffs remember which store they came from, so a diff is
/// never folded into a store it was not built against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreId(u64);

impl StoreId {
    /// Allocates a process-unique store id.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store-{}", self.0)
    }
}

/// Immutable point-in-time view of one store's entities.
#[derive(Clone)]
pub struct Snapshot {
    store: StoreId,
    version: u64,
    entities: LtMap<EntityId, Entity>,
    /// Shared by every snapshot of the store; not part of the content.
    ids: Arc<IdAllocator>,
}

impl Snapshot {
    /// Creates the empty version-0 snapshot of a new store.
    #[must_use]
    pub fn empty(store: StoreId) -> Self {
        Self {
            store,
            version: 0,
            entities: LtMap::new(),
            ids: Arc::new(IdAllocator::new()),
        }
    }

    pub(crate) fn from_parts(
        store: StoreId,
        version: u64,
        entities: LtMap<EntityId, Entity>,
        ids: Arc<IdAllocator>,
    ) -> Self {
        Self {
            store,
            version,
            entities,
            ids,
        }
    }

    /// Returns the id of the store that published this snapshot.
    #[must_use]
    pub fn store_id(&self) -> StoreId {
        self.store
    }

    /// Returns the snapshot version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the snapshot holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Looks up an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns true if the entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Iterates over all entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterates over all entity ids in order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Iterates over entities of one kind.
    pub fn of_kind<'a>(&'a self, kind: &'a EntityKind) -> impl Iterator<Item = &'a Entity> + 'a {
        self.iter().filter(move |e| e.kind() == kind)
    }

    /// Iterates over the direct children of `parent`.
    ///
    /// Note: this is a scan over all entities.
    pub fn children_of(&self, parent: EntityId) -> impl Iterator<Item = &Entity> {
        self.iter().filter(move |e| e.parent() == Some(parent))
    }

    /// Finds the first entity of `kind` whose field `name` equals `value`.
    #[must_use]
    pub fn find_by_field(&self, kind: &EntityKind, name: &str, value: &Value) -> Option<&Entity> {
        self.iter()
            .find(|e| e.kind() == kind && e.field(name) == Some(value))
    }

    /// Returns the raw entity map.
    #[must_use]
    pub fn entities(&self) -> &LtMap<EntityId, Entity> {
        &self.entities
    }

    /// Returns true if both snapshots hold the same entities, ignoring
    /// version and store identity.
    #[must_use]
    pub fn content_eq(&self, other: &Snapshot) -> bool {
        self.entities == other.entities
    }

    pub(crate) fn allocator(&self) -> &Arc<IdAllocator> {
        &self.ids
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store && self.version == other.version && self.content_eq(other)
    }
}

impl Eq for Snapshot {}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("store", &self.store)
            .field("version", &self.version)
            .field("entities", &self.entities.len())
            .finish()
    }
}

/// Checks that every parent link in `entities` resolves and that no entity
/// is its own ancestor.
pub(crate) fn check_tree(entities: &LtMap<EntityId, Entity>) -> Result<()> {
    let mut rooted: HashSet<EntityId> = HashSet::new();
    for entity in entities.values() {
        let mut path = HashSet::new();
        let mut next = Some(entity);
        while let Some(current) = next {
            let id = current.id();
            if rooted.contains(&id) {
                break;
            }
            if !path.insert(id) {
                return Err(Error::parent_cycle(id, current.parent().unwrap_or(id)));
            }
            next = match current.parent() {
                None => None,
                Some(parent) => Some(
                    entities
                        .get(&parent)
                        .ok_or_else(|| Error::dangling_parent(id, parent))?,
                ),
            };
        }
        rooted.extend(path);
    }
    Ok(())
}

#[cfg(feature = "serde")]
mod serde_support {
    use super::{Entity, EntityId, IdAllocator, LtMap, Snapshot, StoreId, check_tree};
    use serde::de::Error as _;
    use serde::ser::SerializeStruct;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::sync::Arc;

    impl Serialize for Snapshot {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            // The id allocator is process state, not content
            let mut state = serializer.serialize_struct("Snapshot", 3)?;
            state.serialize_field("store", &self.store)?;
            state.serialize_field("version", &self.version)?;
            state.serialize_field("entities", &self.entities)?;
            state.end()
        }
    }

    #[derive(Deserialize)]
    struct SnapshotRepr {
        store: StoreId,
        version: u64,
        entities: LtMap<EntityId, Entity>,
    }

    impl<'de> Deserialize<'de> for Snapshot {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let repr = SnapshotRepr::deserialize(deserializer)?;
            check_tree(&repr.entities).map_err(D::Error::custom)?;
            let ids = IdAllocator::new();
            if let Some(last) = repr.entities.keys().last() {
                ids.reserve(*last);
            }
            Ok(Snapshot {
                store: repr.store,
                version: repr.version,
                entities: repr.entities,
                ids: Arc::new(ids),
            })
        }
    }
}
