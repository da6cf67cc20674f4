//! Entity identifiers and their allocator.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a configuration entity.
///
/// Ids are allocated from an [`IdAllocator`] shared by every snapshot and
/// diff of one store, so two diffs opened against the same base never hand
/// out the same id.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId {
    /// Monotonic index within the owning store.
    pub index: u64,
}

impl EntityId {
    /// Creates an entity id with the given index.
    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self { index }
    }

    /// Returns a sentinel value representing "no entity".
    ///
    /// Uses `u64::MAX` as the index, which is never allocated.
    #[must_use]
    pub const fn null() -> Self {
        Self { index: u64::MAX }
    }

    /// Returns true if this is the null sentinel.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u64::MAX
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "EntityId(null)")
        } else {
            write!(f, "EntityId({})", self.index)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "#null")
        } else {
            write!(f, "#{}", self.index)
        }
    }
}

/// Hands out fresh [`EntityId`]s for one store.
///
/// Allocation is a single atomic increment; ids are never reused, even when
/// the diff that allocated them is discarded.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator starting at index 0.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates an allocator whose first id has the given index.
    ///
    /// Used when a store is seeded with entities that already carry ids.
    #[must_use]
    pub fn starting_at(index: u64) -> Self {
        Self {
            next: AtomicU64::new(index),
        }
    }

    /// Allocates the next id.
    pub fn allocate(&self) -> EntityId {
        EntityId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Makes sure future allocations never collide with `id`.
    pub fn reserve(&self, id: EntityId) {
        if id.is_null() {
            return;
        }
        self.next.fetch_max(id.index + 1, Ordering::Relaxed);
    }

    /// Returns the index the next allocation will use.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
