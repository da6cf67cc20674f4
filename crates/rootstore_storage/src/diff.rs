//! Snapshot comparison.
//!
//! Compares two snapshots to report which entities were added, removed, or
//! changed between them, e.g. to describe what a commit did.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::sync::Arc;

use rootstore_foundation::EntityId;

use crate::entity::Entity;
use crate::snapshot::Snapshot;

/// A changed entity, before and after.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityChange {
    /// The entity as it was.
    pub old: Entity,
    /// The entity as it is now.
    pub new: Entity,
}

impl EntityChange {
    /// Returns the id of the changed entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.new.id()
    }

    /// Returns the names of fields that were added, removed, or changed.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self
            .old
            .fields()
            .iter()
            .filter(|(name, value)| self.new.field(name) != Some(*value))
            .map(|(name, _)| Arc::clone(name))
            .collect();
        names.extend(
            self.new
                .fields()
                .keys()
                .filter(|name| self.old.field(name).is_none())
                .cloned(),
        );
        names.sort();
        names
    }

    /// Returns true if the provenance tag changed.
    #[must_use]
    pub fn source_changed(&self) -> bool {
        self.old.source() != self.new.source()
    }

    /// Returns true if the entity moved to another parent.
    #[must_use]
    pub fn reparented(&self) -> bool {
        self.old.parent() != self.new.parent()
    }
}

/// Differences between two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Entities only present in the newer snapshot.
    pub added: Vec<EntityId>,
    /// Entities only present in the older snapshot.
    pub removed: Vec<EntityId>,
    /// Entities present in both with different content.
    pub modified: Vec<EntityChange>,
}

impl SnapshotDiff {
    /// Returns true if the snapshots hold identical content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Returns the total number of entities affected.
    #[must_use]
    pub fn affected_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Computes the differences between `old` and `new`.
///
/// Both entity maps are walked once in id order; shared subtrees make
/// identical snapshots compare in O(1).
#[must_use]
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();
    if old.entities().ptr_eq(new.entities()) {
        return diff;
    }

    let mut left: Peekable<_> = old.iter().peekable();
    let mut right: Peekable<_> = new.iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(l), Some(r)) => l.id().cmp(&r.id()),
        };

        match order {
            Ordering::Less => {
                if let Some(gone) = left.next() {
                    diff.removed.push(gone.id());
                }
            }
            Ordering::Greater => {
                if let Some(fresh) = right.next() {
                    diff.added.push(fresh.id());
                }
            }
            Ordering::Equal => {
                if let (Some(l), Some(r)) = (left.next(), right.next()) {
                    if l != r {
                        diff.modified.push(EntityChange {
                            old: l.clone(),
                            new: r.clone(),
                        });
                    }
                }
            }
        }
    }

    diff
}
