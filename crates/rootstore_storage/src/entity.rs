//! Configuration entities.
//!
//! An entity is a plain value: a kind, a provenance tag, an optional parent
//! link, and a map of named fields. The tree shape of a configuration comes
//! from the parent links (module -> content root -> source root, ...).

use std::sync::Arc;

use rootstore_foundation::{EntityId, EntityKind, EntitySource, LtMap, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single configuration entity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    source: EntitySource,
    parent: Option<EntityId>,
    fields: LtMap<Arc<str>, Value>,
}

impl Entity {
    /// Creates an entity with no parent and no fields.
    #[must_use]
    pub fn new(id: EntityId, kind: EntityKind, source: EntitySource) -> Self {
        Self {
            id,
            kind,
            source,
            parent: None,
            fields: LtMap::new(),
        }
    }

    /// Builder method to set the parent.
    #[must_use]
    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builder method to set a field.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Returns the entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity kind.
    #[must_use]
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Returns the provenance tag.
    #[must_use]
    pub fn source(&self) -> &EntitySource {
        &self.source
    }

    /// Returns the parent entity, if any.
    #[must_use]
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Gets a field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Gets a field as a string (or url).
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Gets a field as a boolean, defaulting to `false` when absent.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.field(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Returns all fields in name order.
    #[must_use]
    pub fn fields(&self) -> &LtMap<Arc<str>, Value> {
        &self.fields
    }

    /// Sets a field in place.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert_mut(Arc::from(name), value.into());
    }

    /// Removes a field in place, returning its old value.
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove_mut(name)
    }

    /// Replaces the provenance tag.
    pub fn set_source(&mut self, source: EntitySource) {
        self.source = source;
    }

    /// Replaces the parent link.
    pub fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }
}
