//! Entity kinds and provenance tags.
//!
//! Every entity carries an [`EntitySource`]. Downstream serializers use it to
//! pick where the entity is written, so entities created in one logical
//! transaction must share the same source.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a configuration entity describes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntityKind {
    /// A module, the root of one configuration tree.
    Module,
    /// A content root directory of a module.
    ContentRoot,
    /// A source folder inside a content root.
    SourceRoot,
    /// An excluded folder inside a content root.
    ExcludeRoot,
    /// A dependency entry (module, library, or sdk) of a module.
    OrderEntry,
    /// A library owned by a module.
    Library,
    /// A named module extension (facet).
    Facet(Arc<str>),
    /// Anything else, identified by name.
    Custom(Arc<str>),
}

impl EntityKind {
    /// Creates a facet kind.
    #[must_use]
    pub fn facet(name: &str) -> Self {
        Self::Facet(Arc::from(name))
    }

    /// Creates a custom kind.
    #[must_use]
    pub fn custom(name: &str) -> Self {
        Self::Custom(Arc::from(name))
    }

    /// Returns the kind name used in logs and debug output.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Module => "module",
            Self::ContentRoot => "content-root",
            Self::SourceRoot => "source-root",
            Self::ExcludeRoot => "exclude-root",
            Self::OrderEntry => "order-entry",
            Self::Library => "library",
            Self::Facet(name) | Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Facet(name) => write!(f, "facet:{name}"),
            Self::Custom(name) => write!(f, "custom:{name}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Where an entity would be persisted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageLocation {
    /// The project's own configuration directory.
    Project(Arc<str>),
    /// The external system's cache directory.
    ExternalCache {
        /// External system owning the data.
        system_id: Arc<str>,
        /// File inside that system's storage.
        file: Arc<str>,
    },
}

/// Provenance tag of an entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntitySource {
    /// Authored locally and stored in a project file.
    Local {
        /// Configuration file the entity belongs to.
        file: Arc<str>,
    },
    /// Imported by an external build system.
    External {
        /// Identifier of the importing system (e.g. `"gradle"`).
        system_id: Arc<str>,
        /// Configuration file the entity belongs to.
        file: Arc<str>,
    },
}

impl EntitySource {
    /// Creates a local source for `file`.
    #[must_use]
    pub fn local(file: &str) -> Self {
        Self::Local {
            file: Arc::from(file),
        }
    }

    /// Creates an external source for `file` owned by `system_id`.
    #[must_use]
    pub fn external(system_id: &str, file: &str) -> Self {
        Self::External {
            system_id: Arc::from(system_id),
            file: Arc::from(file),
        }
    }

    /// Returns the configuration file this source points at.
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::Local { file } | Self::External { file, .. } => file,
        }
    }

    /// Returns true if the entity was imported by an external system.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }

    /// Returns where a serializer would place an entity with this source.
    #[must_use]
    pub fn storage_location(&self) -> StorageLocation {
        match self {
            Self::Local { file } => StorageLocation::Project(Arc::clone(file)),
            Self::External { system_id, file } => StorageLocation::ExternalCache {
                system_id: Arc::clone(system_id),
                file: Arc::clone(file),
            },
        }
    }
}

impl fmt::Display for EntitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { file } => write!(f, "local:{file}"),
            Self::External { system_id, file } => write!(f, "external({system_id}):{file}"),
        }
    }
}
