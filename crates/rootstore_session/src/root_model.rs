//! The derived view of one module's roots and dependencies.
//!
//! [`RootModel`] is computed from a snapshot (or, for uncommitted edits,
//! from a diff) and never changes afterwards. Module components memoize it
//! in a [`DerivedViewCache`](rootstore_cache::DerivedViewCache).

use std::sync::Arc;

use rootstore_foundation::{EntityId, EntityKind, EntitySource, LtMap, Value};
use rootstore_storage::{DiffBuilder, Entity, Snapshot};

use crate::fields;

// =============================================================================
// Model sources
// =============================================================================

/// Read access a root model can be computed from.
pub trait ModelSource {
    /// Looks up an entity.
    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Returns the direct children of `parent` in id order.
    fn children(&self, parent: EntityId) -> Vec<&Entity>;

    /// Returns every module entity in id order.
    fn modules(&self) -> Vec<&Entity>;

    /// Returns the version the view reflects.
    fn model_version(&self) -> u64;
}

impl ModelSource for Snapshot {
    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.get(id)
    }

    fn children(&self, parent: EntityId) -> Vec<&Entity> {
        self.children_of(parent).collect()
    }

    fn modules(&self) -> Vec<&Entity> {
        self.of_kind(&EntityKind::Module).collect()
    }

    fn model_version(&self) -> u64 {
        self.version()
    }
}

impl ModelSource for DiffBuilder {
    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.get(id)
    }

    fn children(&self, parent: EntityId) -> Vec<&Entity> {
        self.children_of(parent).collect()
    }

    fn modules(&self) -> Vec<&Entity> {
        self.of_kind(&EntityKind::Module).collect()
    }

    fn model_version(&self) -> u64 {
        self.base_version()
    }
}

// =============================================================================
// View types
// =============================================================================

/// Scope of a module or library dependency.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DependencyScope {
    /// Needed everywhere.
    #[default]
    Compile,
    /// Only needed by tests.
    Test,
    /// Needed at runtime only.
    Runtime,
    /// Provided by the environment.
    Provided,
}

impl DependencyScope {
    /// Parses a stored scope; unknown values are treated as compile scope.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "test" => Self::Test,
            "runtime" => Self::Runtime,
            "provided" => Self::Provided,
            _ => Self::Compile,
        }
    }

    /// Returns the stored form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Test => "test",
            Self::Runtime => "runtime",
            Self::Provided => "provided",
        }
    }

    /// Returns true if production code sees the dependency.
    #[must_use]
    pub const fn is_production(self) -> bool {
        !matches!(self, Self::Test)
    }
}

/// A source folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceRoot {
    /// Backing entity.
    pub id: EntityId,
    /// Folder URL.
    pub url: Arc<str>,
    /// Root type, e.g. `"java-source"`.
    pub root_type: Arc<str>,
    /// True for test sources.
    pub is_test: bool,
}

/// A content root with the folders beneath it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentEntry {
    /// Backing entity.
    pub id: EntityId,
    /// Root URL.
    pub url: Arc<str>,
    /// Source folders, in creation order.
    pub source_roots: Vec<SourceRoot>,
    /// Excluded folder URLs, in creation order.
    pub exclude_urls: Vec<Arc<str>>,
    /// Excluded file name patterns, in insertion order.
    pub exclude_patterns: Vec<Arc<str>>,
}

/// One entry of a module's classpath order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderEntry {
    /// The module's own sources.
    ModuleSource,
    /// The module's sdk (or the inherited project sdk).
    Sdk,
    /// A dependency on another module.
    Module {
        /// Backing entity.
        id: EntityId,
        /// Name of the target module.
        name: Arc<str>,
        /// The target module, if it exists in the same snapshot.
        resolved: Option<EntityId>,
        /// Dependency scope.
        scope: DependencyScope,
        /// True if re-exported to dependents.
        exported: bool,
    },
    /// A dependency on a library.
    Library {
        /// Backing entity.
        id: EntityId,
        /// Library name.
        name: Arc<str>,
        /// Dependency scope.
        scope: DependencyScope,
        /// True if re-exported to dependents.
        exported: bool,
    },
}

/// A named module extension and its settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleExtension {
    /// Backing entity.
    pub id: EntityId,
    /// Extension name.
    pub name: Arc<str>,
    /// Stored settings.
    pub settings: LtMap<Arc<str>, Value>,
}

impl ModuleExtension {
    /// Returns one setting.
    #[must_use]
    pub fn setting(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }
}

// =============================================================================
// Root Model
// =============================================================================

/// Immutable view of one module's configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootModel {
    module: EntityId,
    version: u64,
    name: Arc<str>,
    source: Option<EntitySource>,
    content_entries: Vec<ContentEntry>,
    order_entries: Vec<OrderEntry>,
    sdk: Option<Arc<str>>,
    sdk_inherited: bool,
    extensions: Vec<ModuleExtension>,
}

impl RootModel {
    /// Computes the view of `module` from a snapshot.
    #[must_use]
    pub fn of(snapshot: &Snapshot, module: EntityId) -> Self {
        Self::compute(snapshot, module)
    }

    /// Computes the view of `module` from any model source.
    ///
    /// A missing module yields an empty model.
    #[must_use]
    pub fn compute<S: ModelSource + ?Sized>(source: &S, module: EntityId) -> Self {
        let version = source.model_version();
        let Some(entity) = source
            .entity(module)
            .filter(|e| *e.kind() == EntityKind::Module)
        else {
            return Self::empty(module, version);
        };

        let mut content_entries = Vec::new();
        let mut order_entries = Vec::new();
        let mut extensions = Vec::new();

        for child in source.children(module) {
            match child.kind() {
                EntityKind::ContentRoot => {
                    if let Some(entry) = content_entry(source, child) {
                        content_entries.push(entry);
                    }
                }
                EntityKind::OrderEntry => {
                    if let Some(entry) = order_entry(source, child) {
                        order_entries.push(entry);
                    }
                }
                EntityKind::Facet(name) => extensions.push(ModuleExtension {
                    id: child.id(),
                    name: Arc::clone(name),
                    settings: child.fields().clone(),
                }),
                _ => {}
            }
        }

        Self {
            module,
            version,
            name: Arc::from(entity.str_field(fields::NAME).unwrap_or_default()),
            source: Some(entity.source().clone()),
            content_entries,
            order_entries,
            sdk: entity.str_field(fields::SDK).map(Arc::from),
            sdk_inherited: entity.flag(fields::INHERIT_SDK),
            extensions,
        }
    }

    fn empty(module: EntityId, version: u64) -> Self {
        Self {
            module,
            version,
            name: Arc::from(""),
            source: None,
            content_entries: Vec::new(),
            order_entries: Vec::new(),
            sdk: None,
            sdk_inherited: false,
            extensions: Vec::new(),
        }
    }

    /// Returns the module entity this view describes.
    #[must_use]
    pub fn module_id(&self) -> EntityId {
        self.module
    }

    /// Returns the snapshot version the view was computed from.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns false if the module did not exist.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.source.is_some()
    }

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the module's provenance.
    #[must_use]
    pub fn source(&self) -> Option<&EntitySource> {
        self.source.as_ref()
    }

    /// Returns the external system that imported the module, if any.
    #[must_use]
    pub fn external_source(&self) -> Option<&str> {
        match &self.source {
            Some(EntitySource::External { system_id, .. }) => Some(&**system_id),
            _ => None,
        }
    }

    /// Returns the content roots.
    #[must_use]
    pub fn content_entries(&self) -> &[ContentEntry] {
        &self.content_entries
    }

    /// Returns the content root URLs.
    #[must_use]
    pub fn content_root_urls(&self) -> Vec<Arc<str>> {
        self.content_entries.iter().map(|e| Arc::clone(&e.url)).collect()
    }

    /// Iterates over every source root.
    pub fn source_roots(&self) -> impl Iterator<Item = &SourceRoot> {
        self.content_entries.iter().flat_map(|e| e.source_roots.iter())
    }

    /// Returns source root URLs, optionally leaving out test roots.
    #[must_use]
    pub fn source_root_urls(&self, include_tests: bool) -> Vec<Arc<str>> {
        self.source_roots()
            .filter(|r| include_tests || !r.is_test)
            .map(|r| Arc::clone(&r.url))
            .collect()
    }

    /// Returns URLs of source roots whose type is one of `root_types`.
    #[must_use]
    pub fn source_root_urls_of_type(&self, root_types: &[&str]) -> Vec<Arc<str>> {
        self.source_roots()
            .filter(|r| root_types.contains(&&*r.root_type))
            .map(|r| Arc::clone(&r.url))
            .collect()
    }

    /// Returns the excluded folder URLs.
    #[must_use]
    pub fn exclude_root_urls(&self) -> Vec<Arc<str>> {
        self.content_entries
            .iter()
            .flat_map(|e| e.exclude_urls.iter().cloned())
            .collect()
    }

    /// Returns the exclude patterns of every content root.
    #[must_use]
    pub fn exclude_patterns(&self) -> Vec<Arc<str>> {
        self.content_entries
            .iter()
            .flat_map(|e| e.exclude_patterns.iter().cloned())
            .collect()
    }

    /// Returns the classpath order.
    #[must_use]
    pub fn order_entries(&self) -> &[OrderEntry] {
        &self.order_entries
    }

    /// Returns the names of every module dependency, resolved or not.
    #[must_use]
    pub fn dependency_module_names(&self) -> Vec<Arc<str>> {
        self.order_entries
            .iter()
            .filter_map(|entry| match entry {
                OrderEntry::Module { name, .. } => Some(Arc::clone(name)),
                _ => None,
            })
            .collect()
    }

    /// Returns the modules this one depends on that exist in the snapshot.
    #[must_use]
    pub fn module_dependencies(&self, include_tests: bool) -> Vec<EntityId> {
        self.order_entries
            .iter()
            .filter_map(|entry| match entry {
                OrderEntry::Module {
                    resolved: Some(id),
                    scope,
                    ..
                } if include_tests || scope.is_production() => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Returns true if a module dependency on `name` exists.
    #[must_use]
    pub fn is_depends_on(&self, name: &str) -> bool {
        self.order_entries
            .iter()
            .any(|entry| matches!(entry, OrderEntry::Module { name: n, .. } if &**n == name))
    }

    /// Returns the module's own sdk name.
    #[must_use]
    pub fn sdk(&self) -> Option<&str> {
        self.sdk.as_deref()
    }

    /// Returns true if the module uses the project sdk.
    #[must_use]
    pub fn is_sdk_inherited(&self) -> bool {
        self.sdk_inherited
    }

    /// Looks up an extension by name.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&ModuleExtension> {
        self.extensions.iter().find(|ext| &*ext.name == name)
    }

    /// Returns the extension names.
    #[must_use]
    pub fn extension_names(&self) -> Vec<Arc<str>> {
        self.extensions.iter().map(|ext| Arc::clone(&ext.name)).collect()
    }
}

fn content_entry<S: ModelSource + ?Sized>(source: &S, root: &Entity) -> Option<ContentEntry> {
    let url = root.str_field(fields::URL)?;
    let mut entry = ContentEntry {
        id: root.id(),
        url: Arc::from(url),
        source_roots: Vec::new(),
        exclude_urls: Vec::new(),
        exclude_patterns: root
            .field(fields::EXCLUDE_PATTERNS)
            .and_then(Value::as_list)
            .map(|patterns| patterns.iter().filter_map(Value::as_str).map(Arc::from).collect())
            .unwrap_or_default(),
    };

    for child in source.children(root.id()) {
        let Some(url) = child.str_field(fields::URL) else {
            continue;
        };
        match child.kind() {
            EntityKind::SourceRoot => entry.source_roots.push(SourceRoot {
                id: child.id(),
                url: Arc::from(url),
                root_type: Arc::from(
                    child
                        .str_field(fields::ROOT_TYPE)
                        .unwrap_or(fields::JAVA_SOURCE),
                ),
                is_test: child.flag(fields::IS_TEST),
            }),
            EntityKind::ExcludeRoot => entry.exclude_urls.push(Arc::from(url)),
            _ => {}
        }
    }
    Some(entry)
}

fn order_entry<S: ModelSource + ?Sized>(source: &S, entity: &Entity) -> Option<OrderEntry> {
    let scope = entity
        .str_field(fields::SCOPE)
        .map(DependencyScope::parse)
        .unwrap_or_default();
    let exported = entity.flag(fields::EXPORTED);

    match entity.str_field(fields::ENTRY)? {
        "source" => Some(OrderEntry::ModuleSource),
        "sdk" => Some(OrderEntry::Sdk),
        "module" => {
            let name = entity.str_field(fields::TARGET)?;
            let resolved = source
                .modules()
                .into_iter()
                .find(|m| m.str_field(fields::NAME) == Some(name))
                .map(Entity::id);
            Some(OrderEntry::Module {
                id: entity.id(),
                name: Arc::from(name),
                resolved,
                scope,
                exported,
            })
        }
        "library" => Some(OrderEntry::Library {
            id: entity.id(),
            name: Arc::from(entity.str_field(fields::TARGET)?),
            scope,
            exported,
        }),
        _ => None,
    }
}
