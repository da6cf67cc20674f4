//! The module root component: forwarding reads to a cached root model.
//!
//! A [`ModuleRootComponent`] is what the rest of a host talks to for one
//! module. Read accessors forward to the memoized [`RootModel`]; mutation
//! entry points hand out [`ModifiableRootModel`]s through the coordinator.

use std::fmt;
use std::sync::Arc;

use rootstore_cache::{
    CacheConfig, DerivedViewCache, Disposable, Disposer, InvalidationEvent, InvalidationHub,
    InvalidationSource, SnapshotSource,
};
use rootstore_foundation::{EntityId, EntitySource, Result};
use rootstore_storage::{EntityStore, Snapshot};

use crate::batch::Batch;
use crate::coordinator::MutableSessionCoordinator;
use crate::fields;
use crate::modifiable::ModifiableRootModel;
use crate::order_roots::OrderRoots;
use crate::owner::OwnerId;
use crate::root_model::{ModuleExtension, OrderEntry, RootModel};
use crate::shared::SharedDiff;

/// Root configuration façade for one module.
pub struct ModuleRootComponent {
    module: EntityId,
    owner: OwnerId,
    coordinator: MutableSessionCoordinator,
    model: Arc<DerivedViewCache<RootModel>>,
    order_roots: Arc<DerivedViewCache<OrderRoots>>,
    /// Drives `order_roots`; only [`drop_caches`](Self::drop_caches) fires it.
    cache_events: Arc<InvalidationHub>,
    scope: Disposer,
}

impl ModuleRootComponent {
    /// Creates the component for `module` and subscribes its root model
    /// cache to `extensions`, which fires whenever module extensions change.
    ///
    /// Order roots do not depend on extensions; they are dropped only by
    /// commits and [`drop_caches`](Self::drop_caches).
    ///
    /// # Errors
    ///
    /// Returns an error if `extensions` refuses the subscription.
    pub fn new(
        store: Arc<EntityStore>,
        module: EntityId,
        extensions: &Arc<dyn InvalidationSource>,
    ) -> Result<Self> {
        let name = store
            .current()
            .get(module)
            .and_then(|e| e.str_field(fields::NAME).map(str::to_string))
            .unwrap_or_else(|| module.to_string());
        let owner = OwnerId::new(&name);
        let source: Arc<dyn SnapshotSource> = Arc::clone(&store) as Arc<dyn SnapshotSource>;

        let model = Arc::new(DerivedViewCache::new(
            Arc::clone(&source),
            move |snapshot: &Snapshot| RootModel::of(snapshot, module),
            Arc::clone(extensions),
            CacheConfig::new(format!("root-model:{name}")),
        )?);
        let cache_events = Arc::new(InvalidationHub::new());
        let order_roots = Arc::new(DerivedViewCache::new(
            source,
            move |snapshot: &Snapshot| OrderRoots::of(snapshot, module),
            Arc::clone(&cache_events) as Arc<dyn InvalidationSource>,
            CacheConfig::new(format!("order-roots:{name}")),
        )?);

        let scope = Disposer::new(format!("module:{name}"));
        scope.register(Arc::clone(&model) as Arc<dyn Disposable>)?;
        scope.register(Arc::clone(&order_roots) as Arc<dyn Disposable>)?;

        Ok(Self {
            module,
            owner,
            coordinator: MutableSessionCoordinator::new(store),
            model,
            order_roots,
            cache_events,
            scope,
        })
    }

    /// Returns the module entity.
    #[must_use]
    pub fn module_id(&self) -> EntityId {
        self.module
    }

    /// Returns the identity sessions are opened under.
    #[must_use]
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Returns the coordinator for this module's store.
    #[must_use]
    pub fn coordinator(&self) -> &MutableSessionCoordinator {
        &self.coordinator
    }

    /// Returns the store's current snapshot.
    #[must_use]
    pub fn storage(&self) -> Arc<Snapshot> {
        self.coordinator.store().current()
    }

    /// Returns the store version; changes on every commit.
    #[must_use]
    pub fn modification_count(&self) -> u64 {
        self.coordinator.store().modification_count()
    }

    /// Returns the memoized root model.
    #[must_use]
    pub fn root_model(&self) -> Arc<RootModel> {
        self.model.value()
    }

    /// Returns the memoized order roots.
    #[must_use]
    pub fn order_roots(&self) -> Arc<OrderRoots> {
        self.order_roots.value()
    }

    /// Returns the root model cache.
    #[must_use]
    pub fn model_cache(&self) -> &DerivedViewCache<RootModel> {
        &self.model
    }

    /// Returns the order roots cache.
    #[must_use]
    pub fn order_roots_cache(&self) -> &DerivedViewCache<OrderRoots> {
        &self.order_roots
    }

    // --- Cache control ---

    /// Drops the order roots and the root model.
    pub fn drop_caches(&self) {
        self.cache_events.fire(&InvalidationEvent::DropCaches);
        self.drop_root_model_cache();
    }

    /// Drops only the root model.
    pub fn drop_root_model_cache(&self) {
        self.model.invalidate();
    }

    /// Releases the caches and their subscriptions. Idempotent.
    pub fn dispose(&self) {
        self.scope.dispose();
    }

    /// Returns true once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.scope.is_disposed()
    }

    // --- Forwarding accessors ---

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> String {
        self.root_model().name().to_string()
    }

    /// Returns the external system that imported the module, if any.
    #[must_use]
    pub fn external_source(&self) -> Option<String> {
        self.root_model().external_source().map(str::to_string)
    }

    /// Returns the content root URLs.
    #[must_use]
    pub fn content_root_urls(&self) -> Vec<Arc<str>> {
        self.root_model().content_root_urls()
    }

    /// Returns source root URLs, optionally leaving out test roots.
    #[must_use]
    pub fn source_root_urls(&self, include_tests: bool) -> Vec<Arc<str>> {
        self.root_model().source_root_urls(include_tests)
    }

    /// Returns source root URLs of the given root types.
    #[must_use]
    pub fn source_root_urls_of_type(&self, root_types: &[&str]) -> Vec<Arc<str>> {
        self.root_model().source_root_urls_of_type(root_types)
    }

    /// Returns the excluded folder URLs.
    #[must_use]
    pub fn exclude_root_urls(&self) -> Vec<Arc<str>> {
        self.root_model().exclude_root_urls()
    }

    /// Returns the exclude patterns of every content root.
    #[must_use]
    pub fn exclude_patterns(&self) -> Vec<Arc<str>> {
        self.root_model().exclude_patterns()
    }

    /// Returns the classpath order.
    #[must_use]
    pub fn order_entries(&self) -> Vec<OrderEntry> {
        self.root_model().order_entries().to_vec()
    }

    /// Returns the source roots of this module and its dependencies.
    #[must_use]
    pub fn order_root_urls(&self, include_tests: bool) -> Vec<Arc<str>> {
        self.order_roots().source_root_urls(include_tests).to_vec()
    }

    /// Returns the names of every module dependency.
    #[must_use]
    pub fn dependency_module_names(&self) -> Vec<Arc<str>> {
        self.root_model().dependency_module_names()
    }

    /// Returns the modules this one depends on.
    #[must_use]
    pub fn module_dependencies(&self, include_tests: bool) -> Vec<EntityId> {
        self.root_model().module_dependencies(include_tests)
    }

    /// Returns true if this module depends on the module called `name`.
    #[must_use]
    pub fn is_depends_on(&self, name: &str) -> bool {
        self.root_model().is_depends_on(name)
    }

    /// Returns true if the module uses the project sdk.
    #[must_use]
    pub fn is_sdk_inherited(&self) -> bool {
        self.root_model().is_sdk_inherited()
    }

    /// Returns the module's own sdk name.
    #[must_use]
    pub fn sdk(&self) -> Option<String> {
        self.root_model().sdk().map(str::to_string)
    }

    /// Looks up a module extension.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<ModuleExtension> {
        self.root_model().extension(name).cloned()
    }

    /// Returns the root properties for `url`, building them with `creator`.
    ///
    /// Always succeeds: properties are not cached per root.
    pub fn get_or_create_root_properties<T>(&self, _url: &str, creator: impl FnOnce() -> T) -> T {
        creator()
    }

    // --- Mutation entry points ---

    /// Opens an exclusive editing session over the current snapshot.
    ///
    /// New entities take the module's own provenance.
    #[must_use]
    pub fn modifiable_model(&self) -> ModifiableRootModel {
        let session = self
            .coordinator
            .open_fresh(self.owner.clone(), self.module_source());
        ModifiableRootModel::new(self.module, session)
    }

    /// Opens an editing session for an external-system import.
    ///
    /// Inside a batch the session joins the batch's diff, so every module
    /// the import touches commits (or rolls back) together and carries the
    /// batch's provenance. Without a batch this is
    /// [`modifiable_model`](Self::modifiable_model).
    ///
    /// # Errors
    ///
    /// Returns an error if the batch's diff cannot be joined.
    pub fn modifiable_model_for_external_system(
        &self,
        batch: Option<&Batch>,
    ) -> Result<ModifiableRootModel> {
        match batch {
            Some(batch) => self.modifiable_model_with(batch.shared()),
            None => Ok(self.modifiable_model()),
        }
    }

    /// Opens an editing session that writes into `diff`.
    ///
    /// # Errors
    ///
    /// Returns a session-closed error if `diff` is finished, or an
    /// inconsistent-batch error if it does not fit this module's store.
    pub fn modifiable_model_with(&self, diff: &SharedDiff) -> Result<ModifiableRootModel> {
        let session = self.coordinator.open_session(
            self.owner.clone(),
            Some(diff),
            self.module_source(),
        )?;
        Ok(ModifiableRootModel::new(self.module, session))
    }

    /// Provenance for entities this module creates on its own.
    fn module_source(&self) -> EntitySource {
        self.storage().get(self.module).map_or_else(
            || EntitySource::local(&format!("{}.iml", self.owner)),
            |e| e.source().clone(),
        )
    }
}

impl fmt::Debug for ModuleRootComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRootComponent")
            .field("module", &self.module)
            .field("owner", &self.owner)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
