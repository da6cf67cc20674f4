//! Editing one module's roots through a mutation session.

use std::fmt;
use std::sync::Arc;

use rootstore_foundation::{EntityId, EntityKind, Error, LtVec, Result, Value};
use rootstore_storage::{DiffBuilder, Entity, Snapshot};

use crate::fields;
use crate::root_model::{DependencyScope, RootModel};
use crate::session::Session;

/// Mutable view of one module over a [`Session`].
///
/// Every entity it creates carries the session's provenance, so a model
/// opened inside a batch writes with the batch's source.
pub struct ModifiableRootModel {
    module: EntityId,
    session: Session,
}

impl ModifiableRootModel {
    pub(crate) fn new(module: EntityId, session: Session) -> Self {
        Self { module, session }
    }

    /// Returns the module being edited.
    #[must_use]
    pub fn module_id(&self) -> EntityId {
        self.module
    }

    /// Returns the underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns true if the session writes into a batch's diff.
    #[must_use]
    pub fn is_joined(&self) -> bool {
        self.session.is_joined()
    }

    /// Computes the module's view including uncommitted edits.
    ///
    /// # Errors
    ///
    /// Returns a session-closed error after commit or dispose.
    pub fn root_model(&self) -> Result<RootModel> {
        let module = self.module;
        self.session.read(|diff| RootModel::compute(diff, module))
    }

    /// Returns the content root URLs including uncommitted edits.
    ///
    /// # Errors
    ///
    /// Returns a session-closed error after commit or dispose.
    pub fn content_root_urls(&self) -> Result<Vec<Arc<str>>> {
        Ok(self.root_model()?.content_root_urls())
    }

    /// Adds a content root.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or the module is gone.
    pub fn add_content_root(&mut self, url: &str) -> Result<EntityId> {
        let module = self.module;
        self.create(module, EntityKind::ContentRoot, |diff, id| {
            diff.set_field(id, fields::URL, Value::url(url))
        })
    }

    /// Adds a source folder under a content root.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or `content_root` is missing.
    pub fn add_source_root(
        &mut self,
        content_root: EntityId,
        url: &str,
        root_type: &str,
        is_test: bool,
    ) -> Result<EntityId> {
        self.create(content_root, EntityKind::SourceRoot, |diff, id| {
            diff.set_field(id, fields::URL, Value::url(url))?;
            diff.set_field(id, fields::ROOT_TYPE, root_type)?;
            diff.set_field(id, fields::IS_TEST, is_test)
        })
    }

    /// Excludes a folder under a content root.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or `content_root` is missing.
    pub fn add_exclude_root(&mut self, content_root: EntityId, url: &str) -> Result<EntityId> {
        self.create(content_root, EntityKind::ExcludeRoot, |diff, id| {
            diff.set_field(id, fields::URL, Value::url(url))
        })
    }

    /// Excludes files matching `pattern` under a content root.
    ///
    /// Adding a pattern that is already present does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or `content_root` is missing.
    pub fn add_exclude_pattern(&mut self, content_root: EntityId, pattern: &str) -> Result<()> {
        self.edit_exclude_patterns(content_root, |patterns| {
            if patterns.iter().any(|p| p.as_str() == Some(pattern)) {
                patterns.clone()
            } else {
                patterns.push_back(Value::string(pattern))
            }
        })
    }

    /// Stops excluding `pattern` under a content root.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or `content_root` is missing.
    pub fn remove_exclude_pattern(&mut self, content_root: EntityId, pattern: &str) -> Result<()> {
        self.edit_exclude_patterns(content_root, |patterns| {
            patterns
                .iter()
                .filter(|p| p.as_str() != Some(pattern))
                .cloned()
                .collect()
        })
    }

    /// Adds a dependency on the module called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or the module is gone.
    pub fn add_module_dependency(&mut self, name: &str, scope: DependencyScope) -> Result<EntityId> {
        let module = self.module;
        self.create(module, EntityKind::OrderEntry, |diff, id| {
            diff.set_field(id, fields::ENTRY, "module")?;
            diff.set_field(id, fields::TARGET, name)?;
            diff.set_field(id, fields::SCOPE, scope.as_str())
        })
    }

    /// Adds a named extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or the module is gone.
    pub fn add_extension(&mut self, name: &str) -> Result<EntityId> {
        let module = self.module;
        self.create(module, EntityKind::facet(name), |_, _| Ok(()))
    }

    /// Gives the module its own sdk.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or the module is gone.
    pub fn set_sdk(&mut self, name: &str) -> Result<()> {
        let module = self.module;
        self.session.write(|diff| {
            diff.update(module, |entity| {
                entity.set_field(fields::SDK, name);
                entity.set_field(fields::INHERIT_SDK, false);
            })
        })?
    }

    /// Switches the module to the project sdk.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or the module is gone.
    pub fn inherit_sdk(&mut self) -> Result<()> {
        let module = self.module;
        self.session.write(|diff| {
            diff.update(module, |entity| {
                entity.remove_field(fields::SDK);
                entity.set_field(fields::INHERIT_SDK, true);
            })
        })?
    }

    /// Removes the content root with `url` and everything beneath it.
    ///
    /// Returns false if there is no such root.
    ///
    /// # Errors
    ///
    /// Returns a session-closed error after commit or dispose.
    pub fn remove_content_root(&mut self, url: &str) -> Result<bool> {
        let module = self.module;
        self.session.write(|diff| {
            let found = diff
                .children_of(module)
                .find(|e| {
                    *e.kind() == EntityKind::ContentRoot && e.str_field(fields::URL) == Some(url)
                })
                .map(Entity::id);
            match found {
                Some(id) => diff.remove(id).map(|_| true),
                None => Ok(false),
            }
        })?
    }

    /// Returns true if the diff holds pending changes.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.session.is_changed()
    }

    /// Returns true until the model is committed or disposed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Commits the edits.
    ///
    /// # Errors
    ///
    /// Returns a commit-authority error if the model was opened inside a
    /// batch; the batch commits instead.
    pub fn commit(&mut self) -> Result<Arc<Snapshot>> {
        self.session.commit()
    }

    /// Abandons the edits. Inside a batch this only detaches the model.
    pub fn dispose(&mut self) {
        self.session.discard();
    }

    /// Rewrites a content root's exclude pattern list with `f`.
    fn edit_exclude_patterns(
        &mut self,
        content_root: EntityId,
        f: impl FnOnce(&LtVec<Value>) -> LtVec<Value>,
    ) -> Result<()> {
        self.session.write(|diff| {
            let root = diff
                .get(content_root)
                .filter(|e| e.kind() == &EntityKind::ContentRoot)
                .ok_or_else(|| Error::entity_not_found(content_root))?;
            let current = root
                .field(fields::EXCLUDE_PATTERNS)
                .and_then(Value::as_list)
                .cloned()
                .unwrap_or_default();
            diff.set_field(content_root, fields::EXCLUDE_PATTERNS, f(&current))
        })?
    }

    /// Adds a child of `parent` with the session's source and lets `init`
    /// fill it in.
    fn create(
        &mut self,
        parent: EntityId,
        kind: EntityKind,
        init: impl FnOnce(&mut DiffBuilder, EntityId) -> Result<()>,
    ) -> Result<EntityId> {
        let source = self.session.source().clone();
        self.session.write(|diff| {
            let id = diff.add_child(parent, kind, source)?;
            init(diff, id)?;
            Ok(id)
        })?
    }
}

impl fmt::Debug for ModifiableRootModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifiableRootModel")
            .field("module", &self.module)
            .field("session", &self.session)
            .finish()
    }
}
