//! Scoped, deterministic release of resources.
//!
//! A [`Disposer`] is a scope that owns [`Disposable`] children. Disposing the
//! scope (or dropping it) disposes every child exactly once, most recently
//! registered first. Scopes nest: a `Disposer` is itself `Disposable`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rootstore_foundation::{Error, Result};

/// A resource with an explicit release step.
///
/// `dispose` must be idempotent.
pub trait Disposable: Send + Sync {
    /// Releases the resource.
    fn dispose(&self);
}

/// A scope that disposes its children when it ends.
pub struct Disposer {
    name: String,
    children: Mutex<Vec<Arc<dyn Disposable>>>,
    disposed: AtomicBool,
}

impl Disposer {
    /// Creates an empty, live scope.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the scope's label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ties `child` to this scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope is already disposed. The child is
    /// disposed immediately in that case.
    pub fn register(&self, child: Arc<dyn Disposable>) -> Result<()> {
        let mut children = self.children.lock();
        if self.is_disposed() {
            drop(children);
            child.dispose();
            return Err(Error::disposed(format!("disposer {}", self.name)));
        }
        children.push(child);
        Ok(())
    }

    /// Returns the number of live children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.lock().len()
    }

    /// Returns true if no children are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.lock().is_empty()
    }

    /// Returns true once the scope has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Disposable for Disposer {
    fn dispose(&self) {
        let children = {
            let mut children = self.children.lock();
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *children)
        };

        tracing::trace!(
            event = "dispose",
            scope = %self.name,
            children = children.len(),
            "disposing scope"
        );
        for child in children.iter().rev() {
            child.dispose();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        Disposable::dispose(self);
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("name", &self.name)
            .field("children", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
