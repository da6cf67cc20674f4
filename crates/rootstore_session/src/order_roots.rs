//! Source roots reachable through a module's classpath order.

use std::collections::HashSet;
use std::sync::Arc;

use rootstore_foundation::EntityId;
use rootstore_storage::Snapshot;

use crate::root_model::{OrderEntry, RootModel};

/// Ordered source roots of a module and the modules it depends on.
///
/// Direct dependencies are always followed; further dependencies only
/// through exported entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRoots {
    version: u64,
    production: Walk,
    all: Walk,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Walk {
    modules: Vec<EntityId>,
    urls: Vec<Arc<str>>,
}

impl OrderRoots {
    /// Computes the order roots of `module`.
    #[must_use]
    pub fn of(snapshot: &Snapshot, module: EntityId) -> Self {
        Self {
            version: snapshot.version(),
            production: walk(snapshot, module, false),
            all: walk(snapshot, module, true),
        }
    }

    /// Returns the snapshot version the roots were computed from.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the visited modules, the starting module first.
    #[must_use]
    pub fn modules(&self, include_tests: bool) -> &[EntityId] {
        if include_tests {
            &self.all.modules
        } else {
            &self.production.modules
        }
    }

    /// Returns the source root URLs in classpath order.
    #[must_use]
    pub fn source_root_urls(&self, include_tests: bool) -> &[Arc<str>] {
        if include_tests {
            &self.all.urls
        } else {
            &self.production.urls
        }
    }
}

fn walk(snapshot: &Snapshot, start: EntityId, include_tests: bool) -> Walk {
    let mut result = Walk::default();
    let mut visited = HashSet::new();
    let mut stack = vec![(start, true)];

    while let Some((module, direct)) = stack.pop() {
        if !visited.insert(module) {
            continue;
        }
        let model = RootModel::of(snapshot, module);
        if !model.exists() {
            continue;
        }
        result.modules.push(module);
        result.urls.extend(model.source_root_urls(include_tests));

        let next: Vec<EntityId> = model
            .order_entries()
            .iter()
            .filter_map(|entry| match entry {
                OrderEntry::Module {
                    resolved: Some(id),
                    scope,
                    exported,
                    ..
                } if (include_tests || scope.is_production()) && (direct || *exported) => {
                    Some(*id)
                }
                _ => None,
            })
            .collect();
        stack.extend(next.into_iter().rev().map(|id| (id, false)));
    }
    result
}
