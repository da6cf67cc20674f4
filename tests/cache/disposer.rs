//! Integration tests for disposal scopes

use std::sync::Arc;

use parking_lot::Mutex;
use rootstore_cache::{Disposable, Disposer};

struct Probe {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Disposable for Probe {
    fn dispose(&self) {
        self.log.lock().push(self.name);
    }
}

fn probe(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<dyn Disposable> {
    Arc::new(Probe {
        name,
        log: Arc::clone(log),
    })
}

#[test]
fn children_are_released_in_reverse_order_once() {
    let log = Arc::default();
    let scope = Disposer::new("module app");
    scope.register(probe("model", &log)).unwrap();
    scope.register(probe("roots", &log)).unwrap();
    assert_eq!(scope.len(), 2);

    scope.dispose();
    scope.dispose();
    assert_eq!(*log.lock(), vec!["roots", "model"]);
    assert!(scope.is_empty());
}

#[test]
fn register_after_dispose_releases_child() {
    let log = Arc::default();
    let scope = Disposer::new("late");
    scope.dispose();
    assert!(scope.register(probe("straggler", &log)).is_err());
    assert_eq!(*log.lock(), vec!["straggler"]);
}

#[test]
fn dropping_scope_disposes_children() {
    let log = Arc::default();
    {
        let scope = Disposer::new("dropped");
        scope.register(probe("child", &log)).unwrap();
    }
    assert_eq!(*log.lock(), vec!["child"]);
}
