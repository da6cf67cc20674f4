//! Integration tests for batches

use std::sync::Arc;

use rootstore_foundation::{EntityKind, EntitySource};
use rootstore_session::{MutableSessionCoordinator, OwnerId};
use rootstore_storage::EntityStore;

fn local() -> EntitySource {
    EntitySource::local("app.iml")
}

#[test]
fn batch_commit_publishes_all_participants_at_once() {
    let coord = MutableSessionCoordinator::new(Arc::new(EntityStore::new()));
    let batch = coord.begin_batch(EntitySource::external("maven", "pom.xml"));

    let mut ids = Vec::new();
    for name in ["a", "b", "c"] {
        let mut session = coord
            .open_session(OwnerId::new(name), Some(batch.shared()), local())
            .unwrap();
        let source = session.source().clone();
        ids.push(session.write(|d| d.add(EntityKind::Module, source)).unwrap());
        assert_eq!(coord.store().version(), 0);
    }

    let participants: Vec<_> = batch.participants().iter().map(|o| o.to_string()).collect();
    assert_eq!(participants, vec!["a", "b", "c"]);

    let snap = batch.commit().unwrap();
    assert_eq!(snap.version(), 1);
    for id in ids {
        assert!(snap.get(id).unwrap().source().is_external());
    }
}

#[test]
fn rejoining_records_owner_once() {
    let coord = MutableSessionCoordinator::new(Arc::new(EntityStore::new()));
    let batch = coord.begin_batch(local());
    for _ in 0..2 {
        coord
            .open_session(OwnerId::new("app"), Some(batch.shared()), local())
            .unwrap();
    }
    assert_eq!(batch.participants().len(), 1);
}

#[test]
fn discarded_batch_leaves_store_untouched() {
    let store = Arc::new(EntityStore::new());
    let coord = MutableSessionCoordinator::new(Arc::clone(&store));
    let before = store.current();

    let batch = coord.begin_batch(local());
    let mut session = coord
        .open_session(OwnerId::new("app"), Some(batch.shared()), local())
        .unwrap();
    session
        .write(|d| d.add(EntityKind::Module, EntitySource::local("app.iml")))
        .unwrap();
    assert!(batch.is_changed());
    batch.discard();

    assert!(Arc::ptr_eq(&before, &store.current()));
    assert!(!session.is_open());
}

#[test]
fn dropped_batch_discards() {
    let store = Arc::new(EntityStore::new());
    let coord = MutableSessionCoordinator::new(Arc::clone(&store));
    let shared = {
        let batch = coord.begin_batch(local());
        batch.shared().clone()
    };
    assert!(!shared.is_open());
    assert_eq!(store.version(), 0);
}

#[test]
fn detached_session_keeps_its_writes_in_batch() {
    let coord = MutableSessionCoordinator::new(Arc::new(EntityStore::new()));
    let batch = coord.begin_batch(local());
    let mut session = coord
        .open_session(OwnerId::new("app"), Some(batch.shared()), local())
        .unwrap();
    let id = session
        .write(|d| d.add(EntityKind::Module, EntitySource::local("app.iml")))
        .unwrap();
    session.discard();
    assert!(!session.is_open());

    let snap = batch.commit().unwrap();
    assert!(snap.contains(id));
}

#[test]
fn stale_batch_commit_fails_and_closes() {
    let store = Arc::new(EntityStore::new());
    let coord = MutableSessionCoordinator::new(Arc::clone(&store));
    let batch = coord.begin_batch(local());
    let shared = batch.shared().clone();
    coord.open_fresh(OwnerId::new("other"), local()).commit().unwrap();

    assert!(batch.commit().unwrap_err().is_stale_base());
    assert!(!shared.is_open());
    assert_eq!(store.version(), 1);
}
