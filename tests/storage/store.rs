//! Integration tests for the entity store's commit protocol

use std::sync::Arc;
use std::thread;

use rootstore_foundation::{EntityKind, EntitySource, ErrorKind};
use rootstore_storage::{CommitPolicy, EntityStore, StoreConfig};

fn src() -> EntitySource {
    EntitySource::local("app.iml")
}

// =============================================================================
// Versioning
// =============================================================================

#[test]
fn every_commit_bumps_version() {
    let store = EntityStore::new();
    assert_eq!(store.version(), 0);

    let mut diff = store.begin();
    diff.add(EntityKind::Module, src());
    assert_eq!(diff.commit(&store).unwrap().version(), 1);

    store.begin().commit(&store).unwrap();
    assert_eq!(store.version(), 2);
    assert_eq!(store.modification_count(), 2);
}

#[test]
fn discard_leaves_store_untouched() {
    let store = EntityStore::new();
    let before = store.current();
    let mut diff = store.begin();
    diff.add(EntityKind::Module, src());
    diff.discard();
    assert!(Arc::ptr_eq(&before, &store.current()));
}

// =============================================================================
// Stale Bases
// =============================================================================

#[test]
fn stale_commit_is_rejected_by_default() {
    let store = EntityStore::new();
    let first = store.begin();
    let mut second = store.begin();
    second.add(EntityKind::Module, src());
    second.commit(&store).unwrap();

    let err = first.commit(&store).unwrap_err();
    assert!(err.is_stale_base());
    assert_eq!(store.version(), 1);
}

#[test]
fn last_writer_wins_applies_stale_diff() {
    let store = EntityStore::with_config(
        StoreConfig::new().with_commit_policy(CommitPolicy::LastWriterWins),
    );
    let mut setup = store.begin();
    let module = setup.add(EntityKind::Module, src());
    setup.commit(&store).unwrap();

    let mut first = store.begin();
    first.set_field(module, "name", "first").unwrap();
    let mut second = store.begin();
    second.set_field(module, "name", "second").unwrap();

    second.commit(&store).unwrap();
    let snap = first.commit(&store).unwrap();
    assert_eq!(snap.version(), 3);
    assert_eq!(snap.get(module).unwrap().str_field("name"), Some("first"));
}

#[test]
fn forced_commit_ignores_policy() {
    let store = EntityStore::with_config(StoreConfig::strict());
    let stale = store.begin();
    store.begin().commit(&store).unwrap();
    assert!(stale.commit_forced(&store).is_ok());
}

#[test]
fn stale_diff_cannot_orphan_entities() {
    let store = EntityStore::with_config(StoreConfig::permissive());
    let mut setup = store.begin();
    let module = setup.add(EntityKind::Module, src());
    setup.commit(&store).unwrap();

    let mut stale = store.begin();
    stale
        .add_child(module, EntityKind::ContentRoot, src())
        .unwrap();
    let mut removal = store.begin();
    removal.remove(module).unwrap();
    removal.commit(&store).unwrap();
    let before = store.current();

    let err = stale.commit(&store).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DanglingParent { .. }));
    assert!(Arc::ptr_eq(&before, &store.current()));
    assert!(store.current().is_empty());
}

#[test]
fn foreign_diff_cannot_commit() {
    let a = EntityStore::new();
    let b = EntityStore::new();
    assert!(a.begin().commit(&b).is_err());
    assert_eq!(b.version(), 0);
}

// =============================================================================
// History
// =============================================================================

#[test]
fn history_is_bounded_and_newest_first() {
    let store = EntityStore::with_config(StoreConfig::new().with_history_size(2));
    for _ in 0..4 {
        store.begin().commit(&store).unwrap();
    }
    let versions: Vec<_> = store.history().iter().map(|s| s.version()).collect();
    assert_eq!(versions, vec![3, 2]);
    assert!(store.snapshot_at(1).is_none());
    assert_eq!(store.snapshot_at(4).unwrap().version(), 4);
}

#[test]
fn changes_since_describes_commits() {
    let store = EntityStore::new();
    let mut diff = store.begin();
    let module = diff.add(EntityKind::Module, src());
    diff.commit(&store).unwrap();

    let changes = store.changes_since(0).unwrap();
    assert_eq!(changes.added, vec![module]);
    assert!(store.changes_since(1).unwrap().is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_writers_serialize() {
    let store = Arc::new(EntityStore::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut committed = 0;
                while committed < 10 {
                    let mut diff = store.begin();
                    diff.add(EntityKind::Module, src());
                    if diff.commit(&store).is_ok() {
                        committed += 1;
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snap = store.current();
    assert_eq!(snap.version(), 80);
    assert_eq!(snap.len(), 80);
}

#[test]
fn readers_see_whole_snapshots() {
    let store = Arc::new(EntityStore::new());
    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..50 {
                let mut diff = store.begin();
                diff.add(EntityKind::Module, src());
                diff.add(EntityKind::Module, src());
                diff.commit(&store).unwrap();
            }
        })
    };
    for _ in 0..200 {
        let snap = store.current();
        assert_eq!(snap.len() as u64, snap.version() * 2);
    }
    writer.join().unwrap();
}
