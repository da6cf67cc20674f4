//! Two sessions editing through one shared diff, observed by a cache

use std::sync::Arc;

use rootstore_cache::{
    CacheConfig, DerivedViewCache, InvalidationHub, InvalidationSource, SnapshotSource,
};
use rootstore_foundation::{EntityId, EntityKind, EntitySource};
use rootstore_session::{MutableSessionCoordinator, OwnerId, fields};
use rootstore_storage::{Entity, EntityStore, StoreConfig};

fn names(snapshot: &rootstore_storage::Snapshot) -> Vec<String> {
    snapshot
        .of_kind(&EntityKind::Module)
        .filter_map(|e| e.str_field(fields::NAME).map(str::to_string))
        .collect()
}

fn store_with_a() -> Arc<EntityStore> {
    let a = Entity::new(EntityId::new(1), EntityKind::Module, EntitySource::local("a.iml"))
        .with_field(fields::NAME, "A");
    Arc::new(EntityStore::seeded([a], StoreConfig::default()).unwrap())
}

fn module_names(store: &Arc<EntityStore>, hub: &Arc<InvalidationHub>) -> DerivedViewCache<Vec<String>> {
    DerivedViewCache::new(
        Arc::clone(store) as Arc<dyn SnapshotSource>,
        names,
        Arc::clone(hub) as Arc<dyn InvalidationSource>,
        CacheConfig::new("module-names"),
    )
    .unwrap()
}

fn add_named(diff: &mut rootstore_storage::DiffBuilder, name: &str, source: EntitySource) {
    let id = diff.add(EntityKind::Module, source);
    diff.set_field(id, fields::NAME, name).unwrap();
}

#[test]
fn joined_sessions_commit_as_one_snapshot() {
    let store = store_with_a();
    let hub = Arc::new(InvalidationHub::new());
    let cache = module_names(&store, &hub);
    let coord = MutableSessionCoordinator::new(Arc::clone(&store));

    let s0 = store.current();
    assert_eq!(s0.version(), 0);
    assert_eq!(*cache.value(), vec!["A"]);

    // session1 owns the diff, session2 is handed it explicitly
    let session1 = coord.begin_batch(EntitySource::local("a.iml"));
    let mut writer1 = coord
        .open_session(OwnerId::new("session1"), Some(session1.shared()), EntitySource::local("b.iml"))
        .unwrap();
    let source = writer1.source().clone();
    writer1.write(|d| add_named(d, "B", source)).unwrap();

    let mut session2 = coord
        .open_session(OwnerId::new("session2"), Some(session1.shared()), EntitySource::local("c.iml"))
        .unwrap();
    let source = session2.source().clone();
    session2.write(|d| add_named(d, "C", source)).unwrap();

    // nothing is visible until the owner commits
    assert_eq!(store.version(), 0);
    assert_eq!(cache.memo_version(), Some(0));

    let s1 = session1.commit().unwrap();
    assert_eq!(s1.version(), 1);
    assert_eq!(names(&s1), vec!["A", "B", "C"]);

    // the memo still describes S0 until a read checks the version
    assert_eq!(cache.memo_version(), Some(0));
    assert_eq!(*cache.peek().unwrap(), vec!["A"]);

    cache.invalidate();
    assert_eq!(*cache.value(), vec!["A", "B", "C"]);
    assert_eq!(cache.memo_version(), Some(1));

    // S0 is untouched
    assert_eq!(names(&s0), vec!["A"]);
    assert!(!writer1.is_open());
    assert!(!session2.is_open());
}

#[test]
fn next_read_catches_up_without_invalidate() {
    let store = store_with_a();
    let hub = Arc::new(InvalidationHub::new());
    let cache = module_names(&store, &hub);
    let coord = MutableSessionCoordinator::new(Arc::clone(&store));
    let _ = cache.value();

    let batch = coord.begin_batch(EntitySource::local("a.iml"));
    let mut session = coord
        .open_session(OwnerId::new("b"), Some(batch.shared()), EntitySource::local("b.iml"))
        .unwrap();
    let source = session.source().clone();
    session.write(|d| add_named(d, "B", source)).unwrap();
    batch.commit().unwrap();

    assert_eq!(*cache.value(), vec!["A", "B"]);
}

#[test]
fn discarded_shared_diff_is_a_no_op() {
    let store = store_with_a();
    let hub = Arc::new(InvalidationHub::new());
    let cache = module_names(&store, &hub);
    let coord = MutableSessionCoordinator::new(Arc::clone(&store));
    let before = cache.value();

    let batch = coord.begin_batch(EntitySource::local("a.iml"));
    for name in ["B", "C"] {
        let mut session = coord
            .open_session(OwnerId::new(name), Some(batch.shared()), EntitySource::local("x.iml"))
            .unwrap();
        let source = session.source().clone();
        session.write(|d| add_named(d, name, source)).unwrap();
    }
    batch.discard();

    assert_eq!(store.version(), 0);
    assert!(Arc::ptr_eq(&before, &cache.value()));
}
