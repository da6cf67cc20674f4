//! Integration tests for derived-view caches

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rootstore_cache::{
    CacheConfig, DerivedViewCache, InvalidationEvent, InvalidationHub, InvalidationSource,
    SnapshotSource,
};
use rootstore_foundation::{EntityKind, EntitySource};
use rootstore_storage::EntityStore;

fn module_count(store: &Arc<EntityStore>, hub: &Arc<InvalidationHub>) -> DerivedViewCache<usize> {
    DerivedViewCache::new(
        Arc::clone(store) as Arc<dyn SnapshotSource>,
        |snap| snap.of_kind(&EntityKind::Module).count(),
        Arc::clone(hub) as Arc<dyn InvalidationSource>,
        CacheConfig::new("module-count"),
    )
    .unwrap()
}

fn add_module(store: &EntityStore) {
    let mut diff = store.begin();
    diff.add(EntityKind::Module, EntitySource::local("app.iml"));
    diff.commit(store).unwrap();
}

// =============================================================================
// Coherence
// =============================================================================

#[test]
fn value_tracks_commits_without_events() {
    let store = Arc::new(EntityStore::new());
    let hub = Arc::new(InvalidationHub::new());
    let cache = module_count(&store, &hub);

    assert_eq!(*cache.value(), 0);
    add_module(&store);
    assert_eq!(cache.memo_version(), Some(0));
    assert_eq!(*cache.value(), 1);
    assert_eq!(cache.memo_version(), Some(1));
}

#[test]
fn repeated_reads_hit_memo() {
    let store = Arc::new(EntityStore::new());
    let hub = Arc::new(InvalidationHub::new());
    let cache = module_count(&store, &hub);

    let first = cache.value();
    let second = cache.value();
    assert!(Arc::ptr_eq(&first, &second));
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn event_forces_recompute_at_same_version() {
    let store = Arc::new(EntityStore::new());
    let hub = Arc::new(InvalidationHub::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let cache = DerivedViewCache::new(
        Arc::clone(&store) as Arc<dyn SnapshotSource>,
        move |snap| {
            counted.fetch_add(1, Ordering::SeqCst);
            snap.len()
        },
        Arc::clone(&hub) as Arc<dyn InvalidationSource>,
        CacheConfig::default(),
    )
    .unwrap();

    let _ = cache.value();
    hub.fire(&InvalidationEvent::ExtensionAdded("kotlin".into()));
    assert!(cache.peek().is_none());
    let _ = cache.value();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.stats().invalidations, 1);
}

#[test]
fn disabled_stats_stay_zero() {
    let store = Arc::new(EntityStore::new());
    let hub = Arc::new(InvalidationHub::new());
    let cache = DerivedViewCache::new(
        Arc::clone(&store) as Arc<dyn SnapshotSource>,
        |snap| snap.version(),
        Arc::clone(&hub) as Arc<dyn InvalidationSource>,
        CacheConfig::new("quiet").with_stats(false),
    )
    .unwrap();
    let _ = cache.value();
    let _ = cache.value();
    assert_eq!(cache.stats(), Default::default());
    assert_eq!(cache.name(), "quiet");
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn dispose_unsubscribes_and_stops_memoizing() {
    let store = Arc::new(EntityStore::new());
    let hub = Arc::new(InvalidationHub::new());
    let cache = module_count(&store, &hub);
    assert_eq!(hub.listener_count(), 1);

    let _ = cache.value();
    cache.dispose();
    cache.dispose();
    assert!(cache.is_disposed());
    assert_eq!(hub.listener_count(), 0);

    add_module(&store);
    assert_eq!(*cache.value(), 1);
    assert!(cache.peek().is_none());
}

#[test]
fn drop_unsubscribes() {
    let store = Arc::new(EntityStore::new());
    let hub = Arc::new(InvalidationHub::new());
    {
        let _cache = module_count(&store, &hub);
        assert_eq!(hub.listener_count(), 1);
    }
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn closed_source_refuses_new_caches() {
    let store = Arc::new(EntityStore::new());
    let hub = Arc::new(InvalidationHub::new());
    hub.close();
    let result = DerivedViewCache::new(
        Arc::clone(&store) as Arc<dyn SnapshotSource>,
        |snap| snap.len(),
        Arc::clone(&hub) as Arc<dyn InvalidationSource>,
        CacheConfig::default(),
    );
    assert!(result.is_err());
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_readers_never_see_older_view_than_they_started_with() {
    let store = Arc::new(EntityStore::new());
    let hub = Arc::new(InvalidationHub::new());
    let cache = Arc::new(module_count(&store, &hub));

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..50 {
                add_module(&store);
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..200 {
                    let floor = store.version();
                    let seen = *cache.value() as u64;
                    assert!(seen >= floor);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(*cache.value(), 50);
}
