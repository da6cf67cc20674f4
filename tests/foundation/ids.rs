//! Integration tests for entity ids and allocation

use std::sync::Arc;
use std::thread;

use rootstore_foundation::{EntityId, IdAllocator};

#[test]
fn id_formatting() {
    assert_eq!(format!("{}", EntityId::new(7)), "#7");
    assert_eq!(format!("{:?}", EntityId::new(7)), "EntityId(7)");
    assert!(EntityId::null().is_null());
    assert_eq!(format!("{}", EntityId::null()), "#null");
}

#[test]
fn ids_are_ordered_by_index() {
    assert!(EntityId::new(1) < EntityId::new(2));
}

#[test]
fn allocator_reserve_skips_taken_ids() {
    let ids = IdAllocator::new();
    ids.reserve(EntityId::new(10));
    assert_eq!(ids.allocate(), EntityId::new(11));
    ids.reserve(EntityId::new(3));
    assert_eq!(ids.peek(), 12);
}

#[test]
fn allocator_is_unique_across_threads() {
    let ids = Arc::new(IdAllocator::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ids = Arc::clone(&ids);
            thread::spawn(move || (0..250).map(|_| ids.allocate()).collect::<Vec<_>>())
        })
        .collect();

    let mut all: Vec<EntityId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 1000);
}
