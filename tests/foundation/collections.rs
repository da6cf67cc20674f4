//! Integration tests for persistent collections

use rootstore_foundation::{LtMap, LtVec};

#[test]
fn map_insert_leaves_original_untouched() {
    let base: LtMap<u32, &str> = LtMap::new().insert(1, "a");
    let next = base.insert(2, "b");
    assert_eq!(base.len(), 1);
    assert_eq!(next.len(), 2);
    assert_eq!(next.get(&2), Some(&"b"));
}

#[test]
fn map_remove_leaves_original_untouched() {
    let base: LtMap<u32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
    let next = base.remove(&1);
    assert!(base.contains_key(&1));
    assert!(!next.contains_key(&1));
}

#[test]
fn map_iterates_in_key_order() {
    let map: LtMap<u32, ()> = [(3, ()), (1, ()), (2, ())].into_iter().collect();
    let keys: Vec<_> = map.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3]);
}

#[test]
fn map_clone_shares_structure() {
    let map: LtMap<u32, u32> = (0..100).map(|i| (i, i)).collect();
    let copy = map.clone();
    assert!(map.ptr_eq(&copy));
    assert_eq!(map, copy);
}

#[test]
fn vec_push_back_is_persistent() {
    let empty: LtVec<i32> = LtVec::new();
    let one = empty.push_back(1);
    assert!(empty.is_empty());
    assert_eq!(one.get(0), Some(&1));
}
