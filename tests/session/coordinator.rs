//! Integration tests for the session coordinator

use std::sync::Arc;

use rootstore_foundation::{EntityKind, EntitySource, ErrorKind};
use rootstore_session::{MutableSessionCoordinator, OwnerId, SessionKind};
use rootstore_storage::EntityStore;

fn coordinator() -> MutableSessionCoordinator {
    MutableSessionCoordinator::new(Arc::new(EntityStore::new()))
}

fn local() -> EntitySource {
    EntitySource::local("app.iml")
}

// =============================================================================
// Fresh Sessions
// =============================================================================

#[test]
fn fresh_session_owns_its_commit() {
    let coord = coordinator();
    let mut session = coord
        .open_session(OwnerId::new("app"), None, local())
        .unwrap();
    assert_eq!(session.kind(), SessionKind::Exclusive);

    let source = session.source().clone();
    let id = session.write(|d| d.add(EntityKind::Module, source)).unwrap();
    assert!(session.is_changed());
    let snap = session.commit().unwrap();
    assert!(snap.contains(id));
    assert!(!session.is_open());
    assert!(matches!(session.commit().unwrap_err().kind, ErrorKind::SessionClosed));
}

#[test]
fn fresh_sessions_are_isolated() {
    let coord = coordinator();
    let mut a = coord.open_fresh(OwnerId::new("a"), local());
    let b = coord.open_fresh(OwnerId::new("b"), local());
    a.write(|d| d.add(EntityKind::Module, EntitySource::local("a.iml")))
        .unwrap();
    assert_eq!(b.read(|d| d.len()).unwrap(), 0);
}

#[test]
fn second_fresh_commit_is_stale() {
    let coord = coordinator();
    let mut a = coord.open_fresh(OwnerId::new("a"), local());
    let mut b = coord.open_fresh(OwnerId::new("b"), local());
    a.commit().unwrap();
    assert!(b.commit().unwrap_err().is_stale_base());
    assert_eq!(coord.store().version(), 1);
}

#[test]
fn discarded_session_is_closed() {
    let coord = coordinator();
    let mut session = coord.open_fresh(OwnerId::new("app"), local());
    session.discard();
    assert!(!session.is_open());
    assert!(session.read(|_| ()).is_err());
    assert_eq!(coord.store().version(), 0);
}

// =============================================================================
// Joined Sessions
// =============================================================================

#[test]
fn joined_session_writes_into_shared_diff() {
    let coord = coordinator();
    let batch = coord.begin_batch(EntitySource::external("gradle", "build.gradle"));
    let mut a = coord
        .open_session(OwnerId::new("a"), Some(batch.shared()), local())
        .unwrap();
    let b = coord
        .open_session(OwnerId::new("b"), Some(batch.shared()), local())
        .unwrap();

    assert_eq!(a.kind(), SessionKind::Joined(batch.id()));
    assert_eq!(a.source(), batch.source());

    let source = a.source().clone();
    let id = a.write(|d| d.add(EntityKind::Module, source)).unwrap();
    assert!(b.read(|d| d.contains(id)).unwrap());
    assert!(b.is_changed());
}

#[test]
fn nested_access_to_same_batch_errors() {
    let coord = coordinator();
    let batch = coord.begin_batch(local());
    let mut a = coord
        .open_session(OwnerId::new("a"), Some(batch.shared()), local())
        .unwrap();
    let b = coord
        .open_session(OwnerId::new("b"), Some(batch.shared()), local())
        .unwrap();
    let fresh = coord.open_fresh(OwnerId::new("c"), local());

    let source = a.source().clone();
    let (id, seen_by_b, seen_by_fresh) = a
        .write(|d| {
            let id = d.add(EntityKind::Module, source);
            (id, b.read(|d| d.contains(id)), fresh.read(|d| d.contains(id)))
        })
        .unwrap();
    assert!(matches!(
        seen_by_b.unwrap_err().kind,
        ErrorKind::ReentrantAccess(_)
    ));
    assert!(!seen_by_fresh.unwrap());

    // Sequential access keeps working
    assert!(b.read(|d| d.contains(id)).unwrap());
    let snap = batch.commit().unwrap();
    assert!(snap.contains(id));
}

#[test]
fn joined_session_cannot_commit() {
    let coord = coordinator();
    let batch = coord.begin_batch(local());
    let mut session = coord
        .open_session(OwnerId::new("app"), Some(batch.shared()), local())
        .unwrap();
    let err = session.commit().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CommitAuthority { .. }));
    assert!(session.is_open());
}

#[test]
fn joining_closed_batch_fails() {
    let coord = coordinator();
    let batch = coord.begin_batch(local());
    let shared = batch.shared().clone();
    batch.discard();
    let err = coord
        .open_session(OwnerId::new("late"), Some(&shared), local())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SessionClosed));
}

#[test]
fn joining_stale_batch_fails() {
    let coord = coordinator();
    let batch = coord.begin_batch(local());
    coord.open_fresh(OwnerId::new("other"), local()).commit().unwrap();

    let err = coord
        .open_session(OwnerId::new("late"), Some(batch.shared()), local())
        .unwrap_err();
    assert!(err.is_inconsistent_batch());
}

#[test]
fn joining_foreign_batch_fails() {
    let home = coordinator();
    let away = coordinator();
    let batch = away.begin_batch(local());
    let err = home
        .open_session(OwnerId::new("app"), Some(batch.shared()), local())
        .unwrap_err();
    assert!(err.is_inconsistent_batch());
}
