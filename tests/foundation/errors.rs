//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use rootstore_foundation::{BatchInconsistency, EntityId, Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_stale_base() {
    let err = Error::stale_base(3, 5);
    assert!(err.is_stale_base());
    let msg = format!("{err}");
    assert!(msg.contains("version 3"));
    assert!(msg.contains("version 5"));
}

#[test]
fn error_inconsistent_batch_stale() {
    let err = Error::inconsistent_batch(
        "app",
        BatchInconsistency::StaleBase {
            batch_base: 1,
            current: 2,
        },
    );
    assert!(err.is_inconsistent_batch());
    let msg = format!("{err}");
    assert!(msg.contains("app"));
    assert!(msg.contains("built on version 1"));
}

#[test]
fn error_inconsistent_batch_foreign() {
    let err = Error::inconsistent_batch(
        "core",
        BatchInconsistency::ForeignStore {
            expected: 1,
            actual: 9,
        },
    );
    assert_eq!(
        err.to_string(),
        "inconsistent batch for core: shared diff belongs to store 9, expected store 1"
    );
}

#[test]
fn error_entity_not_found() {
    let err = Error::entity_not_found(EntityId::new(42));
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
    assert!(format!("{err}").contains("42"));
}

#[test]
fn error_dangling_parent() {
    let err = Error::dangling_parent(EntityId::new(2), EntityId::new(1));
    assert!(matches!(err.kind, ErrorKind::DanglingParent { .. }));
}

#[test]
fn error_session_and_authority() {
    assert!(matches!(Error::session_closed().kind, ErrorKind::SessionClosed));
    let err = Error::commit_authority("app");
    assert!(format!("{err}").contains("app"));
    assert!(!err.is_stale_base());
}

#[test]
fn error_subscription_and_disposed() {
    assert!(format!("{}", Error::subscription_failed("hub closed")).contains("hub closed"));
    assert!(format!("{}", Error::disposed("cache")).contains("cache has been disposed"));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_with_context() {
    let err = Error::stale_base(0, 1).with_context(
        ErrorContext::new()
            .with_operation("commit")
            .with_owner("app")
            .with_frame("batch import"),
    );
    let context = err.context.as_ref().unwrap();
    assert_eq!(context.operation.as_deref(), Some("commit"));
    assert_eq!(context.stack, vec!["batch import".to_string()]);
    assert!(context.to_string().starts_with("during commit for app"));
}
