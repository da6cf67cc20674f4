//! Integration tests for entity kinds and provenance

use rootstore_foundation::{EntityKind, EntitySource, StorageLocation};

#[test]
fn local_sources_live_in_the_project() {
    let source = EntitySource::local("app.iml");
    assert!(!source.is_external());
    assert_eq!(source.file(), "app.iml");
    assert_eq!(
        source.storage_location(),
        StorageLocation::Project("app.iml".into())
    );
}

#[test]
fn external_sources_live_in_the_system_cache() {
    let source = EntitySource::external("gradle", "app.iml");
    assert!(source.is_external());
    assert_eq!(source.to_string(), "external(gradle):app.iml");
    assert!(matches!(
        source.storage_location(),
        StorageLocation::ExternalCache { ref system_id, .. } if &**system_id == "gradle"
    ));
}

#[test]
fn same_file_different_system_is_a_different_source() {
    assert_ne!(
        EntitySource::local("app.iml"),
        EntitySource::external("maven", "app.iml")
    );
}

#[test]
fn kind_names() {
    assert_eq!(EntityKind::ContentRoot.name(), "content-root");
    assert_eq!(EntityKind::facet("kotlin").to_string(), "facet:kotlin");
    assert_eq!(EntityKind::custom("artifact").name(), "artifact");
}
