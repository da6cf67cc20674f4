//! Rootstore - Versioned configuration store with copy-on-write diffs
//!
//! This crate re-exports all layers of the rootstore system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: rootstore_session    - Sessions, shared batch diffs, module root façade
//! Layer 2: rootstore_cache      - Derived-view caches, invalidation, disposal scopes
//! Layer 1: rootstore_storage    - Snapshots, entity store, diff builders
//! Layer 0: rootstore_foundation - Core types (EntityId, EntitySource, Value, Error)
//! ```

pub use rootstore_cache as cache;
pub use rootstore_foundation as foundation;
pub use rootstore_session as session;
pub use rootstore_storage as storage;
