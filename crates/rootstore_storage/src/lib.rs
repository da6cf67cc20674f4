//! Versioned snapshots, entity store, and copy-on-write diffs for rootstore.
//!
//! This crate provides:
//! - [`Snapshot`] - Immutable, versioned view of every entity in a store
//! - [`EntityStore`] - Owner of the current snapshot with atomic publication
//! - [`DiffBuilder`] - Copy-on-write overlay of pending changes
//! - [`diff_snapshots`] - Structural comparison of two snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod config;
pub mod diff;
pub mod entity;
pub mod snapshot;
pub mod store;

pub use builder::{Change, ChangeKind, DiffBuilder};
pub use config::{CommitPolicy, StoreConfig};
pub use diff::{EntityChange, SnapshotDiff, diff_snapshots};
pub use entity::Entity;
pub use snapshot::{Snapshot, StoreId};
pub use store::EntityStore;
