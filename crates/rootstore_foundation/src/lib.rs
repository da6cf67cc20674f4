//! Core identifiers, values, provenance tags, and persistent collections for rootstore.
//!
//! This crate provides:
//! - [`EntityId`] - Stable entity identifiers allocated per store
//! - [`EntityKind`] - What a configuration entity describes
//! - [`EntitySource`] - Provenance tag deciding where an entity is persisted
//! - [`Value`] - Field values stored on entities
//! - [`Error`] - Rich error types with context
//! - Persistent collections ([`LtVec`], [`LtMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod entity;
pub mod error;
pub mod source;
pub mod value;

pub use collections::{LtMap, LtVec};
pub use entity::{EntityId, IdAllocator};
pub use error::{BatchInconsistency, Error, ErrorContext, ErrorKind, Result};
pub use source::{EntityKind, EntitySource, StorageLocation};
pub use value::Value;
