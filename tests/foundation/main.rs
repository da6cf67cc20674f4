//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: EntityId, EntitySource, Value, Error, and persistent collections.

mod collections;
mod errors;
mod ids;
mod sources;
mod values;
