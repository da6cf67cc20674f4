//! Integration tests for Layer 1: Storage
//!
//! Tests for the entity store, diff builders, and snapshot comparison.

mod store;
