//! Integration tests for Layer 2: Cache
//!
//! Tests for derived-view caches, invalidation sources, and disposal scopes.

mod disposer;
mod view_cache;
