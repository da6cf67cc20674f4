//! Integration tests for Layer 3: Sessions
//!
//! Tests for the session coordinator, batches, editable root models, and the
//! module root component.

mod batch;
mod coordinator;
