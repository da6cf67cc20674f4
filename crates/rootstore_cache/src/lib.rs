//! Derived-view caching and invalidation for rootstore.
//!
//! This crate provides:
//! - [`DerivedViewCache`] - Memoizes a view computed from a store's current snapshot
//! - [`InvalidationSource`] - Capability for subscribing to invalidation events
//! - [`InvalidationHub`] - In-process invalidation source
//! - [`Disposer`] - Scope that releases registered resources exactly once
//! - [`SnapshotSource`] - Read-only handle a cache computes from

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod disposer;
pub mod invalidation;
pub mod source;
pub mod view_cache;

pub use config::CacheConfig;
pub use disposer::{Disposable, Disposer};
pub use invalidation::{
    InvalidationEvent, InvalidationHub, InvalidationSource, Listener, SubscriptionHandle,
};
pub use source::SnapshotSource;
pub use view_cache::{CacheStats, DerivedViewCache};
