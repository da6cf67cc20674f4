//! Memoized views derived from a store's current snapshot.
//!
//! A [`DerivedViewCache`] remembers one view together with the version of
//! the snapshot it was computed from. A read returns the memo only while the
//! source is still at that version; otherwise it recomputes from the current
//! snapshot. Invalidation events from the subscribed source drop the memo
//! synchronously, so no read that starts after an invalidation returns a
//! view computed before it.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rootstore_foundation::Result;
use rootstore_storage::Snapshot;

use crate::config::CacheConfig;
use crate::disposer::Disposable;
use crate::invalidation::{InvalidationEvent, InvalidationSource, Listener, SubscriptionHandle};
use crate::source::SnapshotSource;

/// Hit, miss, and invalidation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from the memo.
    pub hits: u64,
    /// Reads that recomputed the view.
    pub misses: u64,
    /// Explicit or event-driven invalidations.
    pub invalidations: u64,
}

impl CacheStats {
    /// Fraction of reads answered from the memo.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            0.0
        } else {
            self.hits as f64 / reads as f64
        }
    }
}

struct Memo<V> {
    version: u64,
    view: Arc<V>,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

/// State shared with the invalidation listener.
struct Shared<V> {
    source: Arc<dyn SnapshotSource>,
    compute: Box<dyn Fn(&Snapshot) -> V + Send + Sync>,
    memo: Mutex<Option<Memo<V>>>,
    /// Bumped on every invalidation; a computation that straddles one is
    /// returned but not memoized.
    epoch: AtomicU64,
    disposed: AtomicBool,
    counters: Counters,
    config: CacheConfig,
}

impl<V> Shared<V> {
    fn count(&self, counter: &AtomicU64) {
        if self.config.track_stats {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn value(&self) -> Arc<V> {
        let snapshot = self.source.current();
        let version = snapshot.version();

        if let Some(memo) = self.memo.lock().as_ref() {
            if memo.version == version {
                self.count(&self.counters.hits);
                tracing::trace!(event = "cache_hit", cache = %self.config.name, version);
                return Arc::clone(&memo.view);
            }
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        let view = Arc::new((self.compute)(&snapshot));
        self.count(&self.counters.misses);
        tracing::trace!(
            event = "recompute",
            cache = %self.config.name,
            version,
            "recomputed derived view"
        );

        if !self.disposed.load(Ordering::Acquire) {
            let mut memo = self.memo.lock();
            let newer_memo = memo.as_ref().is_some_and(|m| m.version > version);
            if self.epoch.load(Ordering::Acquire) == epoch && !newer_memo {
                *memo = Some(Memo {
                    version,
                    view: Arc::clone(&view),
                });
            }
        }
        view
    }

    fn invalidate(&self) {
        let mut memo = self.memo.lock();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let dropped = memo.take().is_some();
        drop(memo);

        self.count(&self.counters.invalidations);
        tracing::trace!(
            event = "invalidate",
            cache = %self.config.name,
            dropped,
            "invalidated derived view"
        );
    }
}

// =============================================================================
// Derived View Cache
// =============================================================================

/// Memoizes `compute(source.current())`.
///
/// The cache subscribes to its invalidation source once, at construction, and
/// unsubscribes on [`dispose`](Self::dispose) or drop. The listener only
/// holds a weak reference, so the source never keeps a cache alive.
pub struct DerivedViewCache<V> {
    shared: Arc<Shared<V>>,
    invalidation: Arc<dyn InvalidationSource>,
    subscription: Mutex<Option<SubscriptionHandle>>,
}

impl<V: Send + Sync + 'static> DerivedViewCache<V> {
    /// Creates a cache and subscribes it to `invalidation`.
    ///
    /// `compute` must be deterministic for a given snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the invalidation source refuses the subscription.
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        compute: impl Fn(&Snapshot) -> V + Send + Sync + 'static,
        invalidation: Arc<dyn InvalidationSource>,
        config: CacheConfig,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            source,
            compute: Box::new(compute),
            memo: Mutex::new(None),
            epoch: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
            counters: Counters::default(),
            config,
        });

        let weak: Weak<Shared<V>> = Arc::downgrade(&shared);
        let listener: Listener = Arc::new(move |event: &InvalidationEvent| {
            if let Some(shared) = weak.upgrade() {
                tracing::trace!(
                    event = "invalidation_received",
                    cache = %shared.config.name,
                    kind = %event
                );
                shared.invalidate();
            }
        });
        let handle = invalidation.subscribe(listener)?;

        Ok(Self {
            shared,
            invalidation,
            subscription: Mutex::new(Some(handle)),
        })
    }
}

impl<V> DerivedViewCache<V> {
    /// Returns the view for the source's current snapshot.
    ///
    /// After [`dispose`](Self::dispose) the view is still computed but no
    /// longer memoized.
    #[must_use]
    pub fn value(&self) -> Arc<V> {
        self.shared.value()
    }

    /// Returns the memoized view without computing, even if it is stale.
    #[must_use]
    pub fn peek(&self) -> Option<Arc<V>> {
        self.shared
            .memo
            .lock()
            .as_ref()
            .map(|memo| Arc::clone(&memo.view))
    }

    /// Returns the snapshot version the memo was computed from.
    #[must_use]
    pub fn memo_version(&self) -> Option<u64> {
        self.shared.memo.lock().as_ref().map(|memo| memo.version)
    }

    /// Drops the memo. Safe to call when nothing is memoized.
    pub fn invalidate(&self) {
        self.shared.invalidate();
    }

    /// Unsubscribes from the invalidation source and drops the memo.
    ///
    /// Idempotent.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.subscription.lock().take() {
            self.invalidation.unsubscribe(handle);
        }
        self.shared.memo.lock().take();
        tracing::trace!(
            event = "cache_disposed",
            cache = %self.shared.config.name,
            "disposed derived view cache"
        );
    }

    /// Returns true once [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Returns the cache's label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Returns the counters collected so far.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let counters = &self.shared.counters;
        CacheStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            invalidations: counters.invalidations.load(Ordering::Relaxed),
        }
    }
}

impl<V> Disposable for DerivedViewCache<V>
where
    V: Send + Sync,
{
    fn dispose(&self) {
        DerivedViewCache::dispose(self);
    }
}

impl<V> Drop for DerivedViewCache<V> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<V> fmt::Debug for DerivedViewCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedViewCache")
            .field("name", &self.shared.config.name)
            .field("memo_version", &self.memo_version())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
