//! Configuration for derived-view caches.

/// Configuration for a [`DerivedViewCache`](crate::DerivedViewCache).
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Label used in log events.
    pub name: String,

    /// Whether to count hits, misses, and invalidations.
    pub track_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: "view".to_string(),
            track_stats: true,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given label.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder method to enable or disable statistics.
    #[must_use]
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.track_stats = enabled;
        self
    }
}
