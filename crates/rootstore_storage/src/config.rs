//! Configuration for entity stores.

/// What a commit does when the store has moved past the diff's base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CommitPolicy {
    /// Refuse the commit with a stale-base error.
    #[default]
    Reject,
    /// Apply the diff's changes on top of the current snapshot anyway.
    LastWriterWins,
}

/// Configuration for an [`EntityStore`](crate::EntityStore).
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Policy for commits against a moved-on store.
    pub commit_policy: CommitPolicy,

    /// Number of superseded snapshots to retain (0 = none).
    pub history_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            commit_policy: CommitPolicy::Reject,
            history_size: 16,
        }
    }
}

impl StoreConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects stale commits and keeps no history.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            commit_policy: CommitPolicy::Reject,
            history_size: 0,
        }
    }

    /// Lets stale commits overwrite and keeps a longer history.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            commit_policy: CommitPolicy::LastWriterWins,
            history_size: 64,
        }
    }

    /// Builder method to set the commit policy.
    #[must_use]
    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }

    /// Builder method to set the history size.
    #[must_use]
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }
}
