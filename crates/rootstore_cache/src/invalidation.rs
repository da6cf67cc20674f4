//! Invalidation events and the sources that deliver them.
//!
//! A cache subscribes a [`Listener`] once at construction and unsubscribes
//! when it is disposed. [`InvalidationHub`] is the in-process source: the
//! host fires events into it whenever configuration extensions change or it
//! wants every derived view dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rootstore_foundation::{Error, Result};

/// Something that makes derived views stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidationEvent {
    /// A configuration extension was registered.
    ExtensionAdded(String),
    /// A configuration extension was unregistered.
    ExtensionRemoved(String),
    /// The host asked for every cached view to be dropped.
    DropCaches,
}

impl fmt::Display for InvalidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtensionAdded(name) => write!(f, "extension added: {name}"),
            Self::ExtensionRemoved(name) => write!(f, "extension removed: {name}"),
            Self::DropCaches => write!(f, "drop caches"),
        }
    }
}

/// Callback invoked for every event while subscribed.
pub type Listener = Arc<dyn Fn(&InvalidationEvent) + Send + Sync>;

/// Token returned by [`InvalidationSource::subscribe`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    /// Returns the raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// An external feed of invalidation events.
pub trait InvalidationSource: Send + Sync {
    /// Registers `listener` until it is unsubscribed.
    ///
    /// # Errors
    ///
    /// Returns an error if the source refuses new subscriptions.
    fn subscribe(&self, listener: Listener) -> Result<SubscriptionHandle>;

    /// Removes a subscription. Returns false if it was not registered.
    fn unsubscribe(&self, handle: SubscriptionHandle) -> bool;
}

// =============================================================================
// Invalidation Hub
// =============================================================================

#[derive(Default)]
struct HubState {
    next: u64,
    listeners: BTreeMap<u64, Listener>,
    closed: bool,
}

/// In-process [`InvalidationSource`].
///
/// Listeners are called in subscription order, outside the hub's lock, so a
/// listener may subscribe, unsubscribe, or fire again without deadlocking.
#[derive(Default)]
pub struct InvalidationHub {
    state: Mutex<HubState>,
}

impl InvalidationHub {
    /// Creates an open hub with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every current listener.
    ///
    /// Returns the number of listeners notified.
    pub fn fire(&self, event: &InvalidationEvent) -> usize {
        let listeners: Vec<Listener> = self.state.lock().listeners.values().cloned().collect();
        tracing::trace!(
            event = "invalidation_fired",
            kind = %event,
            listeners = listeners.len(),
            "firing invalidation event"
        );
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    /// Returns the number of active subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Stops accepting subscriptions and drops every listener.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.listeners.clear();
    }

    /// Returns true if the hub has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl InvalidationSource for InvalidationHub {
    fn subscribe(&self, listener: Listener) -> Result<SubscriptionHandle> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::subscription_failed("invalidation hub is closed"));
        }
        let id = state.next;
        state.next += 1;
        state.listeners.insert(id, listener);
        Ok(SubscriptionHandle(id))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.state.lock().listeners.remove(&handle.0).is_some()
    }
}

impl fmt::Debug for InvalidationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InvalidationHub")
            .field("listeners", &state.listeners.len())
            .field("closed", &state.closed)
            .finish()
    }
}
