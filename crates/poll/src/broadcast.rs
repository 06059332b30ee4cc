//! Fan-out of a single upstream value to a dynamic set of listeners.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback receiving the broadcast value (`None` when unknown).
pub type Listener<T> = Arc<dyn Fn(Option<T>) + Send + Sync>;

/// Holds the last known value and the listeners interested in it.
///
/// Listeners are identified by their `Arc` allocation: registering the same
/// `Arc` twice is a no-op. Listeners are invoked outside the internal lock,
/// on a snapshot of the set, so they may add or remove listeners (including
/// themselves) while being called.
pub struct ValueBroadcaster<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    last: Option<T>,
    /// Bumped on every accepted update.
    version: u64,
    listeners: Vec<Listener<T>>,
}

impl<T> Inner<T> {
    fn position(&self, cb: &Listener<T>) -> Option<usize> {
        self.listeners.iter().position(|l| same_listener(l, cb))
    }
}

fn same_listener<T>(a: &Listener<T>, b: &Listener<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl<T: Clone + PartialEq> Default for ValueBroadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq> ValueBroadcaster<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                last: None,
                version: 0,
                listeners: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The last broadcast value.
    pub fn last_value(&self) -> Option<T> {
        self.lock().last.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Registers a listener and immediately replays the last value to it.
    ///
    /// Returns `false` (and replays nothing) if the listener was already
    /// registered. The listener is registered before the replay; if an
    /// update lands while the replay runs, the newest value is replayed
    /// again so the listener never ends on a stale value.
    pub fn add_listener(&self, cb: &Listener<T>) -> bool {
        let (mut value, mut version) = {
            let mut inner = self.lock();
            if inner.position(cb).is_some() {
                return false;
            }
            inner.listeners.push(Arc::clone(cb));
            (inner.last.clone(), inner.version)
        };

        loop {
            cb(value);

            let inner = self.lock();
            if inner.version == version || inner.position(cb).is_none() {
                return true;
            }
            value = inner.last.clone();
            version = inner.version;
        }
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, cb: &Listener<T>) -> bool {
        let mut inner = self.lock();
        match inner.position(cb) {
            Some(i) => {
                inner.listeners.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Stores a new value and broadcasts it, unless it equals the last one.
    ///
    /// Returns `true` if listeners were notified. Delivery order is
    /// unspecified.
    pub fn update_value(&self, value: Option<T>) -> bool {
        let snapshot = {
            let mut inner = self.lock();
            if inner.last == value {
                return false;
            }
            inner.last = value.clone();
            inner.version += 1;
            inner.listeners.clone()
        };

        for cb in snapshot {
            cb(value.clone());
        }
        true
    }
}
