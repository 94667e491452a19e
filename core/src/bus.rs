//! Explicitly constructed publish/subscribe dispatcher.
//!
//! Each scene builds its own [`EventBus`] and hands clones of it to the
//! collaborators that need it. Listeners stay registered only as long as the
//! [`Subscription`] returned by [`EventBus::subscribe`] is alive, so tearing a
//! scene down removes its listeners without any explicit bookkeeping.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Callback<T>)>,
}

impl<T> Registry<T> {
    fn contains(&self, id: u64) -> bool {
        self.listeners.iter().any(|(listener, _)| *listener == id)
    }
}

/// Single-threaded dispatcher delivering messages to registered listeners.
///
/// Cloning the bus yields another handle to the same listener registry.
pub struct EventBus<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> EventBus<T> {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Registers a listener that stays active until the subscription drops.
    #[must_use = "dropping the subscription immediately unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription<T>
    where
        F: FnMut(&T) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id = registry.next_id.wrapping_add(1);
        let callback: Callback<T> = Rc::new(RefCell::new(listener));
        registry.listeners.push((id, callback));
        Subscription {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    /// Delivers the message to every listener in subscription order.
    ///
    /// Listeners may subscribe or drop subscriptions while being notified.
    /// A listener removed earlier in the same delivery is skipped, and a
    /// listener that publishes to the bus it is listening on does not
    /// receive its own nested message. Returns the number of deliveries.
    pub fn publish(&self, message: &T) -> usize {
        let snapshot: Vec<(u64, Callback<T>)> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(id, callback)| (*id, Rc::clone(callback)))
            .collect();

        let mut delivered = 0;
        for (id, callback) in snapshot {
            if !self.registry.borrow().contains(id) {
                continue;
            }
            let Ok(mut listener) = callback.try_borrow_mut() else {
                tracing::trace!(listener = id, "skipping re-entrant delivery");
                continue;
            };
            (&mut *listener)(message);
            delivered += 1;
        }
        delivered
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

impl<T: 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self
            .registry
            .try_borrow()
            .map(|registry| registry.listeners.len())
            .unwrap_or_default();
        f.debug_struct("EventBus")
            .field("listeners", &listeners)
            .finish()
    }
}

/// Scoped registration of a listener; unsubscribes when dropped.
pub struct Subscription<T> {
    registry: Weak<RefCell<Registry<T>>>,
    id: u64,
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if let Ok(mut registry) = registry.try_borrow_mut() {
            registry.listeners.retain(|(id, _)| *id != self.id);
        };
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
