// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyed publish/subscribe channels.
//!
//! A [`Channel`] is a cheap cloneable handle; clones share the subscriber
//! list. Delivery is synchronous and in send order. Callbacks may subscribe
//! or unsubscribe on the channel they are called from.

pub mod registry;

pub use registry::{InstrumentKey, NotifierRegistry};

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Handle returned by [`Channel::subscribe`]
pub type SubscriptionId = u64;

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Subscribers<E> {
    next_id: Cell<SubscriptionId>,
    callbacks: RefCell<BTreeMap<SubscriptionId, Callback<E>>>,
}

/// A broadcast channel of events of type `E`
pub struct Channel<E> {
    inner: Rc<Subscribers<E>>,
}

impl<E> Channel<E> {
    /// Create a channel with no subscribers
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Subscribers {
                next_id: Cell::new(1),
                callbacks: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Register a callback
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .callbacks
            .borrow_mut()
            .insert(id, Rc::new(RefCell::new(callback)));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.borrow_mut().remove(&id).is_some()
    }

    /// Number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }

    /// Whether two handles share a channel
    pub fn same_channel(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Deliver an event to every current subscriber
    pub fn send(&self, event: E) {
        let callbacks: Vec<(SubscriptionId, Callback<E>)> = self
            .inner
            .callbacks
            .borrow()
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();

        for (id, callback) in callbacks {
            // Skip callbacks removed by an earlier one in this round
            if !self.inner.callbacks.borrow().contains_key(&id) {
                continue;
            }
            // A callback re-entering its own channel is not called again
            if let Ok(mut callback) = callback.try_borrow_mut() {
                callback(&event);
            }
        }
    }
}

impl<E> Clone for Channel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for Channel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Channel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Change to an item of a list
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T> {
    /// An item was added
    Added(T),
    /// An item changed in place
    Changed(T),
    /// An item was swapped for another
    Replaced { old: T, new: T },
    /// The whole list must be re-read
    Reset,
}

/// Channel carrying list item changes
pub type Notifier<T> = Channel<ChangeEvent<T>>;

/// Channel carrying a bare signal
pub type Notification = Channel<()>;

impl Notification {
    /// Fire the signal
    pub fn notify(&self) {
        self.send(());
    }
}

/// A snapshot of a list together with the channel announcing its changes
#[derive(Debug, Clone)]
pub struct NotifyList<T> {
    items: Vec<T>,
    notifier: Option<Notifier<T>>,
}

impl<T> NotifyList<T> {
    /// Wrap a snapshot without a channel
    pub fn new(items: Vec<T>) -> Self {
        Self { items, notifier: None }
    }

    /// Attach the channel announcing changes to this list
    pub fn with_notifier(mut self, notifier: Notifier<T>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Channel announcing changes, if any
    pub fn notifier(&self) -> Option<&Notifier<T>> {
        self.notifier.as_ref()
    }

    /// Take the snapshot
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for NotifyList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> Deref for NotifyList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

/// A value with a channel announcing its updates
#[derive(Debug, Clone)]
pub struct Watched<T: Clone> {
    value: Rc<RefCell<T>>,
    channel: Channel<T>,
}

impl<T: Clone + PartialEq> Watched<T> {
    /// Wrap an initial value
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            channel: Channel::new(),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Store a value, notifying subscribers if it differs
    pub fn set(&self, value: T) -> bool {
        if *self.value.borrow() == value {
            return false;
        }
        *self.value.borrow_mut() = value.clone();
        self.channel.send(value);
        true
    }

    /// Channel receiving updated values
    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }
}
