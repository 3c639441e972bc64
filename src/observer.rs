use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::sync::lock;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Slots<E> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<E>>,
}

/// Ordered list of observers.
///
/// Observers are notified in subscription order. The list lock is released
/// before any callback runs, so a callback may subscribe, unsubscribe or read
/// the state that triggered it.
pub struct ObserverList<E> {
    slots: Arc<Mutex<Slots<E>>>,
}

impl<E: 'static> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> ObserverList<E> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                next_id: 1,
                callbacks: BTreeMap::new(),
            })),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut slots = lock(&self.slots);
            let id = slots.next_id;
            slots.next_id += 1;
            slots.callbacks.insert(id, Arc::new(callback));
            id
        };
        let weak: Weak<Mutex<Slots<E>>> = Arc::downgrade(&self.slots);
        Subscription {
            id,
            detach: Some(Box::new(move || {
                if let Some(slots) = weak.upgrade() {
                    lock(&slots).callbacks.remove(&id);
                }
            })),
        }
    }

    pub fn notify(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = lock(&self.slots).callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for one registered observer. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
