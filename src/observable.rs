//! Latest-value broadcast slot.
//!
//! [`CurrentValue`] holds one value and a list of subscribers. A new
//! subscriber is called with the current value immediately, then once per
//! [`publish`](CurrentValue::publish). Everything lives on the UI thread, so
//! the slot is built on `Rc`/`RefCell` and is `!Send`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`CurrentValue::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(SubscriptionId, Callback<T>)>>,
    next_id: Cell<u64>,
}

/// Observable slot holding the latest `T`.
///
/// Cloning yields another handle on the same slot.
pub struct CurrentValue<T> {
    slot: Rc<Slot<T>>,
}

impl<T> Clone for CurrentValue<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Clone + 'static> CurrentValue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slot: Rc::new(Slot {
                value: RefCell::new(initial),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Latest published value.
    pub fn get(&self) -> T {
        self.slot.value.borrow().clone()
    }

    /// Registers `callback` and replays the latest value to it right away.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.slot.next_id.get());
        self.slot.next_id.set(id.0 + 1);

        let callback: Callback<T> = Rc::new(callback);
        self.slot
            .subscribers
            .borrow_mut()
            .push((id, Rc::clone(&callback)));

        let current = self.get();
        callback(&current);
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.slot.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.slot.subscribers.borrow().len()
    }

    /// Replaces the value and notifies every subscriber.
    ///
    /// Subscribers may subscribe or unsubscribe from inside their callback;
    /// changes take effect from the next publish.
    pub(crate) fn publish(&self, value: T) {
        *self.slot.value.borrow_mut() = value.clone();

        let subscribers: Vec<Callback<T>> = self
            .slot
            .subscribers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();

        for callback in subscribers {
            callback(&value);
        }
    }
}
