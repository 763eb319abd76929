//! Single-writer shared values
//!
//! A [`Shared<T>`] is owned by exactly one component and is the only way to
//! change the value. Everyone else gets a [`ReadOnly<T>`] handle that can read
//! the latest value synchronously and subscribe to changes.
//!
//! Everything runs on the host's UI thread, so the cells are `Rc`/`RefCell`
//! rather than `Arc`/`Mutex`.
//!
//! # Example
//!
//! ```rust
//! use vitrine_core::shared::Shared;
//!
//! let progress = Shared::new(0.0f32);
//! let reader = progress.reader();
//!
//! let _sub = reader.subscribe(|p| println!("progress {p}"));
//! progress.set(0.5);
//! assert_eq!(reader.get(), 0.5);
//! ```

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::Rc;

new_key_type! {
    /// Identifies one subscriber of a shared value
    pub struct SubscriptionId;
}

type Subscribers<T> = Rc<RefCell<SlotMap<SubscriptionId, Rc<dyn Fn(&T)>>>>;

/// Handle returned by `subscribe`; pass it back to `unsubscribe`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
}

/// The writable side of a shared value
pub struct Shared<T> {
    value: Rc<RefCell<T>>,
    subscribers: Subscribers<T>,
}

impl<T: Clone + PartialEq + 'static> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            subscribers: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Replace the value, notifying subscribers if it changed.
    ///
    /// Returns true when the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        notify(&self.subscribers, &value);
        true
    }

    /// A read-only handle for consumers
    pub fn reader(&self) -> ReadOnly<T> {
        ReadOnly {
            value: Rc::clone(&self.value),
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&T) + 'static,
    {
        subscribe(&self.subscribers, callback)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.subscribers.borrow_mut().remove(handle.id).is_some()
    }

    /// Drop every subscriber
    pub fn clear_subscribers(&self) {
        self.subscribers.borrow_mut().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The read-only side of a shared value
pub struct ReadOnly<T> {
    value: Rc<RefCell<T>>,
    subscribers: Subscribers<T>,
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T: Clone + 'static> ReadOnly<T> {
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Subscribe to changes. The callback runs synchronously inside the
    /// writer's `set`, so it must not subscribe or unsubscribe itself.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&T) + 'static,
    {
        subscribe(&self.subscribers, callback)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.subscribers.borrow_mut().remove(handle.id).is_some()
    }
}

fn subscribe<T, F>(subscribers: &Subscribers<T>, callback: F) -> SubscriptionHandle
where
    F: Fn(&T) + 'static,
{
    let id = subscribers.borrow_mut().insert(Rc::new(callback));
    SubscriptionHandle { id }
}

fn notify<T>(subscribers: &Subscribers<T>, value: &T) {
    // Snapshot so callbacks may read other shared values freely
    let callbacks: Vec<Rc<dyn Fn(&T)>> = subscribers.borrow().values().cloned().collect();
    for callback in callbacks {
        callback(value);
    }
}
