use std::collections::VecDeque;

use crate::error::Result;
use crate::events::{Event, EventKind, Observers, SubscriptionId};

/// Default number of retained items.
pub const DEFAULT_CAPACITY: usize = 200;

/// Ring buffer of the most recent `capacity` items.
///
/// Pushing into a full series evicts the oldest item first, so the content
/// is always the last `capacity` items pushed, in arrival order.
pub struct BoundedSeries<T> {
    items: VecDeque<T>,
    capacity: usize,
    observers: Observers<T, VecDeque<T>>,
}

impl<T> BoundedSeries<T> {
    /// Create an empty series. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            observers: Observers::with_push(),
        }
    }

    /// Append an item, evicting the oldest one when full.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);

        if let Some(pushed) = self.items.back() {
            self.observers.notify_push(pushed, &self.items);
        }
    }

    /// Drop every item and report the (empty) content.
    pub fn clear(&mut self) {
        self.items.clear();
        self.observers.notify_change(&self.items);
    }

    /// Register an observer.
    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> Result<SubscriptionId>
    where
        F: FnMut(Event<'_, T, VecDeque<T>>) + 'static,
    {
        self.observers.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn items(&self) -> &VecDeque<T> {
        &self.items
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for BoundedSeries<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for BoundedSeries<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedSeries")
            .field("len", &self.items.len())
            .field("capacity", &self.capacity)
            .field("observers", &self.observers)
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a BoundedSeries<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
