use crate::error::{Result, StoreError};

/// Which mutations an observer wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Only newly pushed items.
    Push,
    /// The whole content after every mutation.
    Change,
    /// One event per mutation: the pushed item when the collection can
    /// report pushes, the whole content otherwise.
    Any,
}

/// A mutation report handed to observers.
///
/// `I` is the item type, `C` the content type of the collection.
#[derive(Debug)]
pub enum Event<'a, I: ?Sized, C: ?Sized> {
    Push(&'a I),
    Change(&'a C),
}

impl<I: ?Sized, C: ?Sized> Clone for Event<'_, I, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: ?Sized, C: ?Sized> Copy for Event<'_, I, C> {}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<I, C> = Box<dyn FnMut(Event<'_, I, C>)>;

struct Entry<I: ?Sized, C: ?Sized> {
    id: SubscriptionId,
    kind: EventKind,
    callback: Callback<I, C>,
}

/// Observer list owned by one collection.
///
/// Kept apart from the collection's data so the data can be lent to the
/// callbacks while the list itself is borrowed mutably.
pub struct Observers<I: ?Sized, C: ?Sized> {
    entries: Vec<Entry<I, C>>,
    next_id: u64,
    supports_push: bool,
}

impl<I: ?Sized, C: ?Sized> Observers<I, C> {
    /// Observer list for a collection that reports individual pushes.
    pub fn with_push() -> Self {
        Self::new(true)
    }

    /// Observer list for a collection that only reports whole changes.
    pub fn change_only() -> Self {
        Self::new(false)
    }

    fn new(supports_push: bool) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            supports_push,
        }
    }

    /// Register a callback for `kind`.
    ///
    /// Fails with [`StoreError::PushNotSupported`] when asking a change-only
    /// collection for `Push`.
    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> Result<SubscriptionId>
    where
        F: FnMut(Event<'_, I, C>) + 'static,
    {
        if kind == EventKind::Push && !self.supports_push {
            return Err(StoreError::PushNotSupported);
        }
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            kind,
            callback: Box::new(callback),
        });
        Ok(id)
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Report a pushed item. `content` is the state after the push.
    pub fn notify_push(&mut self, item: &I, content: &C) {
        for entry in &mut self.entries {
            let event = match entry.kind {
                EventKind::Push | EventKind::Any => Event::Push(item),
                EventKind::Change => Event::Change(content),
            };
            (entry.callback)(event);
        }
    }

    /// Report a whole-content change (a clear, or a push on a change-only
    /// collection).
    pub fn notify_change(&mut self, content: &C) {
        for entry in &mut self.entries {
            if entry.kind != EventKind::Push {
                (entry.callback)(Event::Change(content));
            }
        }
    }

    pub fn supports_push(&self) -> bool {
        self.supports_push
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I: ?Sized, C: ?Sized> std::fmt::Debug for Observers<I, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .field("supports_push", &self.supports_push)
            .finish()
    }
}
