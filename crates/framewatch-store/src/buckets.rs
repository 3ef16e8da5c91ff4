use std::collections::VecDeque;

use tracing::trace;

use crate::error::Result;
use crate::events::{Event, EventKind, Observers, SubscriptionId};
use crate::series::DEFAULT_CAPACITY;

/// Items sharing one producer frame id.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<T> {
    frame_id: u64,
    items: Vec<T>,
}

impl<T> Bucket<T> {
    fn new(frame_id: u64) -> Self {
        Self {
            frame_id,
            items: Vec::new(),
        }
    }

    /// Frame id that opened this bucket.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Items in arrival order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Sliding window of the most recent `capacity` telemetry frames.
///
/// A push with a frame id greater than the last one opens a new bucket,
/// evicting the oldest bucket when the window is full. A push with a frame
/// id at or below the last one lands in the current bucket, so late items
/// from the same frame accumulate instead of opening a bucket out of order.
/// Retained buckets therefore always have non-decreasing frame ids.
pub struct FrameBucketedSeries<T> {
    buckets: VecDeque<Bucket<T>>,
    capacity: usize,
    last_frame_id: Option<u64>,
    observers: Observers<T, VecDeque<Bucket<T>>>,
}

impl<T> FrameBucketedSeries<T> {
    /// Create an empty series. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buckets: VecDeque::with_capacity(capacity),
            capacity,
            last_frame_id: None,
            observers: Observers::with_push(),
        }
    }

    /// Add an item to the bucket for `frame_id`.
    pub fn push(&mut self, frame_id: u64, item: T) {
        let opens_bucket = match self.last_frame_id {
            None => true,
            Some(last) => frame_id > last,
        };

        if opens_bucket || self.buckets.is_empty() {
            if self.buckets.len() == self.capacity {
                if let Some(evicted) = self.buckets.pop_front() {
                    trace!(frame_id = evicted.frame_id, "evicted frame bucket");
                }
            }
            self.buckets.push_back(Bucket::new(frame_id));
            self.last_frame_id = Some(frame_id);
        }

        if let Some(bucket) = self.buckets.back_mut() {
            bucket.items.push(item);
        }

        if let Some(pushed) = self.buckets.back().and_then(|bucket| bucket.items.last()) {
            self.observers.notify_push(pushed, &self.buckets);
        }
    }

    /// Drop every bucket and report the (empty) content.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.last_frame_id = None;
        self.observers.notify_change(&self.buckets);
    }

    /// Register an observer.
    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> Result<SubscriptionId>
    where
        F: FnMut(Event<'_, T, VecDeque<Bucket<T>>>) + 'static,
    {
        self.observers.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Buckets, oldest first.
    pub fn buckets(&self) -> &VecDeque<Bucket<T>> {
        &self.buckets
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Bucket<T>> {
        self.buckets.iter()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total items across every retained bucket.
    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    /// Frame id of the newest bucket boundary.
    pub fn last_frame_id(&self) -> Option<u64> {
        self.last_frame_id
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for FrameBucketedSeries<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> std::fmt::Debug for FrameBucketedSeries<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBucketedSeries")
            .field("buckets", &self.buckets.len())
            .field("capacity", &self.capacity)
            .field("last_frame_id", &self.last_frame_id)
            .finish()
    }
}
