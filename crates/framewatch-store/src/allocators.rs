use std::collections::HashMap;

use crate::error::Result;
use crate::events::{Event, EventKind, Observers, SubscriptionId};
use crate::samples::SeriesPoint;

/// Per-allocator memory samples.
///
/// Names get a dense index on first sight; the index is stable until the
/// next `clear`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocatorData {
    index: HashMap<String, usize>,
    names: Vec<String>,
    series: Vec<Vec<SeriesPoint>>,
    max: f64,
}

impl AllocatorData {
    /// Index assigned to `name`, if it has been seen.
    pub fn allocator_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Name that owns `index`.
    pub fn allocator_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Samples of one allocator, oldest first.
    pub fn series(&self, index: usize) -> Option<&[SeriesPoint]> {
        self.series.get(index).map(Vec::as_slice)
    }

    /// `(index, name, samples)` for every allocator in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &[SeriesPoint])> {
        self.names
            .iter()
            .zip(&self.series)
            .enumerate()
            .map(|(i, (name, points))| (i, name.as_str(), points.as_slice()))
    }

    /// Largest sample value seen, 0 when empty.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Number of distinct allocators.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Memory usage keyed by allocator name.
///
/// Series are unbounded for the lifetime of a session. Only whole-content
/// `Change` events are reported.
pub struct AllocatorSeries {
    data: AllocatorData,
    observers: Observers<(), AllocatorData>,
}

impl AllocatorSeries {
    pub fn new() -> Self {
        Self {
            data: AllocatorData::default(),
            observers: Observers::change_only(),
        }
    }

    /// Record `amount` for `name` at `time`. Returns the allocator index.
    pub fn push(&mut self, name: &str, time: f64, amount: f64) -> usize {
        let index = match self.data.index.get(name) {
            Some(index) => *index,
            None => {
                let index = self.data.names.len();
                self.data.index.insert(name.to_string(), index);
                self.data.names.push(name.to_string());
                self.data.series.push(Vec::new());
                index
            }
        };

        if amount > self.data.max {
            self.data.max = amount;
        }
        self.data.series[index].push(SeriesPoint::new(time, amount));

        self.observers.notify_change(&self.data);
        index
    }

    /// Forget every allocator and report the (empty) content.
    pub fn clear(&mut self) {
        self.data = AllocatorData::default();
        self.observers.notify_change(&self.data);
    }

    /// Register an observer. `Push` is rejected.
    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> Result<SubscriptionId>
    where
        F: FnMut(Event<'_, (), AllocatorData>) + 'static,
    {
        self.observers.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn data(&self) -> &AllocatorData {
        &self.data
    }

    pub fn allocator_index(&self, name: &str) -> Option<usize> {
        self.data.allocator_index(name)
    }

    pub fn allocator_name(&self, index: usize) -> Option<&str> {
        self.data.allocator_name(index)
    }

    pub fn series(&self, index: usize) -> Option<&[SeriesPoint]> {
        self.data.series(index)
    }

    pub fn max(&self) -> f64 {
        self.data.max
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for AllocatorSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AllocatorSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocatorSeries")
            .field("allocators", &self.data.names)
            .field("max", &self.data.max)
            .finish()
    }
}
