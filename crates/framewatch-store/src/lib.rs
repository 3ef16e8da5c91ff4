//! Bounded rolling-history collections for live telemetry.
//!
//! Three container shapes hold everything the client keeps between
//! redraws:
//! - [`BoundedSeries`]: a ring buffer of the most recent items
//! - [`FrameBucketedSeries`]: a sliding window of per-frame buckets
//! - [`AllocatorSeries`]: one unbounded point series per allocator name
//!
//! Every collection reports mutations to observers registered for
//! [`EventKind::Push`], [`EventKind::Change`] or [`EventKind::Any`].

pub mod allocators;
pub mod buckets;
pub mod error;
pub mod events;
pub mod fps;
pub mod samples;
pub mod series;
pub mod store;

pub use allocators::{AllocatorData, AllocatorSeries};
pub use buckets::{Bucket, FrameBucketedSeries};
pub use error::{Result, StoreError};
pub use events::{Event, EventKind, Observers, SubscriptionId};
pub use fps::FpsCounter;
pub use samples::{
    ApplicationInfo, LogLevel, LogRecord, LogSource, ProfilingResult, SeriesPoint, ThreadSpan,
    DEFAULT_THREAD_COUNT, MAX_THREAD_COUNT,
};
pub use series::{BoundedSeries, DEFAULT_CAPACITY};
pub use store::{HistoryLimits, TelemetryStore};
