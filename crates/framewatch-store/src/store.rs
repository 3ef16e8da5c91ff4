use crate::allocators::AllocatorSeries;
use crate::buckets::FrameBucketedSeries;
use crate::fps::FpsCounter;
use crate::samples::{ProfilingResult, SeriesPoint, ThreadSpan};
use crate::series::{BoundedSeries, DEFAULT_CAPACITY};

/// Retention limits for the rolling collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Frames of per-frame data kept (frame times, task spans).
    pub frame_data_limit: usize,
    /// Profiling results kept.
    pub profiling_result_limit: usize,
    /// Diagnostics records kept.
    pub log_limit: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            frame_data_limit: DEFAULT_CAPACITY,
            profiling_result_limit: DEFAULT_CAPACITY,
            log_limit: 1000,
        }
    }
}

/// Every collection filled from one connection's telemetry.
///
/// Cleared as a whole when a new connection is established so nothing from
/// a previous session survives.
#[derive(Debug)]
pub struct TelemetryStore {
    /// Filtered frame time in milliseconds, keyed by producer time.
    pub frame_dt: BoundedSeries<SeriesPoint>,
    /// Unfiltered frame time in milliseconds, when the producer sends it.
    pub frame_raw_dt: BoundedSeries<SeriesPoint>,
    pub profiling_results: BoundedSeries<ProfilingResult>,
    /// Allocator samples in bytes.
    pub memory: AllocatorSeries,
    pub tasks: FrameBucketedSeries<ThreadSpan>,
    pub fps: FpsCounter,
}

impl TelemetryStore {
    pub fn new(limits: HistoryLimits) -> Self {
        Self {
            frame_dt: BoundedSeries::new(limits.frame_data_limit),
            frame_raw_dt: BoundedSeries::new(limits.frame_data_limit),
            profiling_results: BoundedSeries::new(limits.profiling_result_limit),
            memory: AllocatorSeries::new(),
            tasks: FrameBucketedSeries::new(limits.frame_data_limit),
            fps: FpsCounter::new(),
        }
    }

    /// Clear every collection, firing each one's `Change` observers.
    pub fn clear_all(&mut self) {
        self.frame_dt.clear();
        self.frame_raw_dt.clear();
        self.profiling_results.clear();
        self.memory.clear();
        self.tasks.clear();
        self.fps.reset();
    }

    /// True when no telemetry has been stored since the last clear.
    pub fn is_empty(&self) -> bool {
        self.frame_dt.is_empty()
            && self.frame_raw_dt.is_empty()
            && self.profiling_results.is_empty()
            && self.memory.is_empty()
            && self.tasks.is_empty()
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(HistoryLimits::default())
    }
}
