use framewatch_store::MAX_THREAD_COUNT;

/// Timeline geometry constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineConfig {
    /// Horizontal pixels per second of producer time at zoom 1.
    pub pixels_per_second: f64,
    /// Height of one span row.
    pub row_height: f64,
    /// Vertical gap between nested rows.
    pub row_spacing: f64,
    /// Baseline of the first lane.
    pub lane_top: f64,
    /// Minimum distance between consecutive lane baselines.
    pub lane_separation: f64,
    /// Spans narrower than this are widened to it.
    pub min_span_width: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Lane cap; spans on higher thread indices are not laid out.
    pub max_threads: usize,
}

impl TimelineConfig {
    /// Distance between the tops of two nested rows.
    pub fn row_pitch(&self) -> f64 {
        self.row_height + self.row_spacing
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            // 200 px per 10 ms.
            pixels_per_second: 20_000.0,
            row_height: 20.0,
            row_spacing: 1.0,
            lane_top: 10.0,
            lane_separation: 20.0,
            min_span_width: 1.0,
            min_zoom: 0.1,
            max_zoom: 300.0,
            max_threads: MAX_THREAD_COUNT,
        }
    }
}
