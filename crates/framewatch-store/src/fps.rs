/// Frame times at or below this are ignored.
const MIN_FRAME_TIME: f64 = 1e-6;

/// Smoothed frames-per-second with session extremes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FpsCounter {
    average: f64,
    min: f64,
    max: f64,
    frames: u64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one frame that took `dt` seconds.
    ///
    /// The average halves towards each new sample.
    pub fn record(&mut self, dt: f64) {
        if dt.is_nan() || dt <= MIN_FRAME_TIME {
            return;
        }
        let fps = 1.0 / dt;
        if self.frames == 0 {
            self.average = fps;
            self.min = fps;
            self.max = fps;
        } else {
            self.average = (self.average + fps) * 0.5;
            self.min = self.min.min(fps);
            self.max = self.max.max(fps);
        }
        self.frames += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn average(&self) -> Option<f64> {
        (self.frames > 0).then_some(self.average)
    }

    pub fn min(&self) -> Option<f64> {
        (self.frames > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.frames > 0).then_some(self.max)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_counter_reports_nothing() {
        let fps = FpsCounter::new();
        assert_eq!(fps.average(), None);
        assert_eq!(fps.min(), None);
        assert_eq!(fps.frames(), 0);
    }

    #[test]
    fn average_halves_towards_new_sample() {
        let mut fps = FpsCounter::new();
        fps.record(0.02); // 50 fps
        fps.record(0.01); // 100 fps

        assert_eq!(fps.average(), Some(75.0));
        assert_eq!(fps.min(), Some(50.0));
        assert_eq!(fps.max(), Some(100.0));
        assert_eq!(fps.frames(), 2);
    }

    #[test]
    fn degenerate_frame_times_are_ignored() {
        let mut fps = FpsCounter::new();
        fps.record(0.0);
        fps.record(1e-9);
        fps.record(-1.0);
        fps.record(f64::NAN);
        assert_eq!(fps.frames(), 0);
    }

    #[test]
    fn reset_clears_extremes() {
        let mut fps = FpsCounter::new();
        fps.record(0.5);
        fps.reset();
        assert_eq!(fps, FpsCounter::default());
    }
}
