use crate::config::TimelineConfig;

/// Visible window onto the timeline.
///
/// Translation is measured in unzoomed content pixels; the on-screen
/// scroll offset is `translation * zoom`.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
    translation_x: f64,
    max_translation_x: f64,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_config(width, height, &TimelineConfig::default())
    }

    /// Viewport using the zoom limits from `config`.
    pub fn with_config(width: f64, height: f64, config: &TimelineConfig) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            translation_x: 0.0,
            max_translation_x: 0.0,
            zoom: 1.0,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn translation_x(&self) -> f64 {
        self.translation_x
    }

    /// Left edge of the view in zoomed content pixels.
    pub fn scroll_x(&self) -> f64 {
        self.translation_x * self.zoom
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Set the zoom factor, clamped to the configured limits.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_nan() {
            return;
        }
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(1.0);
    }

    /// Set the unzoomed translation, clamped to the content.
    pub fn set_translation(&mut self, translation_x: f64) {
        if translation_x.is_nan() {
            return;
        }
        self.translation_x = translation_x.clamp(0.0, self.max_translation_x);
    }

    /// Drag by `dx` screen pixels (positive drags content right).
    pub fn pan_by(&mut self, dx: f64) {
        self.set_translation(self.translation_x - dx / self.zoom);
    }

    /// Update the scroll limit from the unzoomed content width.
    pub fn set_content_width(&mut self, content_width: f64) {
        self.max_translation_x = content_width.max(0.0);
        self.set_translation(self.translation_x);
    }

    /// Scroll so the end of the content is at the right edge.
    pub fn scroll_to_end(&mut self, content_width: f64) {
        self.set_content_width(content_width);
        self.set_translation(content_width - self.width / self.zoom);
    }
}
