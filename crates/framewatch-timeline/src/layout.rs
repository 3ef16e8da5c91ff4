use framewatch_store::{Bucket, FrameBucketedSeries, ThreadSpan};

use crate::config::TimelineConfig;
use crate::draw::{DrawCommand, Drawable, GUIDE_COLOR};
use crate::geometry::{Color, Point, Rect};
use crate::palette::color_for_name;
use crate::viewport::Viewport;

/// Approximate glyph width used to decide whether a label fits.
pub const APPROX_CHAR_WIDTH: f64 = 7.0;

const FRAME_LINE_COLOR: Color = Color::rgb(0x60, 0x60, 0x60);

/// Horizontal placement of one frame bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameExtent {
    pub frame_id: u64,
    /// Left edge in screen pixels.
    pub x: f64,
    pub width: f64,
    /// Earliest span start in the bucket, in seconds.
    pub origin: f64,
}

/// A positioned span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanRect<'a> {
    pub span: &'a ThreadSpan,
    pub rect: Rect,
    pub color: Color,
}

impl SpanRect<'_> {
    /// `"<name> <dt> ms"`, or the bare name for zero-length spans.
    pub fn label(&self) -> String {
        if self.span.duration > 0.0 {
            format!("{} {:.3} ms", self.span.name, self.span.duration * 1000.0)
        } else {
            self.span.name.clone()
        }
    }

    /// The label if it fits inside the rectangle.
    pub fn fitted_label(&self, char_width: f64) -> Option<String> {
        let label = self.label();
        let needed = label.chars().count() as f64 * char_width + 2.0;
        (needed <= self.rect.w).then_some(label)
    }
}

/// Frame placement at a fixed scale, shared by layout and content sizing.
struct FramePlacement<'a> {
    bucket: &'a Bucket<ThreadSpan>,
    x: f64,
    width: f64,
    origin: f64,
}

fn place_frames<'a>(
    buckets: impl IntoIterator<Item = &'a Bucket<ThreadSpan>>,
    scale: f64,
) -> impl Iterator<Item = FramePlacement<'a>> {
    let mut cursor = 0.0_f64;
    let mut previous_origin: Option<f64> = None;
    buckets.into_iter().filter_map(move |bucket| {
        let origin = bucket
            .items()
            .iter()
            .map(|span| span.start)
            .fold(f64::INFINITY, f64::min);
        if !origin.is_finite() {
            return None;
        }
        let longest = bucket
            .items()
            .iter()
            .fold(0.0_f64, |longest, span| longest.max(span.duration));
        let gap = previous_origin.map_or(0.0, |prev| scale * (origin - prev).max(0.0));
        let x = cursor + gap;
        let width = scale * longest;
        cursor = x + width;
        previous_origin = Some(origin);
        Some(FramePlacement {
            bucket,
            x,
            width,
            origin,
        })
    })
}

/// Screen-space layout of the thread timeline for one redraw.
#[derive(Debug, Clone)]
pub struct TimelineLayout<'a> {
    frames: Vec<FrameExtent>,
    lane_depths: Vec<u32>,
    lane_baselines: Vec<f64>,
    spans: Vec<SpanRect<'a>>,
    content_width: f64,
    width: f64,
    height: f64,
    row_height: f64,
}

impl<'a> TimelineLayout<'a> {
    /// Lay out every bucket of `tasks` that intersects `viewport`.
    ///
    /// `thread_count` is the number of lanes the application reported; lanes
    /// grow when a visible span names a higher thread index. Both are capped
    /// at `config.max_threads`, and spans beyond the cap are skipped.
    pub fn compute(
        tasks: &'a FrameBucketedSeries<ThreadSpan>,
        thread_count: usize,
        viewport: &Viewport,
        config: &TimelineConfig,
    ) -> Self {
        let scale = config.pixels_per_second * viewport.zoom();
        let view_min = viewport.scroll_x();
        let view_max = view_min + viewport.width();

        let mut visible = Vec::new();
        let mut content_width = 0.0_f64;
        for placement in place_frames(tasks.iter(), scale) {
            content_width = placement.x + placement.width;
            if placement.x + placement.width < view_min || placement.x > view_max {
                continue;
            }
            visible.push(placement);
        }

        let max_threads = config.max_threads.max(1);
        let mut lane_depths = vec![0_u32; thread_count.clamp(1, max_threads)];
        for placement in &visible {
            for span in placement.bucket.items().iter().filter(|span| span.thread < max_threads) {
                if span.thread >= lane_depths.len() {
                    lane_depths.resize(span.thread + 1, 0);
                }
                let lane = &mut lane_depths[span.thread];
                *lane = (*lane).max(span.depth.saturating_add(1));
            }
        }

        let pitch = config.row_pitch();
        let mut lane_baselines = Vec::with_capacity(lane_depths.len());
        let mut baseline = config.lane_top;
        let mut previous_depth: Option<u32> = None;
        for &depth in &lane_depths {
            if let Some(previous) = previous_depth {
                baseline += config.lane_separation.max(pitch * f64::from(previous));
            }
            lane_baselines.push(baseline);
            previous_depth = Some(depth);
        }

        let mut frames = Vec::with_capacity(visible.len());
        let mut spans = Vec::new();
        for placement in &visible {
            let screen_x = placement.x - view_min;
            frames.push(FrameExtent {
                frame_id: placement.bucket.frame_id(),
                x: screen_x,
                width: placement.width,
                origin: placement.origin,
            });

            let mut ordered: Vec<&'a ThreadSpan> = placement
                .bucket
                .items()
                .iter()
                .filter(|span| span.thread < max_threads)
                .collect();
            ordered.sort_by_key(|span| span.thread);
            for span in ordered {
                let rect = Rect::new(
                    screen_x + (span.start - placement.origin) * scale,
                    lane_baselines[span.thread] + pitch * f64::from(span.depth),
                    (span.duration * scale).max(config.min_span_width),
                    config.row_height,
                );
                spans.push(SpanRect {
                    span,
                    rect,
                    color: color_for_name(&span.name),
                });
            }
        }

        tracing::trace!(
            frames = frames.len(),
            spans = spans.len(),
            lanes = lane_depths.len(),
            "timeline layout computed"
        );

        Self {
            frames,
            lane_depths,
            lane_baselines,
            spans,
            content_width,
            width: viewport.width(),
            height: viewport.height(),
            row_height: config.row_height,
        }
    }

    /// Total unzoomed width of every bucket in `tasks`, used as the scroll limit.
    pub fn content_extent(tasks: &FrameBucketedSeries<ThreadSpan>, config: &TimelineConfig) -> f64 {
        place_frames(tasks.iter(), config.pixels_per_second)
            .last()
            .map_or(0.0, |placement| placement.x + placement.width)
    }

    /// Visible frames, oldest first.
    pub fn frames(&self) -> &[FrameExtent] {
        &self.frames
    }

    /// Visible spans in placement order.
    pub fn spans(&self) -> &[SpanRect<'a>] {
        &self.spans
    }

    /// Deepest nesting plus one, per lane, over the visible frames.
    pub fn lane_depths(&self) -> &[u32] {
        &self.lane_depths
    }

    pub fn lane_baselines(&self) -> &[f64] {
        &self.lane_baselines
    }

    pub fn lane_count(&self) -> usize {
        self.lane_depths.len()
    }

    /// Zoomed width of all buckets, visible or not.
    pub fn content_width(&self) -> f64 {
        self.content_width
    }

    /// Y coordinate of each lane's horizontal guide.
    pub fn lane_guides(&self) -> impl Iterator<Item = f64> + '_ {
        let half = self.row_height / 2.0;
        self.lane_baselines.iter().map(move |baseline| baseline + half)
    }

    /// X coordinate of each visible frame boundary.
    pub fn frame_lines(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().map(|frame| frame.x)
    }

    /// First span whose rectangle contains `at`.
    pub fn span_at(&self, at: Point) -> Option<&SpanRect<'a>> {
        self.spans.iter().find(|rect| rect.rect.contains(at))
    }
}

impl<'a> Drawable for TimelineLayout<'a> {
    type Hit = &'a ThreadSpan;

    fn draw(&self, out: &mut Vec<DrawCommand>) {
        for y in self.lane_guides() {
            out.push(DrawCommand::DrawLine {
                from: Point::new(0.0, y),
                to: Point::new(self.width, y),
                color: GUIDE_COLOR,
                width: 2.0,
            });
        }
        for x in self.frame_lines() {
            out.push(DrawCommand::DrawLine {
                from: Point::new(x, 0.0),
                to: Point::new(x, self.height),
                color: FRAME_LINE_COLOR,
                width: 1.0,
            });
        }
        for span in &self.spans {
            out.push(DrawCommand::DrawRect {
                rect: span.rect,
                color: span.color,
                label: span.fitted_label(APPROX_CHAR_WIDTH),
            });
        }
    }

    fn hit_test(&self, at: Point) -> Option<Self::Hit> {
        self.span_at(at).map(|rect| rect.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(frame: u64, thread: usize, depth: u32, start: f64, duration: f64, name: &str) -> ThreadSpan {
        ThreadSpan {
            frame,
            thread,
            depth,
            start,
            duration,
            name: name.to_string(),
        }
    }

    fn series(spans: Vec<ThreadSpan>) -> FrameBucketedSeries<ThreadSpan> {
        let mut tasks = FrameBucketedSeries::new(200);
        for span in spans {
            tasks.push(span.frame, span);
        }
        tasks
    }

    fn wide_viewport() -> Viewport {
        let mut viewport = Viewport::new(100_000.0, 600.0);
        viewport.set_content_width(1_000_000.0);
        viewport
    }

    #[test]
    fn empty_store_lays_out_nothing() {
        let tasks = FrameBucketedSeries::new(200);
        let layout = TimelineLayout::compute(&tasks, 2, &wide_viewport(), &TimelineConfig::default());
        assert!(layout.frames().is_empty());
        assert!(layout.spans().is_empty());
        assert_eq!(layout.content_width(), 0.0);
        assert_eq!(layout.lane_count(), 2);
        assert_eq!(TimelineLayout::content_extent(&tasks, &TimelineConfig::default()), 0.0);
    }

    #[test]
    fn zero_thread_count_still_has_one_lane() {
        let tasks = FrameBucketedSeries::new(200);
        let layout = TimelineLayout::compute(&tasks, 0, &wide_viewport(), &TimelineConfig::default());
        assert_eq!(layout.lane_count(), 1);
        assert_eq!(layout.lane_baselines(), &[10.0]);
    }

    #[test]
    fn nested_spans_push_next_lane_down() {
        let tasks = series(vec![
            span(1, 0, 0, 0.0, 0.010, "frame"),
            span(1, 0, 1, 0.001, 0.004, "update"),
            span(1, 1, 0, 0.002, 0.003, "audio"),
        ]);
        let config = TimelineConfig::default();
        let layout = TimelineLayout::compute(&tasks, 2, &wide_viewport(), &config);

        assert!(layout.lane_depths()[0] >= 2);
        let baselines = layout.lane_baselines();
        assert!(baselines[1] > baselines[0]);
        assert_eq!(baselines[0], 10.0);
        assert_eq!(baselines[1], 10.0 + 2.0 * config.row_pitch());
    }

    #[test]
    fn shallow_lanes_keep_minimum_separation() {
        let tasks = series(vec![span(1, 0, 0, 0.0, 0.001, "a")]);
        let layout = TimelineLayout::compute(&tasks, 3, &wide_viewport(), &TimelineConfig::default());
        // lane 0 has depth 1 (21 px pitch), lane 1 is empty (separation 20).
        assert_eq!(layout.lane_baselines(), &[10.0, 31.0, 51.0]);
    }

    #[test]
    fn span_on_unknown_thread_adds_lanes() {
        let tasks = series(vec![span(1, 4, 0, 0.0, 0.001, "io")]);
        let layout = TimelineLayout::compute(&tasks, 2, &wide_viewport(), &TimelineConfig::default());
        assert_eq!(layout.lane_count(), 5);
        assert_eq!(layout.spans()[0].rect.y, layout.lane_baselines()[4]);
    }

    #[test]
    fn huge_thread_count_is_capped() {
        let tasks = FrameBucketedSeries::new(200);
        let config = TimelineConfig::default();
        let layout = TimelineLayout::compute(&tasks, 1usize << 40, &wide_viewport(), &config);
        assert_eq!(layout.lane_count(), config.max_threads);
    }

    #[test]
    fn spans_beyond_the_lane_cap_are_skipped() {
        let tasks = series(vec![
            span(1, 0, 0, 0.0, 0.001, "main"),
            span(1, usize::MAX, 0, 0.0, 0.001, "bogus"),
            span(1, 1_000_000_000_000, 0, 0.0, 0.001, "bogus"),
        ]);
        let config = TimelineConfig {
            max_threads: 4,
            ..TimelineConfig::default()
        };
        let layout = TimelineLayout::compute(&tasks, 2, &wide_viewport(), &config);
        assert_eq!(layout.lane_count(), 2);
        assert_eq!(layout.spans().len(), 1);
        assert_eq!(layout.spans()[0].span.name, "main");
    }

    #[test]
    fn frames_are_placed_with_gaps_between_origins() {
        let tasks = series(vec![
            span(1, 0, 0, 0.000, 0.010, "a"),
            span(2, 0, 0, 0.016, 0.005, "b"),
        ]);
        let layout = TimelineLayout::compute(&tasks, 1, &wide_viewport(), &TimelineConfig::default());
        let frames = layout.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].x, 0.0);
        assert!((frames[0].width - 200.0).abs() < 1e-9);
        // cursor 200 + gap 16 ms * 20000.
        assert!((frames[1].x - 520.0).abs() < 1e-9);
        assert!((frames[1].width - 100.0).abs() < 1e-9);
        assert!((layout.content_width() - 620.0).abs() < 1e-9);
        assert!((TimelineLayout::content_extent(&tasks, &TimelineConfig::default()) - 620.0).abs() < 1e-9);
    }

    #[test]
    fn span_rect_is_relative_to_frame_origin() {
        let tasks = series(vec![
            span(7, 0, 0, 1.000, 0.010, "frame"),
            span(7, 0, 1, 1.002, 0.000001, "tiny"),
        ]);
        let config = TimelineConfig::default();
        let layout = TimelineLayout::compute(&tasks, 1, &wide_viewport(), &config);
        let tiny = &layout.spans()[1];
        assert!((tiny.rect.x - 40.0).abs() < 1e-6);
        assert_eq!(tiny.rect.y, 10.0 + config.row_pitch());
        assert_eq!(tiny.rect.w, 1.0);
        assert_eq!(tiny.rect.h, 20.0);
        assert_eq!(tiny.color, color_for_name("tiny"));
    }

    #[test]
    fn spans_are_ordered_by_thread_then_arrival() {
        let tasks = series(vec![
            span(1, 1, 0, 0.0, 0.001, "b1"),
            span(1, 0, 0, 0.0, 0.001, "a1"),
            span(1, 1, 0, 0.002, 0.001, "b2"),
            span(1, 0, 0, 0.002, 0.001, "a2"),
        ]);
        let layout = TimelineLayout::compute(&tasks, 2, &wide_viewport(), &TimelineConfig::default());
        let names: Vec<&str> = layout.spans().iter().map(|rect| rect.span.name.as_str()).collect();
        assert_eq!(names, ["a1", "a2", "b1", "b2"]);
    }

    #[test]
    fn frames_outside_the_view_are_culled() {
        let tasks = series(vec![
            span(1, 0, 0, 0.0, 0.010, "first"),
            span(2, 0, 0, 1.0, 0.010, "second"),
        ]);
        let mut viewport = Viewport::new(800.0, 400.0);
        viewport.set_content_width(TimelineLayout::content_extent(&tasks, &TimelineConfig::default()));
        viewport.set_translation(19_500.0);

        let layout = TimelineLayout::compute(&tasks, 1, &viewport, &TimelineConfig::default());
        assert_eq!(layout.frames().len(), 1);
        assert_eq!(layout.frames()[0].frame_id, 2);
        assert!((layout.frames()[0].x - 700.0).abs() < 1e-9);
        assert_eq!(layout.spans().len(), 1);
    }

    #[test]
    fn depth_only_counts_visible_frames() {
        let tasks = series(vec![
            span(1, 0, 3, 0.0, 0.010, "deep"),
            span(2, 0, 0, 1.0, 0.010, "flat"),
        ]);
        let mut viewport = Viewport::new(800.0, 400.0);
        viewport.set_content_width(100_000.0);
        viewport.set_translation(19_500.0);
        let layout = TimelineLayout::compute(&tasks, 1, &viewport, &TimelineConfig::default());
        assert_eq!(layout.lane_depths(), &[1]);
    }

    #[test]
    fn zoom_scales_positions() {
        let tasks = series(vec![
            span(1, 0, 0, 0.0, 0.010, "a"),
            span(1, 0, 0, 0.005, 0.001, "b"),
        ]);
        let mut viewport = wide_viewport();
        viewport.set_zoom(2.0);
        let layout = TimelineLayout::compute(&tasks, 1, &viewport, &TimelineConfig::default());
        assert!((layout.spans()[1].rect.x - 200.0).abs() < 1e-9);
        assert!((layout.frames()[0].width - 400.0).abs() < 1e-9);
    }

    #[test]
    fn hit_test_returns_the_span() {
        let tasks = series(vec![
            span(1, 0, 0, 0.0, 0.010, "outer"),
            span(1, 0, 1, 0.001, 0.002, "inner"),
        ]);
        let layout = TimelineLayout::compute(&tasks, 1, &wide_viewport(), &TimelineConfig::default());

        let hit = layout.hit_test(Point::new(30.0, 35.0)).expect("inner row should be hit");
        assert_eq!(hit.name, "inner");
        let hit = layout.hit_test(Point::new(150.0, 15.0)).expect("outer row should be hit");
        assert_eq!(hit.name, "outer");
        assert!(layout.hit_test(Point::new(150.0, 200.0)).is_none());
    }

    #[test]
    fn labels_only_when_they_fit() {
        let tasks = series(vec![
            span(1, 0, 0, 0.0, 0.010, "render"),
            span(1, 1, 0, 0.0, 0.0001, "physics"),
            span(1, 2, 0, 0.0, 0.0, "mark"),
        ]);
        let layout = TimelineLayout::compute(&tasks, 3, &wide_viewport(), &TimelineConfig::default());
        let spans = layout.spans();
        assert_eq!(spans[0].label(), "render 10.000 ms");
        assert_eq!(spans[0].fitted_label(APPROX_CHAR_WIDTH).as_deref(), Some("render 10.000 ms"));
        assert_eq!(spans[1].fitted_label(APPROX_CHAR_WIDTH), None);
        assert_eq!(spans[2].label(), "mark");
    }

    #[test]
    fn draw_emits_guides_frame_lines_and_rects() {
        let tasks = series(vec![span(1, 0, 0, 0.0, 0.010, "render")]);
        let layout = TimelineLayout::compute(&tasks, 2, &wide_viewport(), &TimelineConfig::default());
        let commands = layout.draw_list();

        let lines = commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::DrawLine { .. }))
            .count();
        assert_eq!(lines, 3);
        let rect = commands
            .iter()
            .find_map(|command| match command {
                DrawCommand::DrawRect { rect, label, .. } => Some((*rect, label.clone())),
                _ => None,
            })
            .expect("span rect should be drawn");
        assert_eq!(rect.0.y, 10.0);
        assert_eq!(rect.1.as_deref(), Some("render 10.000 ms"));

        let guide_y: Vec<f64> = layout.lane_guides().collect();
        assert_eq!(guide_y, [20.0, 41.0]);
    }
}
