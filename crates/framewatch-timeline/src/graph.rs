//! Line-graph projection for frame-time and memory series.

use framewatch_store::{AllocatorData, SeriesPoint, TelemetryStore};

use crate::draw::{DrawCommand, Drawable, TextAlign, GUIDE_COLOR};
use crate::geometry::{Color, Point, Rect};

/// Candidate axis tick spacings, smallest first.
pub const AXIS_UNITS: [f64; 9] = [0.25, 0.5, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0, 1000.0];

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Below this the x range is treated as a single instant.
const MIN_X_RANGE: f64 = 0.001;

const SERIES_COLORS: [Color; 3] = [
    Color::rgb(0x33, 0x99, 0x66),
    Color::rgb(0x33, 0x66, 0x99),
    Color::rgb(0x99, 0x33, 0x66),
];

const MARKER_SIZE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphConfig {
    /// Space reserved left of the plot for y labels.
    pub x_axis_offset: f64,
    /// Space reserved below the plot for x labels.
    pub y_axis_offset: f64,
    /// Minimum pixel distance between y ticks.
    pub y_label_min_spacing: f64,
    /// Minimum pixel distance between x ticks.
    pub x_label_min_spacing: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            x_axis_offset: 30.0,
            y_axis_offset: 30.0,
            y_label_min_spacing: 30.0,
            x_label_min_spacing: 40.0,
        }
    }
}

/// Value range of the y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YLimits {
    pub min: f64,
    pub max: f64,
}

impl YLimits {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Frame times in milliseconds.
    pub fn frame_time() -> Self {
        Self::new(0.0, 60.0)
    }

    /// Memory in MiB, with headroom above the largest sample.
    pub fn memory(max_mib: f64) -> Self {
        if max_mib < 1.0 {
            Self::new(0.0, 1.0)
        } else {
            Self::new(0.0, max_mib + 1.0)
        }
    }

    fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// One labelled tick on an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTick {
    /// Screen coordinate along the axis.
    pub position: f64,
    pub value: f64,
}

/// Result of a nearest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointHit {
    pub series: usize,
    pub index: usize,
    pub point: SeriesPoint,
    pub screen: Point,
}

/// Screen-space projection of one or more series onto a plot area.
#[derive(Debug, Clone)]
pub struct GraphLayout {
    view: Rect,
    limits: YLimits,
    x_min: f64,
    x_max: f64,
    series: Vec<Vec<(SeriesPoint, Point)>>,
    x_ticks: Vec<AxisTick>,
    y_ticks: Vec<AxisTick>,
}

impl GraphLayout {
    /// Project `series` into a `width` x `height` surface.
    ///
    /// All series share the x range spanned by their samples.
    pub fn compute<S>(series: &[S], limits: YLimits, width: f64, height: f64, config: &GraphConfig) -> Self
    where
        S: AsRef<[SeriesPoint]>,
    {
        let view = Rect::new(
            config.x_axis_offset,
            0.0,
            (width - config.x_axis_offset).max(0.0),
            (height - config.y_axis_offset).max(0.0),
        );

        let (x_min, x_max) = series
            .iter()
            .flat_map(|points| points.as_ref().iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), point| {
                (lo.min(point.time), hi.max(point.time))
            });
        let (x_min, x_max) = if x_min.is_finite() { (x_min, x_max) } else { (0.0, 0.0) };

        let x_range = x_max - x_min;
        let scale_x = if x_range > 0.0 { view.w / x_range } else { 1.0 };
        let scale_y = if limits.range() > 0.0 { view.h / limits.range() } else { 0.0 };

        let projected = series
            .iter()
            .map(|points| {
                points
                    .as_ref()
                    .iter()
                    .map(|point| {
                        let screen = Point::new(
                            view.x + (point.time - x_min) * scale_x,
                            view.h - (point.value - limits.min) * scale_y,
                        );
                        (*point, screen)
                    })
                    .collect()
            })
            .collect();

        let y_ticks = y_ticks(&view, &limits, scale_y, config);
        let x_ticks = x_ticks(&view, x_min, x_max, scale_x, config);

        Self {
            view,
            limits,
            x_min,
            x_max,
            series: projected,
            x_ticks,
            y_ticks,
        }
    }

    /// Frame time graph: smoothed and raw frame durations in milliseconds.
    pub fn frame_time(store: &TelemetryStore, width: f64, height: f64, config: &GraphConfig) -> Self {
        let series = [
            store.frame_dt.iter().copied().collect::<Vec<_>>(),
            store.frame_raw_dt.iter().copied().collect::<Vec<_>>(),
        ];
        Self::compute(&series, YLimits::frame_time(), width, height, config)
    }

    /// Memory graph: one series per allocator, in MiB.
    pub fn memory(data: &AllocatorData, width: f64, height: f64, config: &GraphConfig) -> Self {
        let series: Vec<Vec<SeriesPoint>> = data
            .iter()
            .map(|(_, _, points)| {
                points
                    .iter()
                    .map(|point| SeriesPoint::new(point.time, point.value / BYTES_PER_MIB))
                    .collect()
            })
            .collect();
        let limits = YLimits::memory(data.max() / BYTES_PER_MIB);
        Self::compute(&series, limits, width, height, config)
    }

    /// Plot area, excluding the axis label margins.
    pub fn view(&self) -> Rect {
        self.view
    }

    pub fn limits(&self) -> YLimits {
        self.limits
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Screen positions of one series.
    pub fn points(&self, series: usize) -> impl Iterator<Item = Point> + '_ {
        self.series
            .get(series)
            .into_iter()
            .flat_map(|points| points.iter().map(|(_, screen)| *screen))
    }

    pub fn x_ticks(&self) -> &[AxisTick] {
        &self.x_ticks
    }

    pub fn y_ticks(&self) -> &[AxisTick] {
        &self.y_ticks
    }

    /// Closest sample to `at` within the plot area's squared extent.
    pub fn nearest(&self, at: Point) -> Option<PointHit> {
        let mut best = self.view.w * self.view.h;
        let mut hit = None;
        for (series, points) in self.series.iter().enumerate() {
            for (index, (point, screen)) in points.iter().enumerate() {
                let distance = screen.distance_squared(at);
                if distance < best {
                    best = distance;
                    hit = Some(PointHit {
                        series,
                        index,
                        point: *point,
                        screen: *screen,
                    });
                }
            }
        }
        hit
    }
}

fn y_ticks(view: &Rect, limits: &YLimits, scale_y: f64, config: &GraphConfig) -> Vec<AxisTick> {
    let range = limits.range();
    if range <= 0.0 {
        return Vec::new();
    }
    for unit in AXIS_UNITS {
        let count = (range / unit).ceil();
        if view.h / count > config.y_label_min_spacing {
            return (0..count as usize)
                .map(|j| {
                    let offset = j as f64 * unit;
                    AxisTick {
                        position: view.h - offset * scale_y,
                        value: limits.min + offset,
                    }
                })
                .collect();
        }
    }
    Vec::new()
}

fn x_ticks(view: &Rect, x_min: f64, x_max: f64, scale_x: f64, config: &GraphConfig) -> Vec<AxisTick> {
    let range = x_max - x_min;
    if range < MIN_X_RANGE {
        return Vec::new();
    }
    for unit in AXIS_UNITS {
        let count = (range / unit).ceil();
        if view.w / count > config.x_label_min_spacing {
            let first = (x_min / unit).ceil() * unit;
            return (0..count as usize)
                .map(|j| {
                    let value = first + j as f64 * unit;
                    AxisTick {
                        position: view.x + (value - x_min) * scale_x,
                        value,
                    }
                })
                .filter(|tick| tick.value <= x_max)
                .collect();
        }
    }
    Vec::new()
}

fn tick_label(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

impl Drawable for GraphLayout {
    type Hit = PointHit;

    fn draw(&self, out: &mut Vec<DrawCommand>) {
        let view = self.view;
        out.push(DrawCommand::DrawLine {
            from: Point::new(view.x, view.y),
            to: Point::new(view.x, view.bottom()),
            color: GUIDE_COLOR,
            width: 1.0,
        });
        out.push(DrawCommand::DrawLine {
            from: Point::new(view.x, view.bottom()),
            to: Point::new(view.right(), view.bottom()),
            color: GUIDE_COLOR,
            width: 1.0,
        });

        for tick in &self.y_ticks {
            out.push(DrawCommand::DrawLine {
                from: Point::new(view.x, tick.position),
                to: Point::new(view.right(), tick.position),
                color: GUIDE_COLOR,
                width: 1.0,
            });
            out.push(DrawCommand::DrawText {
                position: Point::new(view.x - 2.0, tick.position),
                text: tick_label(tick.value),
                align: TextAlign::Right,
            });
        }
        for tick in &self.x_ticks {
            out.push(DrawCommand::DrawText {
                position: Point::new(tick.position, view.bottom() + 2.0),
                text: tick_label(tick.value),
                align: TextAlign::Center,
            });
        }

        for (index, points) in self.series.iter().enumerate() {
            let color = SERIES_COLORS[index % SERIES_COLORS.len()];
            for pair in points.windows(2) {
                out.push(DrawCommand::DrawLine {
                    from: pair[0].1,
                    to: pair[1].1,
                    color,
                    width: 1.0,
                });
            }
            for (_, screen) in points {
                out.push(DrawCommand::DrawMarker {
                    center: *screen,
                    size: MARKER_SIZE,
                    color,
                });
            }
        }
    }

    fn hit_test(&self, at: Point) -> Option<Self::Hit> {
        self.nearest(at)
    }
}
