//! Timeline and graph layout for live telemetry.
//!
//! Layouts are pure projections: they are recomputed from the stored
//! telemetry and a [`Viewport`] on every redraw and never patched in place.
//! A layout hands out [`DrawCommand`]s for an external 2D surface and
//! answers hit tests.

pub mod config;
pub mod draw;
pub mod geometry;
pub mod graph;
pub mod invalidation;
pub mod layout;
pub mod palette;
pub mod viewport;

pub use config::TimelineConfig;
pub use draw::{DrawCommand, Drawable, TextAlign};
pub use geometry::{Color, Point, Rect};
pub use graph::{AxisTick, GraphConfig, GraphLayout, PointHit, YLimits, AXIS_UNITS};
pub use invalidation::Invalidation;
pub use layout::{FrameExtent, SpanRect, TimelineLayout};
pub use palette::{color_for_name, name_hash, PALETTE};
pub use viewport::Viewport;
