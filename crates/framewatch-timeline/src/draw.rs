use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Point, Rect};

/// A single, stateless drawing instruction for an external 2D surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Filled rectangle with an optional label drawn inside it.
    DrawRect {
        rect: Rect,
        color: Color,
        label: Option<String>,
    },
    DrawLine {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
    DrawText {
        position: Point,
        text: String,
        align: TextAlign,
    },
    /// Square marker centered on a data point.
    DrawMarker {
        center: Point,
        size: f64,
        color: Color,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// A computed view layout that can be drawn and hit-tested.
pub trait Drawable {
    /// What a successful hit test returns.
    type Hit;

    /// Append this layout's drawing instructions to `out`.
    fn draw(&self, out: &mut Vec<DrawCommand>);

    /// The element under `at`, if any.
    fn hit_test(&self, at: Point) -> Option<Self::Hit>;

    fn draw_list(&self) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        self.draw(&mut out);
        out
    }
}

/// Grid and guide line color.
pub(crate) const GUIDE_COLOR: Color = Color::rgb(0xa0, 0xa0, 0xa0);
