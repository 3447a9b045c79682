//! Pointer geometry and the per-bubble interaction states.

use crate::model::{Position, clamp_percent};

/// A point in client (viewport) pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Horizontal pixels.
    pub x: f64,
    /// Vertical pixels.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box of the panel container, in client pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// `point` relative to the container's top-left corner.
    pub fn relative(&self, point: Point) -> Point {
        Point::new(point.x - self.left, point.y - self.top)
    }

    /// Client coordinates of a percentage position inside the container.
    pub fn point_at(&self, position: Position) -> Point {
        let (x, y) = position.to_pixels(self.width, self.height);
        Point::new(self.left + x, self.top + y)
    }
}

/// What a bubble is currently doing.
#[derive(Clone, Debug, PartialEq)]
pub enum Interaction {
    /// Being moved by the pointer.
    Dragging {
        /// Pointer at drag start, relative to the container.
        pointer_start: Point,
        /// Bubble position at drag start.
        origin: Position,
        /// Live position, committed on pointer-up.
        current: Position,
    },
    /// Text is being edited inline.
    Editing {
        /// Text when editing began.
        original: String,
        /// Live text.
        draft: String,
    },
    /// The tail handle is being turned.
    Rotating {
        /// Bubble center in client pixels.
        center: Point,
        /// Live angle in degrees.
        angle: f64,
    },
}

/// New position for a drag: the pointer delta since drag start, as a percentage
/// of the container, added to the starting position and clamped to `[0, 100]`.
pub fn drag_position(origin: Position, pointer_start: Point, pointer_now: Point, container: &Rect) -> Position {
    let now = container.relative(pointer_now);
    let dx = percent_of(now.x - pointer_start.x, container.width);
    let dy = percent_of(now.y - pointer_start.y, container.height);
    Position::new(
        clamp_percent(origin.x() + dx),
        clamp_percent(origin.y() + dy),
    )
}

fn percent_of(delta: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        delta / extent * 100.0
    } else {
        0.0
    }
}

/// Tail angle in degrees for a pointer at `pointer` around `center`. 0 points
/// straight down and positive angles turn clockwise, so a pointer to the right
/// of the center gives -90.
pub fn tail_angle(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees() - 90.0
}
