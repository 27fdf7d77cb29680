// SPDX-License-Identifier: GPL-3.0-only

//! Axis-aligned box math in layout coordinates.
//!
//! The compositor works in three coordinate spaces:
//! - Layout: the global space all outputs are arranged in
//! - View: relative to a view's top-left corner
//! - Surface: relative to a surface's top-left corner, y growing downward
//!
//! Boxes carry integer positions and sizes; hit-testing is done with f64
//! points so rotated lookups do not lose precision.

/// An axis-aligned rectangle, position and size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Point containment, inclusive on all edges.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x as f64
            && x <= (self.x + self.width) as f64
            && y >= self.y as f64
            && y <= (self.y + self.height) as f64
    }

    /// Whether the overlap of two boxes has a non-zero area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Closest point to `(x, y)` inside the box (edges included).
    pub fn closest_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(self.x as f64, (self.x + self.width) as f64),
            y.clamp(self.y as f64, (self.y + self.height) as f64),
        )
    }

    /// Smallest box containing both inputs.
    pub fn union(&self, other: &Rect) -> Rect {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = (self.x + self.width).max(other.x + other.width);
        let y2 = (self.y + self.height).max(other.y + other.height);
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }
}

/// Map a point from view-local into surface-local coordinates of a view
/// rotated by `rotation` radians about the surface center.
///
/// This is the inverse of the transform the renderer applies to the view;
/// [`rotate_from_surface`] below is the forward direction. Both live here so
/// the two conventions cannot drift apart.
pub fn rotate_into_surface(
    sx: f64,
    sy: f64,
    width: i32,
    height: i32,
    rotation: f64,
) -> (f64, f64) {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    // coordinates relative to the center of the view
    let ox = sx - cx;
    let oy = sy - cy;
    // rotated coordinates
    let rx = rotation.cos() * ox - rotation.sin() * oy;
    let ry = rotation.cos() * oy + rotation.sin() * ox;
    (rx + cx, ry + cy)
}

/// Map a surface-local point back into view-local coordinates under the
/// forward (render) rotation.
pub fn rotate_from_surface(
    sx: f64,
    sy: f64,
    width: i32,
    height: i32,
    rotation: f64,
) -> (f64, f64) {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let ox = sx - cx;
    let oy = sy - cy;
    let rx = rotation.cos() * ox + rotation.sin() * oy;
    let ry = rotation.cos() * oy - rotation.sin() * ox;
    (rx + cx, ry + cy)
}

/// Axis-aligned bounding box of `rect` rotated by `rotation` radians about
/// its own center. Used when damaging the footprint of a rotated view.
pub fn rotated_extents(rect: &Rect, rotation: f64) -> Rect {
    if rotation == 0.0 {
        return *rect;
    }
    let (cx, cy) = rect.center();
    let corners = [
        (rect.x as f64, rect.y as f64),
        ((rect.x + rect.width) as f64, rect.y as f64),
        (rect.x as f64, (rect.y + rect.height) as f64),
        (
            (rect.x + rect.width) as f64,
            (rect.y + rect.height) as f64,
        ),
    ];
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for (px, py) in corners {
        let ox = px - cx;
        let oy = py - cy;
        let rx = cx + rotation.cos() * ox + rotation.sin() * oy;
        let ry = cy + rotation.cos() * oy - rotation.sin() * ox;
        min_x = min_x.min(rx);
        min_y = min_y.min(ry);
        max_x = max_x.max(rx);
        max_y = max_y.max(ry);
    }
    Rect::new(
        min_x.floor() as i32,
        min_y.floor() as i32,
        (max_x - min_x).ceil() as i32,
        (max_y - min_y).ceil() as i32,
    )
}
