//! Pixel-space geometry primitives shared by the placement engine and the
//! measurement boundary.
//!
//! Everything here is plain f32 math on value types; no coordinate system
//! conversions happen in this module. Rects are axis-aligned with `y`
//! growing downward, matching the measurement snapshots the host provides.

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Inset viewport edges in the parent's scroll-adjusted coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

/// Clamp `n` into `[min, max]`.
pub fn clamp(min: f32, n: f32, max: f32) -> f32 {
    max.min(n.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.center_y(), 40.0);
    }

    #[test]
    fn clamp_is_total() {
        assert_eq!(clamp(0.0, -5.0, 10.0), 0.0);
        assert_eq!(clamp(0.0, 5.0, 10.0), 5.0);
        assert_eq!(clamp(0.0, 15.0, 10.0), 10.0);
    }

    #[test]
    fn bounds_containment() {
        let bounds = Bounds {
            left: 8.0,
            top: 8.0,
            right: 92.0,
            bottom: 92.0,
        };
        assert!(bounds.contains(Point::new(8.0, 92.0)));
        assert!(!bounds.contains(Point::new(7.9, 50.0)));
    }
}
