//! Plain geometry shared by layout, paint realization and the backends.
//! Coordinates are pixels with the origin at the top-left and y growing down.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The point `dist` away from `self` at `degrees`, measured clockwise
    /// from East. Quarter turns are exact.
    pub fn toward(self, degrees: f64, dist: f64) -> Self {
        let deg = degrees.rem_euclid(360.0);
        let (dx, dy) = if deg == 0.0 {
            (dist, 0.0)
        } else if deg == 90.0 {
            (0.0, dist)
        } else if deg == 180.0 {
            (-dist, 0.0)
        } else if deg == 270.0 {
            (0.0, -dist)
        } else {
            let rad = deg.to_radians();
            (dist * rad.cos(), dist * rad.sin())
        };
        self.offset(dx, dy)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin(origin: Point, size: Dimensions) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// Overlap of two rectangles; empty (zero-sized) when they are disjoint.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Layout axis. Table sizing runs once per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::Horizontal => "width",
            Axis::Vertical => "height",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toward_quarter_turns_are_exact() {
        let origin = Point::new(10.0, 10.0);
        assert_eq!(origin.toward(0.0, 5.0), Point::new(15.0, 10.0));
        assert_eq!(origin.toward(90.0, 5.0), Point::new(10.0, 15.0));
        assert_eq!(origin.toward(180.0, 5.0), Point::new(5.0, 10.0));
        assert_eq!(origin.toward(-90.0, 5.0), Point::new(10.0, 5.0));
    }

    #[test]
    fn test_toward_diagonal() {
        let p = Point::default().toward(45.0, 2.0_f64.sqrt());
        assert!((p.x - 1.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.intersect(&b).is_empty());
        let c = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&c), Rect::new(5.0, 5.0, 5.0, 5.0));
    }
}
