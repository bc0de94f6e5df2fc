//! Geometric primitives for figure placement and layer containment.
//!
//! This module provides the geometric types used throughout Schemata for
//! figure positions, sizes, layer rectangles and grid snapping.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangle defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Diagrams use a screen-style coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Layers are positioned in absolute diagram coordinates. Figures store their
//! position as an offset from the top-left corner of their layer.

use serde::{Deserialize, Serialize};

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use schemata_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Rounds both coordinates to the nearest multiple of `grid`.
    ///
    /// A non-positive grid leaves the point unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use schemata_core::geometry::Point;
    /// let snapped = Point::new(53.0, 47.0).snap(10.0);
    /// assert_eq!(snapped, Point::new(50.0, 50.0));
    /// ```
    pub fn snap(self, grid: f32) -> Self {
        if grid <= 0.0 {
            return self;
        }
        Self {
            x: (self.x / grid).round() * grid,
            y: (self.y / grid).round() * grid,
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// A rectangle with minimum and maximum coordinates.
///
/// Containment is half-open: a point on the minimum edge is inside, a point
/// on the maximum edge is not. Two adjacent layers therefore never both
/// claim the same point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Creates bounds from `x, y, width, height`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use schemata_core::geometry::Bounds;
    /// let layer = Bounds::from_rect(400.0, 0.0, 300.0, 300.0);
    /// assert_eq!(layer.max_x(), 700.0);
    /// ```
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new_from_top_left(Point::new(x, y), Size::new(width, height))
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the area covered by the bounds
    pub fn area(self) -> f32 {
        self.width() * self.height()
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point {
            x: self.min_x,
            y: self.min_y,
        }
    }

    /// Returns `true` if `point` lies inside the bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// # use schemata_core::geometry::{Bounds, Point};
    /// let bounds = Bounds::from_rect(0.0, 0.0, 300.0, 300.0);
    /// assert!(bounds.contains_point(Point::new(0.0, 150.0)));
    /// assert!(!bounds.contains_point(Point::new(300.0, 150.0)));
    /// ```
    pub fn contains_point(self, point: Point) -> bool {
        point.x >= self.min_x && point.x < self.max_x && point.y >= self.min_y && point.y < self.max_y
    }

    /// Returns `true` if `other` lies completely inside these bounds.
    pub fn contains_bounds(self, other: Bounds) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    /// Moves the bounds by the specified offset.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_point_add_and_sub() {
        let p1 = Point::new(5.0, 8.0);
        let p2 = Point::new(2.0, 3.0);
        assert_eq!(p1.add_point(p2), Point::new(7.0, 11.0));
        assert_eq!(p1.sub_point(p2), Point::new(3.0, 5.0));
    }

    #[test]
    fn test_point_snap() {
        assert_eq!(Point::new(53.0, 47.0).snap(10.0), Point::new(50.0, 50.0));
        assert_eq!(Point::new(14.0, 16.0).snap(10.0), Point::new(10.0, 20.0));
        assert_eq!(Point::new(13.3, 7.7).snap(0.0), Point::new(13.3, 7.7));
        assert_eq!(Point::new(13.3, 7.7).snap(-5.0), Point::new(13.3, 7.7));
    }

    #[test]
    fn test_bounds_from_rect() {
        let bounds = Bounds::from_rect(10.0, 20.0, 30.0, 40.0);
        assert_approx_eq!(f32, bounds.min_x(), 10.0);
        assert_approx_eq!(f32, bounds.min_y(), 20.0);
        assert_approx_eq!(f32, bounds.max_x(), 40.0);
        assert_approx_eq!(f32, bounds.max_y(), 60.0);
        assert_approx_eq!(f32, bounds.area(), 1200.0);
    }

    #[test]
    fn test_bounds_contains_point_is_half_open() {
        let bounds = Bounds::from_rect(0.0, 0.0, 300.0, 300.0);
        assert!(bounds.contains_point(Point::new(0.0, 0.0)));
        assert!(bounds.contains_point(Point::new(299.9, 299.9)));
        assert!(!bounds.contains_point(Point::new(300.0, 10.0)));
        assert!(!bounds.contains_point(Point::new(10.0, 300.0)));
        assert!(!bounds.contains_point(Point::new(-0.1, 10.0)));
    }

    #[test]
    fn test_bounds_contains_bounds() {
        let outer = Bounds::from_rect(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_bounds(Bounds::from_rect(10.0, 10.0, 90.0, 90.0)));
        assert!(!outer.contains_bounds(Bounds::from_rect(10.0, 10.0, 91.0, 10.0)));
    }

    #[test]
    fn test_bounds_translate_keeps_size() {
        let bounds = Bounds::from_rect(10.0, 20.0, 50.0, 30.0);
        let moved = bounds.translate(Point::new(100.0, 50.0));
        assert_eq!(moved.min_point(), Point::new(110.0, 70.0));
        assert_approx_eq!(f32, moved.width(), bounds.width());
        assert_approx_eq!(f32, moved.height(), bounds.height());
    }

    proptest! {
        #[test]
        fn snapped_points_lie_on_grid(x in -1000.0f32..1000.0, y in -1000.0f32..1000.0) {
            let snapped = Point::new(x, y).snap(10.0);
            prop_assert!((snapped.x() / 10.0 - (snapped.x() / 10.0).round()).abs() < 1e-3);
            prop_assert!((snapped.y() / 10.0 - (snapped.y() / 10.0).round()).abs() < 1e-3);
            prop_assert!((snapped.x() - x).abs() <= 5.0 + 1e-3);
        }
    }
}
