//! Plain geometric primitives shared by every module.
//!
//! Design goals:
//! - A point and a displacement are different things (`Point - Point = Offset`)
//! - The frame of a point is implied by the call site, never mixed silently
//! - An empty bounding box is a value, not an `Option`

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

use glam::DVec2;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
        }
    }
}

impl std::error::Error for NumericError {}

fn check_finite(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(val)
    }
}

/// A position in some coordinate frame
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Create a point with validation (rejects NaN/infinite)
    pub fn try_new(x: f64, y: f64) -> Result<Self, NumericError> {
        Ok(Point { x: check_finite(x)?, y: check_finite(y)? })
    }

    /// Calculate the midpoint between two points
    pub fn midpoint(self, other: Self) -> Self {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }
}

impl From<DVec2> for Point {
    fn from(v: DVec2) -> Self {
        Point { x: v.x, y: v.y }
    }
}

impl From<Point> for DVec2 {
    fn from(p: Point) -> Self {
        DVec2::new(p.x, p.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A displacement/offset vector (not an absolute position)
/// Use this for translations; Point + Offset = Point
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0.0, dy: 0.0 };

    pub const fn new(dx: f64, dy: f64) -> Self {
        Offset { dx, dy }
    }

    pub fn length(self) -> f64 {
        DVec2::from(self).length()
    }

    pub fn is_zero(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

impl From<Offset> for DVec2 {
    fn from(o: Offset) -> Self {
        DVec2::new(o.dx, o.dy)
    }
}

impl From<DVec2> for Offset {
    fn from(v: DVec2) -> Self {
        Offset { dx: v.x, dy: v.y }
    }
}

/// Add an offset to a point to get a new point
impl Add<Offset> for Point {
    type Output = Point;
    fn add(self, rhs: Offset) -> Point {
        Point { x: self.x + rhs.dx, y: self.y + rhs.dy }
    }
}

impl AddAssign<Offset> for Point {
    fn add_assign(&mut self, rhs: Offset) {
        self.x += rhs.dx;
        self.y += rhs.dy;
    }
}

/// Subtract two points to get an offset
impl Sub<Point> for Point {
    type Output = Offset;
    fn sub(self, rhs: Point) -> Offset {
        Offset { dx: self.x - rhs.x, dy: self.y - rhs.y }
    }
}

impl Add for Offset {
    type Output = Offset;
    fn add(self, rhs: Offset) -> Offset { Offset { dx: self.dx + rhs.dx, dy: self.dy + rhs.dy } }
}

impl Neg for Offset {
    type Output = Offset;
    fn neg(self) -> Offset { Offset { dx: -self.dx, dy: -self.dy } }
}

/// Axis-aligned rectangle.
///
/// `Rect::EMPTY` is the sentinel for "no points seen"; it has inverted
/// extents and reports zero width/height. Every non-empty rect satisfies
/// `right >= left` and `bottom >= top`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Default for Rect {
    fn default() -> Self {
        Rect::EMPTY
    }
}

impl Rect {
    /// The empty bounding box (will expand on first point)
    pub const EMPTY: Rect = Rect {
        left: f64::INFINITY,
        top: f64::INFINITY,
        right: f64::NEG_INFINITY,
        bottom: f64::NEG_INFINITY,
    };

    /// Build a rect from two opposite corners in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        let mut rect = Rect::EMPTY;
        rect.expand_point(a);
        rect.expand_point(b);
        rect
    }

    /// Build a rect from its top-left corner and size (negative sizes are normalized)
    pub fn from_origin_size(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect::from_corners(Point::new(x, y), Point::new(x + w, y + h))
    }

    /// Smallest rect containing every point; `EMPTY` for no points
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut rect = Rect::EMPTY;
        for p in points {
            rect.expand_point(p);
        }
        rect
    }

    /// Check if the rect is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }

    /// Expand to include a point
    pub fn expand_point(&mut self, p: Point) {
        self.left = self.left.min(p.x);
        self.top = self.top.min(p.y);
        self.right = self.right.max(p.x);
        self.bottom = self.bottom.max(p.y);
    }

    /// Smallest rect containing both; the empty rect is the identity
    pub fn union(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Whether `other` lies entirely inside this rect (the empty rect is inside everything)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        !self.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.right - self.left }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.bottom - self.top }
    }

    /// Get the center point; `None` for the empty rect
    pub fn center(&self) -> Option<Point> {
        if self.is_empty() {
            return None;
        }
        Some(Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        ))
    }

    /// The four corners, clockwise from top-left
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }

    /// Shift the rect by an offset
    pub fn translate(self, by: Offset) -> Rect {
        if self.is_empty() {
            return self;
        }
        Rect {
            left: self.left + by.dx,
            top: self.top + by.dy,
            right: self.right + by.dx,
            bottom: self.bottom + by.dy,
        }
    }
}
