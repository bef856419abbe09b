//! 2×3 affine matrices.
//!
//! Components follow the SVG convention `(a, b, c, d, e, f)`:
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```
//!
//! `multiply(m0, m1)` applies `m1` first, then `m0`, so a pivot-centered
//! operation reads left-to-right as
//! `translation(pivot) · op · translation(-pivot)`.

use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use glam::{DAffine2, DMat2, DVec2};

use crate::errors::{MatrixError, ParseError};
use crate::options::defaults;
use crate::types::{Offset, Point};

/// A 2D affine transform
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineMatrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for AffineMatrix {
    fn default() -> Self {
        AffineMatrix::IDENTITY
    }
}

impl AffineMatrix {
    pub const IDENTITY: AffineMatrix = AffineMatrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        AffineMatrix { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        AffineMatrix::IDENTITY
    }

    pub const fn translation(dx: f64, dy: f64) -> Self {
        AffineMatrix::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    /// Rotation about the origin by `theta` radians
    pub fn rotation(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        AffineMatrix::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        AffineMatrix::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Horizontal skew by `theta` radians
    pub fn skew_x(theta: f64) -> Self {
        AffineMatrix::new(1.0, 0.0, theta.tan(), 1.0, 0.0, 0.0)
    }

    /// Vertical skew by `theta` radians
    pub fn skew_y(theta: f64) -> Self {
        AffineMatrix::new(1.0, theta.tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// `translation(pivot) · op · translation(-pivot)`
    pub fn about(pivot: Point, op: AffineMatrix) -> Self {
        AffineMatrix::translation(pivot.x, pivot.y)
            .multiply(&op)
            .multiply(&AffineMatrix::translation(-pivot.x, -pivot.y))
    }

    /// `self · rhs`: applies `rhs` first, then `self`
    pub fn multiply(&self, rhs: &AffineMatrix) -> AffineMatrix {
        let m0 = self;
        let m1 = rhs;
        AffineMatrix {
            a: m0.a * m1.a + m0.c * m1.b,
            b: m0.b * m1.a + m0.d * m1.b,
            c: m0.a * m1.c + m0.c * m1.d,
            d: m0.b * m1.c + m0.d * m1.d,
            e: m0.a * m1.e + m0.c * m1.f + m0.e,
            f: m0.b * m1.e + m0.d * m1.f + m0.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Invert using the default singularity threshold
    pub fn invert(&self) -> Result<AffineMatrix, MatrixError> {
        self.invert_with_epsilon(defaults::EPSILON)
    }

    /// Invert, failing when `|det| <= epsilon`
    pub fn invert_with_epsilon(&self, epsilon: f64) -> Result<AffineMatrix, MatrixError> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= epsilon {
            return Err(MatrixError::Singular { determinant: det });
        }
        let m = self;
        Ok(AffineMatrix {
            a: m.d / det,
            b: -m.b / det,
            c: -m.c / det,
            d: m.a / det,
            e: (m.c * m.f - m.e * m.d) / det,
            f: (m.e * m.b - m.a * m.f) / det,
        })
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// Apply only the linear part (offsets ignore translation)
    pub fn transform_offset(&self, o: Offset) -> Offset {
        Offset {
            dx: self.a * o.dx + self.c * o.dy,
            dy: self.b * o.dx + self.d * o.dy,
        }
    }

    pub fn translation_part(&self) -> Offset {
        Offset::new(self.e, self.f)
    }

    pub fn is_identity(&self) -> bool {
        *self == AffineMatrix::IDENTITY
    }

    /// Component-wise comparison within `tolerance`
    pub fn approx_eq(&self, other: &AffineMatrix, tolerance: f64) -> bool {
        self.components()
            .iter()
            .zip(other.components())
            .all(|(l, r)| (l - r).abs() <= tolerance)
    }

    pub fn components(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    pub fn from_components([a, b, c, d, e, f]: [f64; 6]) -> Self {
        AffineMatrix { a, b, c, d, e, f }
    }

    /// Persisted attribute form: `"a, b, c, d, e, f"`
    pub fn to_attribute(&self) -> String {
        self.components()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Parse the persisted attribute form; blank text is identity (absent attribute)
    pub fn from_attribute(text: &str) -> Result<AffineMatrix, ParseError> {
        crate::parse::parse_matrix_attribute(text)
    }
}

impl Mul for AffineMatrix {
    type Output = AffineMatrix;
    fn mul(self, rhs: AffineMatrix) -> AffineMatrix {
        self.multiply(&rhs)
    }
}

impl Mul<Point> for AffineMatrix {
    type Output = Point;
    fn mul(self, rhs: Point) -> Point {
        self.transform_point(rhs)
    }
}

/// SVG `transform` attribute form: `matrix(a, b, c, d, e, f)`
impl fmt::Display for AffineMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matrix({})", self.to_attribute())
    }
}

/// Parses a full SVG transform list and consolidates it
impl FromStr for AffineMatrix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse::parse_transform_list(s)
    }
}

impl From<DAffine2> for AffineMatrix {
    fn from(m: DAffine2) -> Self {
        AffineMatrix {
            a: m.matrix2.x_axis.x,
            b: m.matrix2.x_axis.y,
            c: m.matrix2.y_axis.x,
            d: m.matrix2.y_axis.y,
            e: m.translation.x,
            f: m.translation.y,
        }
    }
}

impl From<AffineMatrix> for DAffine2 {
    fn from(m: AffineMatrix) -> Self {
        DAffine2::from_mat2_translation(
            DMat2::from_cols(DVec2::new(m.a, m.b), DVec2::new(m.c, m.d)),
            DVec2::new(m.e, m.f),
        )
    }
}
