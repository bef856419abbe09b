//! Drag gestures and the matrices they resolve to.
//!
//! All three points of a gesture (pivot, start, current) are expressed in
//! the scene root frame.

use glam::DVec2;

use crate::errors::GestureError;
use crate::matrix::AffineMatrix;
use crate::options::{Options, RotationSense};
use crate::types::{Offset, Point, Rect};

/// What a pointer drag does
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DragMode {
    #[default]
    Inactive,
    RubberBand,
    Translate,
    Rotate,
    Scale,
    MoveAnchor,
}

impl DragMode {
    /// Whether the mode needs a pivot to resolve its matrix
    pub fn is_pivoted(self) -> bool {
        matches!(self, DragMode::Rotate | DragMode::Scale)
    }
}

/// An in-progress pointer drag
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragGesture {
    pub mode: DragMode,
    pub start: Point,
    pub current: Point,
}

impl DragGesture {
    pub fn new(mode: DragMode, start: Point) -> Self {
        DragGesture { mode, start, current: start }
    }

    /// Displacement from start to current
    pub fn delta(&self) -> Offset {
        self.current - self.start
    }

    /// Rectangle spanned by start and current (the rubber band)
    pub fn band(&self) -> Rect {
        Rect::from_corners(self.start, self.current)
    }

    /// Resolve this gesture against `pivot`
    pub fn matrix(&self, pivot: Point, options: &Options) -> Result<AffineMatrix, GestureError> {
        resolve_drag_matrix_with(options, self.mode, pivot, self.start, self.current)
    }
}

/// Resolve a drag to a root-frame matrix with default options.
pub fn resolve_drag_matrix(
    mode: DragMode,
    pivot: Point,
    start: Point,
    current: Point,
) -> Result<AffineMatrix, GestureError> {
    resolve_drag_matrix_with(&Options::default(), mode, pivot, start, current)
}

/// Resolve a drag to a root-frame matrix.
///
/// - translate (and move-anchor): `translation(current - start)`
/// - rotate: the angle between `start - pivot` and `current - pivot`, about the pivot
/// - scale: per-axis ratio of those vectors, about the pivot; an axis whose
///   start component is zero keeps scale 1
/// - inactive and rubber-band: identity
///
/// Rotate fails when either vector is zero; scale fails when the start vector is.
pub fn resolve_drag_matrix_with(
    options: &Options,
    mode: DragMode,
    pivot: Point,
    start: Point,
    current: Point,
) -> Result<AffineMatrix, GestureError> {
    let t0 = DVec2::from(start - pivot);
    let t1 = DVec2::from(current - pivot);

    match mode {
        DragMode::Inactive | DragMode::RubberBand => Ok(AffineMatrix::IDENTITY),
        DragMode::Translate | DragMode::MoveAnchor => {
            let d = current - start;
            Ok(AffineMatrix::translation(d.dx, d.dy))
        }
        DragMode::Rotate => {
            let lengths = t0.length() * t1.length();
            if lengths == 0.0 {
                return Err(GestureError::Degenerate { mode });
            }
            let mut theta = (t0.dot(t1) / lengths).clamp(-1.0, 1.0).acos();
            if options.rotation == RotationSense::Signed && t0.perp_dot(t1) < 0.0 {
                theta = -theta;
            }
            Ok(AffineMatrix::about(pivot, AffineMatrix::rotation(theta)))
        }
        DragMode::Scale => {
            if t0 == DVec2::ZERO {
                return Err(GestureError::Degenerate { mode });
            }
            let sx = if t0.x == 0.0 { 1.0 } else { t1.x / t0.x };
            let sy = if t0.y == 0.0 { 1.0 } else { t1.y / t0.y };
            Ok(AffineMatrix::about(pivot, AffineMatrix::scale(sx, sy)))
        }
    }
}
