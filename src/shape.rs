//! Leaf shape geometry.
//!
//! Each shape is its own type that knows how to produce the points its
//! bounding box is computed from, in its own (untransformed) frame.
//! `Shape` is a closed set: anything the scene cannot describe structurally
//! is `Opaque` and gets its bounds from the platform instead.

use enum_dispatch::enum_dispatch;

use crate::errors::ParseError;
use crate::types::Point;

/// Where a leaf's bounding points come from
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    /// Points in the shape's own frame
    Sampled(Vec<Point>),
    /// No structural model; ask the platform for a root-frame rectangle
    Foreign,
}

/// Common behavior for all leaf shapes
#[enum_dispatch]
pub trait ShapeOutline {
    /// Points whose hull bounds the shape, in the shape's own frame
    fn outline(&self) -> Outline;
}

/// An axis-aligned rectangle `{x, y, w, h}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangleShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectangleShape {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

impl ShapeOutline for RectangleShape {
    fn outline(&self) -> Outline {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        Outline::Sampled(vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ])
    }
}

/// A circle `{cx, cy, r}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleShape {
    pub center: Point,
    pub radius: f64,
}

impl CircleShape {
    pub fn new(cx: f64, cy: f64, radius: f64) -> Self {
        Self { center: Point::new(cx, cy), radius }
    }
}

impl ShapeOutline for CircleShape {
    /// Corners of the defining square. Under an ancestor rotation or skew
    /// the mapped square over-approximates the circle.
    fn outline(&self) -> Outline {
        let Point { x: cx, y: cy } = self.center;
        let r = self.radius;
        Outline::Sampled(vec![
            Point::new(cx - r, cy - r),
            Point::new(cx - r, cy + r),
            Point::new(cx + r, cy - r),
            Point::new(cx + r, cy + r),
        ])
    }
}

/// One command of a normalized path (absolute coordinates only)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CurveTo { ctrl1: Point, ctrl2: Point, to: Point },
    Close,
}

impl PathCommand {
    /// Every coordinate pair the command carries
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let pts: ([Point; 3], usize) = match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => ([p, p, p], 1),
            PathCommand::CurveTo { ctrl1, ctrl2, to } => ([ctrl1, ctrl2, to], 3),
            PathCommand::Close => ([Point::ORIGIN; 3], 0),
        };
        pts.0.into_iter().take(pts.1)
    }

    /// SVG letter of the command
    pub fn letter(&self) -> char {
        match self {
            PathCommand::MoveTo(_) => 'M',
            PathCommand::LineTo(_) => 'L',
            PathCommand::CurveTo { .. } => 'C',
            PathCommand::Close => 'Z',
        }
    }
}

/// A path normalized to move/line/cubic/close commands
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathShape {
    pub commands: Vec<PathCommand>,
}

impl PathShape {
    pub fn new(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    /// Parse SVG path data, normalizing every command
    pub fn from_path_data(data: &str) -> Result<Self, ParseError> {
        Ok(Self { commands: crate::parse::parse_path_data(data)? })
    }

    /// Normalized SVG path data text
    pub fn to_path_data(&self) -> String {
        self.commands
            .iter()
            .map(|cmd| {
                let coords: Vec<String> = cmd.points().map(|p| format!("{} {}", p.x, p.y)).collect();
                if coords.is_empty() {
                    cmd.letter().to_string()
                } else {
                    format!("{} {}", cmd.letter(), coords.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ShapeOutline for PathShape {
    /// Every control point. Curves bulge less than their control polygon,
    /// so this bounds the curve but is not tight for curved segments.
    fn outline(&self) -> Outline {
        Outline::Sampled(self.commands.iter().flat_map(PathCommand::points).collect())
    }
}

/// Content with no structural model (text, images, embedded documents)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OpaqueShape;

impl ShapeOutline for OpaqueShape {
    fn outline(&self) -> Outline {
        Outline::Foreign
    }
}

/// A shape enum wrapping all leaf shape types
#[enum_dispatch(ShapeOutline)]
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle(RectangleShape),
    Circle(CircleShape),
    Path(PathShape),
    Opaque(OpaqueShape),
}

impl Shape {
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Shape::Rectangle(RectangleShape::new(x, y, width, height))
    }

    pub fn circle(cx: f64, cy: f64, radius: f64) -> Self {
        Shape::Circle(CircleShape::new(cx, cy, radius))
    }

    pub fn path(commands: Vec<PathCommand>) -> Self {
        Shape::Path(PathShape::new(commands))
    }

    pub fn opaque() -> Self {
        Shape::Opaque(OpaqueShape)
    }
}
