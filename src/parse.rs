//! Parse pest pairs into matrices and normalized path commands

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::{DVec2, dvec2};
use pest::Parser;
use pest::iterators::Pair;

use crate::errors::ParseError;
use crate::matrix::AffineMatrix;
use crate::shape::PathCommand;
use crate::types::Point;
use crate::{Rule, SceneParser};

fn syntax_error(name: &str, text: &str, err: pest::error::Error<Rule>) -> ParseError {
    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => (pos, 0),
        pest::error::InputLocation::Span((start, end)) => (start, end - start),
    };
    ParseError::Syntax {
        expected: err.variant.message().into_owned(),
        src: ParseError::named_source(name, text),
        span: span.into(),
    }
}

fn span_of(pair: &Pair<'_, Rule>) -> (usize, usize) {
    let span = pair.as_span();
    (span.start(), span.end() - span.start())
}

fn parse_number(name: &str, text: &str, pair: Pair<'_, Rule>) -> Result<f64, ParseError> {
    let raw = pair.as_str();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(ParseError::InvalidNumber {
            message: format!("{raw} is out of range"),
            src: ParseError::named_source(name, text),
            span: span_of(&pair).into(),
        }),
        Err(e) => Err(ParseError::InvalidNumber {
            message: e.to_string(),
            src: ParseError::named_source(name, text),
            span: span_of(&pair).into(),
        }),
    }
}

fn parse_number_list(name: &str, text: &str, pair: Pair<'_, Rule>) -> Result<Vec<f64>, ParseError> {
    pair.into_inner()
        .filter(|inner| inner.as_rule() == Rule::number)
        .map(|inner| parse_number(name, text, inner))
        .collect()
}

// ============================================================================
// Matrices
// ============================================================================

/// Parse the persisted anchor attribute `"a, b, c, d, e, f"`.
///
/// Blank text is an absent attribute and yields identity.
pub fn parse_matrix_attribute(text: &str) -> Result<AffineMatrix, ParseError> {
    const NAME: &str = "<anchor matrix>";
    let pair = SceneParser::parse(Rule::matrix_attribute, text)
        .map_err(|e| syntax_error(NAME, text, e))?
        .next()
        .and_then(|p| p.into_inner().next())
        .ok_or_else(|| ParseError::Syntax {
            expected: "six numbers".to_string(),
            src: ParseError::named_source(NAME, text),
            span: (0, text.len()).into(),
        })?;
    let span = span_of(&pair);
    let values = parse_number_list(NAME, text, pair)?;
    match values.len() {
        0 => Ok(AffineMatrix::IDENTITY),
        6 => Ok(AffineMatrix::from_components([
            values[0], values[1], values[2], values[3], values[4], values[5],
        ])),
        got => Err(ParseError::Arity {
            function: "matrix".to_string(),
            expected: "6",
            got,
            src: ParseError::named_source(NAME, text),
            span: span.into(),
        }),
    }
}

/// Parse an SVG `transform` attribute and consolidate it into one matrix.
///
/// The list is multiplied left to right, so the last transform applies
/// first. Angles are in degrees. Blank text is identity.
pub fn parse_transform_list(text: &str) -> Result<AffineMatrix, ParseError> {
    const NAME: &str = "<transform>";
    let pairs = SceneParser::parse(Rule::transform_list, text)
        .map_err(|e| syntax_error(NAME, text, e))?;

    let mut result = AffineMatrix::IDENTITY;
    for pair in pairs.flat_map(|p| p.into_inner()) {
        if pair.as_rule() == Rule::transform {
            result = result.multiply(&parse_transform(NAME, text, pair)?);
        }
    }
    Ok(result)
}

fn parse_transform(name: &str, text: &str, pair: Pair<'_, Rule>) -> Result<AffineMatrix, ParseError> {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let function = inner.next().map(|p| p.as_str()).unwrap_or_default();
    let args = match inner.next() {
        Some(list) => parse_number_list(name, text, list)?,
        None => Vec::new(),
    };

    let arity = |expected: &'static str| ParseError::Arity {
        function: function.to_string(),
        expected,
        got: args.len(),
        src: ParseError::named_source(name, text),
        span: span.into(),
    };

    match (function, args.as_slice()) {
        ("matrix", &[a, b, c, d, e, f]) => Ok(AffineMatrix::new(a, b, c, d, e, f)),
        ("matrix", _) => Err(arity("6")),
        ("translate", &[tx]) => Ok(AffineMatrix::translation(tx, 0.0)),
        ("translate", &[tx, ty]) => Ok(AffineMatrix::translation(tx, ty)),
        ("translate", _) => Err(arity("1 or 2")),
        ("scale", &[s]) => Ok(AffineMatrix::scale(s, s)),
        ("scale", &[sx, sy]) => Ok(AffineMatrix::scale(sx, sy)),
        ("scale", _) => Err(arity("1 or 2")),
        ("rotate", &[deg]) => Ok(AffineMatrix::rotation(deg.to_radians())),
        ("rotate", &[deg, cx, cy]) => Ok(AffineMatrix::about(
            Point::new(cx, cy),
            AffineMatrix::rotation(deg.to_radians()),
        )),
        ("rotate", _) => Err(arity("1 or 3")),
        ("skewX", &[deg]) => Ok(AffineMatrix::skew_x(deg.to_radians())),
        ("skewY", &[deg]) => Ok(AffineMatrix::skew_y(deg.to_radians())),
        (_, _) => Err(arity("1")),
    }
}

// ============================================================================
// Path data
// ============================================================================

/// Parse SVG path data into absolute `M`/`L`/`C`/`Z` commands
pub fn parse_path_data(text: &str) -> Result<Vec<PathCommand>, ParseError> {
    const NAME: &str = "<path data>";
    let pairs = SceneParser::parse(Rule::path_data, text)
        .map_err(|e| syntax_error(NAME, text, e))?;

    let mut pen = PathNormalizer::default();
    for pair in pairs.flat_map(|p| p.into_inner()) {
        let span = span_of(&pair);
        match pair.as_rule() {
            Rule::close => {
                pen.require_moveto(NAME, text, span)?;
                pen.close();
            }
            Rule::arc => {
                pen.require_moveto(NAME, text, span)?;
                let mut inner = pair.into_inner();
                let relative = inner.next().is_some_and(|cmd| cmd.as_str() == "a");
                let mut count = 0;
                for args in inner {
                    let arc = parse_arc_args(NAME, text, args)?;
                    pen.arc(arc, relative);
                    count += 1;
                }
                if count == 0 {
                    return Err(ParseError::Arity {
                        function: "A".to_string(),
                        expected: "a multiple of 7",
                        got: 0,
                        src: ParseError::named_source(NAME, text),
                        span: span.into(),
                    });
                }
            }
            Rule::segment => {
                let mut inner = pair.into_inner();
                let letter = inner
                    .next()
                    .and_then(|cmd| cmd.as_str().chars().next())
                    .unwrap_or('M');
                if !matches!(letter, 'M' | 'm') {
                    pen.require_moveto(NAME, text, span)?;
                }
                let args = match inner.next() {
                    Some(list) => parse_number_list(NAME, text, list)?,
                    None => Vec::new(),
                };
                let arity = match letter.to_ascii_uppercase() {
                    'H' | 'V' => 1,
                    'M' | 'L' | 'T' => 2,
                    'S' | 'Q' => 4,
                    _ => 6,
                };
                if args.is_empty() || args.len() % arity != 0 {
                    return Err(ParseError::Arity {
                        function: letter.to_string(),
                        expected: match arity {
                            1 => "a multiple of 1",
                            2 => "a multiple of 2",
                            4 => "a multiple of 4",
                            _ => "a multiple of 6",
                        },
                        got: args.len(),
                        src: ParseError::named_source(NAME, text),
                        span: span.into(),
                    });
                }
                for (i, chunk) in args.chunks(arity).enumerate() {
                    pen.segment(letter, chunk, i > 0);
                }
            }
            _ => {}
        }
    }
    Ok(pen.commands)
}

struct ArcArgs {
    rx: f64,
    ry: f64,
    rotation: f64,
    large_arc: bool,
    sweep: bool,
    to: DVec2,
}

fn parse_arc_args(name: &str, text: &str, pair: Pair<'_, Rule>) -> Result<ArcArgs, ParseError> {
    let mut numbers = Vec::with_capacity(5);
    let mut flags = Vec::with_capacity(2);
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::flag => flags.push(inner.as_str() == "1"),
            _ => numbers.push(parse_number(name, text, inner)?),
        }
    }
    Ok(ArcArgs {
        rx: numbers[0],
        ry: numbers[1],
        rotation: numbers[2],
        large_arc: flags[0],
        sweep: flags[1],
        to: dvec2(numbers[3], numbers[4]),
    })
}

/// Tracks the pen while commands are made absolute
#[derive(Default)]
struct PathNormalizer {
    commands: Vec<PathCommand>,
    started: bool,
    current: DVec2,
    subpath_start: DVec2,
    // reflection sources for S and T
    last_cubic_ctrl: Option<DVec2>,
    last_quad_ctrl: Option<DVec2>,
}

impl PathNormalizer {
    fn require_moveto(&self, name: &str, text: &str, span: (usize, usize)) -> Result<(), ParseError> {
        if self.started {
            Ok(())
        } else {
            Err(ParseError::MissingMoveTo {
                src: ParseError::named_source(name, text),
                span: span.into(),
            })
        }
    }

    fn line_to(&mut self, to: DVec2) {
        self.commands.push(PathCommand::LineTo(to.into()));
        self.current = to;
    }

    fn cubic_to(&mut self, c1: DVec2, c2: DVec2, to: DVec2) {
        self.commands.push(PathCommand::CurveTo {
            ctrl1: c1.into(),
            ctrl2: c2.into(),
            to: to.into(),
        });
        self.current = to;
    }

    fn quad_to(&mut self, q: DVec2, to: DVec2) {
        let c1 = self.current + (q - self.current) * 2.0 / 3.0;
        let c2 = to + (q - to) * 2.0 / 3.0;
        self.cubic_to(c1, c2, to);
    }

    fn close(&mut self) {
        self.commands.push(PathCommand::Close);
        self.current = self.subpath_start;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    /// One coordinate group of a non-arc command; `repeat` is set for the
    /// implicit repetitions after the first group
    fn segment(&mut self, letter: char, args: &[f64], repeat: bool) {
        let relative = letter.is_ascii_lowercase();
        let base = if relative { self.current } else { DVec2::ZERO };
        let pt = |i: usize| base + dvec2(args[i], args[i + 1]);

        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;
        match letter.to_ascii_uppercase() {
            'M' if !repeat => {
                let to = pt(0);
                self.commands.push(PathCommand::MoveTo(to.into()));
                self.current = to;
                self.subpath_start = to;
                self.started = true;
            }
            'M' | 'L' => self.line_to(pt(0)),
            'H' => {
                let x = if relative { self.current.x + args[0] } else { args[0] };
                self.line_to(dvec2(x, self.current.y));
            }
            'V' => {
                let y = if relative { self.current.y + args[0] } else { args[0] };
                self.line_to(dvec2(self.current.x, y));
            }
            'C' => {
                let (c1, c2, to) = (pt(0), pt(2), pt(4));
                self.cubic_to(c1, c2, to);
                cubic_ctrl = Some(c2);
            }
            'S' => {
                let c1 = self.reflect(self.last_cubic_ctrl);
                let (c2, to) = (pt(0), pt(2));
                self.cubic_to(c1, c2, to);
                cubic_ctrl = Some(c2);
            }
            'Q' => {
                let (q, to) = (pt(0), pt(2));
                self.quad_to(q, to);
                quad_ctrl = Some(q);
            }
            'T' => {
                let q = self.reflect(self.last_quad_ctrl);
                self.quad_to(q, pt(0));
                quad_ctrl = Some(q);
            }
            _ => {}
        }
        self.last_cubic_ctrl = cubic_ctrl;
        self.last_quad_ctrl = quad_ctrl;
    }

    fn reflect(&self, ctrl: Option<DVec2>) -> DVec2 {
        match ctrl {
            Some(c) => self.current * 2.0 - c,
            None => self.current,
        }
    }

    /// Endpoint-parameterized elliptical arc as cubics, one per quarter turn
    fn arc(&mut self, arc: ArcArgs, relative: bool) {
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;

        let from = self.current;
        let to = if relative { from + arc.to } else { arc.to };
        if from == to {
            return;
        }
        let (mut rx, mut ry) = (arc.rx.abs(), arc.ry.abs());
        if rx == 0.0 || ry == 0.0 {
            self.line_to(to);
            return;
        }

        let (sin_phi, cos_phi) = arc.rotation.to_radians().sin_cos();
        let half = (from - to) / 2.0;
        let p = dvec2(
            cos_phi * half.x + sin_phi * half.y,
            -sin_phi * half.x + cos_phi * half.y,
        );

        let lambda = (p.x * p.x) / (rx * rx) + (p.y * p.y) / (ry * ry);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let num = rx * rx * ry * ry - rx * rx * p.y * p.y - ry * ry * p.x * p.x;
        let den = rx * rx * p.y * p.y + ry * ry * p.x * p.x;
        let sign = if arc.large_arc == arc.sweep { -1.0 } else { 1.0 };
        let coef = sign * (num / den).max(0.0).sqrt();
        let c_prime = dvec2(coef * rx * p.y / ry, -coef * ry * p.x / rx);
        let mid = (from + to) / 2.0;
        let center = dvec2(
            cos_phi * c_prime.x - sin_phi * c_prime.y + mid.x,
            sin_phi * c_prime.x + cos_phi * c_prime.y + mid.y,
        );

        let u = dvec2((p.x - c_prime.x) / rx, (p.y - c_prime.y) / ry);
        let v = dvec2((-p.x - c_prime.x) / rx, (-p.y - c_prime.y) / ry);
        let theta1 = u.y.atan2(u.x);
        let mut sweep = u.perp_dot(v).atan2(u.dot(v));
        if !arc.sweep && sweep > 0.0 {
            sweep -= TAU;
        } else if arc.sweep && sweep < 0.0 {
            sweep += TAU;
        }

        let segments = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
        let delta = sweep / segments as f64;
        let t = 4.0 / 3.0 * (delta / 4.0).tan();
        let map = |unit: DVec2| {
            center
                + dvec2(
                    rx * cos_phi * unit.x - ry * sin_phi * unit.y,
                    rx * sin_phi * unit.x + ry * cos_phi * unit.y,
                )
        };

        for i in 0..segments {
            let a1 = theta1 + delta * i as f64;
            let a2 = a1 + delta;
            let (s1, c1) = a1.sin_cos();
            let (s2, c2) = a2.sin_cos();
            let ctrl1 = map(dvec2(c1 - t * s1, s1 + t * c1));
            let ctrl2 = map(dvec2(c2 + t * s2, s2 - t * c2));
            let end = if i + 1 == segments { to } else { map(dvec2(c2, s2)) };
            self.cubic_to(ctrl1, ctrl2, end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::PathShape;

    const EPS: f64 = 1e-9;

    fn path(text: &str) -> String {
        PathShape::new(parse_path_data(text).unwrap()).to_path_data()
    }

    // ==================== Matrix attribute tests ====================

    #[test]
    fn matrix_attribute_roundtrip() {
        let m = AffineMatrix::new(0.5, -1.25, 2.0, 1.0, 30.0, -4.0);
        assert_eq!(parse_matrix_attribute(&m.to_attribute()).unwrap(), m);
    }

    #[test]
    fn blank_matrix_attribute_is_identity() {
        assert_eq!(parse_matrix_attribute("").unwrap(), AffineMatrix::IDENTITY);
        assert_eq!(parse_matrix_attribute("   ").unwrap(), AffineMatrix::IDENTITY);
    }

    #[test]
    fn short_matrix_attribute_is_arity_error() {
        let err = parse_matrix_attribute("1, 0, 0, 1").unwrap_err();
        assert!(matches!(err, ParseError::Arity { got: 4, .. }), "{err:?}");
    }

    #[test]
    fn garbage_matrix_attribute_is_syntax_error() {
        let err = parse_matrix_attribute("1, 0, zero").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }), "{err:?}");
    }

    #[test]
    fn out_of_range_number_rejected() {
        let err = parse_matrix_attribute("1e999, 0, 0, 1, 0, 0").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }), "{err:?}");
    }

    // ==================== Transform list tests ====================

    #[test]
    fn transform_list_consolidates_left_to_right() {
        let m = parse_transform_list("translate(10, 20) scale(2)").unwrap();
        assert_eq!(m, AffineMatrix::translation(10.0, 20.0) * AffineMatrix::scale(2.0, 2.0));
        assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(12.0, 22.0));
    }

    #[test]
    fn transform_list_rotate_about_center() {
        let m = parse_transform_list("rotate(90 5 5)").unwrap();
        let p = m.transform_point(Point::new(10.0, 5.0));
        assert!((p.x - 5.0).abs() < EPS && (p.y - 10.0).abs() < EPS, "{p:?}");
    }

    #[test]
    fn transform_list_matrix_function() {
        let m: AffineMatrix = "matrix(1 0 0 1 3 4)".parse().unwrap();
        assert_eq!(m, AffineMatrix::translation(3.0, 4.0));
    }

    #[test]
    fn transform_list_empty_is_identity() {
        assert_eq!(parse_transform_list("").unwrap(), AffineMatrix::IDENTITY);
    }

    #[test]
    fn transform_list_bad_arity() {
        let err = parse_transform_list("rotate(1, 2)").unwrap_err();
        assert!(matches!(err, ParseError::Arity { got: 2, .. }), "{err:?}");
    }

    // ==================== Path data tests ====================

    #[test]
    fn relative_and_shorthand_lines() {
        insta::assert_snapshot!(path("m 10 10 h 5 v 5 l -5 0 z"), @"M 10 10 L 15 10 L 15 15 L 10 15 Z");
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        insta::assert_snapshot!(path("M0,0 10,0 10,10"), @"M 0 0 L 10 0 L 10 10");
    }

    #[test]
    fn compact_numbers() {
        insta::assert_snapshot!(path("M1.5.5L10-5"), @"M 1.5 0.5 L 10 -5");
    }

    #[test]
    fn close_returns_to_subpath_start() {
        insta::assert_snapshot!(path("M 5 5 l 10 0 z l 0 10"), @"M 5 5 L 15 5 Z L 5 15");
    }

    #[test]
    fn smooth_cubic_reflects_control_point() {
        insta::assert_snapshot!(
            path("M 0 0 C 0 10 10 10 10 0 S 20 -10 20 0"),
            @"M 0 0 C 0 10 10 10 10 0 C 10 -10 20 -10 20 0"
        );
    }

    #[test]
    fn quadratic_is_elevated() {
        insta::assert_snapshot!(path("M 0 0 Q 3 6 6 0"), @"M 0 0 C 2 4 4 4 6 0");
    }

    #[test]
    fn arc_becomes_quarter_cubics() {
        // half circle of radius 10 from (0,0) to (20,0)
        let commands = parse_path_data("M 0 0 A 10 10 0 0 1 20 0").unwrap();
        assert_eq!(commands.len(), 3);
        let PathCommand::CurveTo { to, .. } = commands[1] else {
            panic!("expected curve, got {:?}", commands[1]);
        };
        // the sweep flag runs the arc through (10, -10)
        assert!((to.x - 10.0).abs() < EPS && (to.y + 10.0).abs() < EPS, "{to:?}");
        assert!(
            matches!(commands[2], PathCommand::CurveTo { to, .. } if to == Point::new(20.0, 0.0)),
            "{:?}",
            commands[2]
        );
    }

    #[test]
    fn compact_arc_flags() {
        let commands = parse_path_data("M0,0a5,5 0 1050,0").unwrap();
        assert!(commands.len() > 1);
        assert!(matches!(commands.last(), Some(PathCommand::CurveTo { to, .. }) if *to == Point::new(50.0, 0.0)));
    }

    #[test]
    fn zero_radius_arc_is_line() {
        insta::assert_snapshot!(path("M 0 0 A 0 5 0 0 1 4 4"), @"M 0 0 L 4 4");
    }

    #[test]
    fn path_must_start_with_moveto() {
        let err = parse_path_data("L 10 10").unwrap_err();
        assert!(matches!(err, ParseError::MissingMoveTo { .. }), "{err:?}");
    }

    #[test]
    fn path_bad_arity() {
        let err = parse_path_data("M 0 0 C 1 2 3").unwrap_err();
        assert!(matches!(err, ParseError::Arity { got: 3, .. }), "{err:?}");
    }
}
