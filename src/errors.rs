//! Error types with rich diagnostics using miette
//!
//! Matrix and gesture errors are plain values; parse errors carry source
//! spans so a malformed attribute renders with a labelled snippet.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::gesture::DragMode;

// ============================================================================
// Matrix Errors
// ============================================================================

/// Errors raised by matrix algebra
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq)]
pub enum MatrixError {
    #[error("matrix is singular (determinant {determinant})")]
    #[diagnostic(
        code(swivel::matrix::singular),
        help("an element scaled to zero width or height cannot be inverted")
    )]
    Singular { determinant: f64 },
}

// ============================================================================
// Gesture Errors
// ============================================================================

/// Errors raised while turning a drag into a matrix
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq)]
pub enum GestureError {
    #[error("degenerate {mode:?} gesture: the drag starts or ends on the pivot")]
    #[diagnostic(
        code(swivel::gesture::degenerate),
        help("start the drag away from the anchor point")
    )]
    Degenerate { mode: DragMode },
}

// ============================================================================
// Transform Errors
// ============================================================================

/// Errors from operations that mutate element transforms
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq)]
pub enum TransformError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Gesture(#[from] GestureError),

    #[error("unknown scene element {index}")]
    #[diagnostic(code(swivel::scene::unknown_element))]
    UnknownElement { index: usize },
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors that occur while parsing attribute text
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("invalid syntax, expected {expected}")]
    #[diagnostic(code(swivel::parse::syntax))]
    Syntax {
        expected: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("{function}() takes {expected} arguments, got {got}")]
    #[diagnostic(code(swivel::parse::arity))]
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("wrong number of arguments")]
        span: SourceSpan,
    },

    #[error("invalid number: {message}")]
    #[diagnostic(code(swivel::parse::invalid_number))]
    InvalidNumber {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("invalid number")]
        span: SourceSpan,
    },

    #[error("path data must start with a moveto")]
    #[diagnostic(
        code(swivel::parse::missing_moveto),
        help("begin the path with `M x y` or `m x y`")
    )]
    MissingMoveTo {
        #[source_code]
        src: NamedSource<String>,
        #[label("first command")]
        span: SourceSpan,
    },
}

impl ParseError {
    pub(crate) fn named_source(name: &str, text: &str) -> NamedSource<String> {
        NamedSource::new(name, text.to_string())
    }
}
