//! Anchor-relative affine transforms and bounding boxes for 2D scene graphs.
//!
//! Each element's native transform is split into a pre-anchor and a
//! post-anchor matrix so that rotate and scale gestures can pivot about a
//! user-movable anchor without disturbing anything else. Bounds are resolved
//! across nested frames and mixed leaf shapes.
//!
//! The scene tree itself belongs to the host and is reached through
//! [`SceneTree`]; [`Scene`] is a ready-made arena implementation.
//!
//! ```
//! use swivel::{AffineMatrix, Scene, SceneElement, SceneTree, Shape, compute_bounding_box};
//!
//! let mut scene = Scene::new();
//! let root = scene.root();
//! let id = scene
//!     .insert(root, SceneElement::leaf(Shape::rectangle(10.0, 20.0, 30.0, 40.0)))
//!     .unwrap();
//! scene.set_transform(id, Some(AffineMatrix::translation(5.0, 0.0)));
//!
//! let rect = compute_bounding_box(&scene, &[id]).unwrap();
//! assert_eq!((rect.left, rect.top, rect.width()), (15.0, 20.0, 30.0));
//! ```

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "scene.pest"]
pub struct SceneParser;

pub mod anchor;
pub mod bounds;
pub mod errors;
pub mod frame;
pub mod gesture;
mod log;
pub mod manipulator;
pub mod matrix;
pub mod options;
pub mod parse;
pub mod scene;
pub mod selection;
pub mod shape;
pub mod types;

pub use anchor::{AnchorDecomposition, anchor_point, apply_group_transform, relocate_anchor};
pub use bounds::{compute_bounding_box, compute_bounding_box_in};
pub use errors::{GestureError, MatrixError, ParseError, TransformError};
pub use frame::{ancestral_matrix, element_to_root};
pub use gesture::{DragGesture, DragMode, resolve_drag_matrix, resolve_drag_matrix_with};
pub use manipulator::{GestureOutcome, Manipulator};
pub use matrix::AffineMatrix;
pub use options::{Options, RotationSense};
pub use scene::{NodeId, Scene, SceneElement, SceneTree};
pub use selection::{PickModifiers, Selection, relocate_selection_anchor};
pub use shape::{PathCommand, Shape, ShapeOutline};
pub use types::{NumericError, Offset, Point, Rect};

#[cfg(test)]
mod tests {
    use super::*;
    use pest::Parser;

    #[test]
    fn parse_matrix_attribute() {
        let input = "1, 0, 0, 1, 5, -7.5";
        let result = SceneParser::parse(Rule::matrix_attribute, input);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[test]
    fn parse_blank_matrix_attribute() {
        let result = SceneParser::parse(Rule::matrix_attribute, "   ");
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[test]
    fn parse_transform_list() {
        let input = "translate(10 20) rotate(45, 5, 5), scale(2)";
        let result = SceneParser::parse(Rule::transform_list, input);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[test]
    fn parse_compact_numbers() {
        // sign and second decimal point both start a new number
        let input = "matrix(1-2.5.5,1e2,0 0)";
        let result = SceneParser::parse(Rule::transform_list, input);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[test]
    fn reject_unknown_transform() {
        let result = SceneParser::parse(Rule::transform_list, "shear(1)");
        assert!(result.is_err());
    }

    #[test]
    fn parse_path_data() {
        let input = "M10 10 h 5 v5 C 1 2 3 4 5 6 s1 1 2 2 Q0 0 1 1 t 2 2 z";
        let result = SceneParser::parse(Rule::path_data, input);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[test]
    fn parse_arc_with_packed_flags() {
        let input = "M0 0 a5 5 0 01 10 0";
        let result = SceneParser::parse(Rule::path_data, input);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[test]
    fn reject_bad_arc_flag() {
        let result = SceneParser::parse(Rule::path_data, "M0 0 A5 5 0 2 1 10 0");
        assert!(result.is_err());
    }
}
