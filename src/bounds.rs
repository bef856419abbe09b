//! Axis-aligned bounds across mixed shapes and nested frames.
//!
//! Matrices are composed top-down while walking each subtree, so a leaf's
//! points are mapped once by the product of everything above it instead of
//! re-resolving its ancestry per leaf.

use crate::errors::MatrixError;
use crate::frame::{ancestral_matrix, element_to_root, local_matrix};
use crate::log::{trace, warn};
use crate::matrix::AffineMatrix;
use crate::scene::{NodeId, SceneTree};
use crate::shape::{Outline, ShapeOutline};
use crate::types::Rect;

/// Bounds of `elements` in the scene root frame.
///
/// Returns [`Rect::EMPTY`] for an empty selection. Fails only when an
/// `Opaque` leaf sits under a singular frame and its platform rectangle
/// cannot be mapped back.
pub fn compute_bounding_box<T: SceneTree + ?Sized>(
    tree: &T,
    elements: &[NodeId],
) -> Result<Rect, MatrixError> {
    let mut rect = Rect::EMPTY;
    for &id in elements {
        let parent = ancestral_matrix(tree, id);
        accumulate(tree, id, &parent, &parent, &mut rect)?;
    }
    Ok(rect)
}

/// Bounds of `elements` in the content frame of `frame`, i.e. the frame its
/// children are laid out in.
pub fn compute_bounding_box_in<T: SceneTree + ?Sized>(
    tree: &T,
    elements: &[NodeId],
    frame: NodeId,
) -> Result<Rect, MatrixError> {
    let from_root = element_to_root(tree, frame).invert()?;
    let mut rect = Rect::EMPTY;
    for &id in elements {
        let parent = ancestral_matrix(tree, id);
        accumulate(tree, id, &from_root.multiply(&parent), &parent, &mut rect)?;
    }
    Ok(rect)
}

/// Walk `id` with `out` mapping its parent frame to the output frame and
/// `root` mapping its parent frame to the scene root.
fn accumulate<T: SceneTree + ?Sized>(
    tree: &T,
    id: NodeId,
    out: &AffineMatrix,
    root: &AffineMatrix,
    rect: &mut Rect,
) -> Result<(), MatrixError> {
    let local = local_matrix(tree, id);
    let out = out.multiply(&local);
    let root = root.multiply(&local);

    let children = tree.children(id);
    if !children.is_empty() {
        // a node with children is a container, its own shape is ignored
        for &child in children {
            accumulate(tree, child, &out, &root, rect)?;
        }
    } else if let Some(shape) = tree.shape(id) {
        match shape.outline() {
            Outline::Sampled(points) => {
                let leaf = Rect::from_points(points.into_iter().map(|p| out.transform_point(p)));
                trace!(node = id.index(), ?leaf, "sampled leaf");
                *rect = rect.union(leaf);
            }
            Outline::Foreign => match tree.platform_bounds(id) {
                Some(global) => {
                    let back = out.multiply(&root.invert()?);
                    let leaf = Rect::from_points(global.corners().map(|p| back.transform_point(p)));
                    trace!(node = id.index(), ?leaf, "opaque leaf");
                    *rect = rect.union(leaf);
                }
                None => {
                    warn!(node = id.index(), "no platform bounds for opaque element");
                }
            },
        }
    }
    Ok(())
}
