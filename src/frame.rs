//! Coordinate frames along the ancestor chain

use crate::matrix::AffineMatrix;
use crate::scene::{NodeId, SceneTree};

/// Native transform of `id`, identity when absent
pub fn local_matrix<T: SceneTree + ?Sized>(tree: &T, id: NodeId) -> AffineMatrix {
    tree.transform(id).unwrap_or(AffineMatrix::IDENTITY)
}

/// Parent-frame-to-root matrix of `id`: every ancestor's native transform,
/// composed from the scene root downward, excluding `id` itself.
///
/// Identity for the root. The tree must be acyclic.
pub fn ancestral_matrix<T: SceneTree + ?Sized>(tree: &T, id: NodeId) -> AffineMatrix {
    match tree.parent(id) {
        None => AffineMatrix::IDENTITY,
        Some(parent) => ancestral_matrix(tree, parent).multiply(&local_matrix(tree, parent)),
    }
}

/// Element-to-root matrix: `ancestral_matrix(id) · T`
pub fn element_to_root<T: SceneTree + ?Sized>(tree: &T, id: NodeId) -> AffineMatrix {
    ancestral_matrix(tree, id).multiply(&local_matrix(tree, id))
}
