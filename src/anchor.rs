//! Anchor decomposition, the group transformation solver, and the anchor
//! relocator.
//!
//! Every element's native transform `T` is kept as the product `B · A` of a
//! pre-anchor matrix `B` and a post-anchor matrix `A`. The origin of the
//! pre-anchor frame is the element's pivot. With `P` the ancestral matrix:
//!
//! - a drag matrix `G` in the root frame is conjugated into the pre-anchor
//!   frame, `M = (P·B)⁻¹ · G · (P·B)`, and folded into `A' = M · A`, giving
//!   `T' = B · A'` and a new element-to-root matrix `G · P · T`;
//! - moving the pivot by `d` in the root frame rewrites
//!   `B' = P⁻¹ · translation(d) · P · B` and `A' = B'⁻¹ · T`, leaving `T`
//!   untouched.
//!
//! Elements that never had their anchor manipulated carry no persisted
//! matrices and read as `B = identity`, `A = T`.

use crate::errors::{MatrixError, TransformError};
use crate::frame::{ancestral_matrix, local_matrix};
use crate::log::{debug, warn};
use crate::matrix::AffineMatrix;
use crate::options::Options;
use crate::scene::{NodeId, SceneTree};
use crate::types::{Offset, Point};

/// Tolerance for checking `B · A` against a native transform edited elsewhere
const SYNC_TOLERANCE: f64 = 1e-6;

/// `T = pre · post`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorDecomposition {
    /// `B`
    pub pre: AffineMatrix,
    /// `A`
    pub post: AffineMatrix,
}

impl AnchorDecomposition {
    /// `B = identity`, `A = native`
    pub fn from_native(native: AffineMatrix) -> Self {
        AnchorDecomposition { pre: AffineMatrix::IDENTITY, post: native }
    }

    pub fn native(&self) -> AffineMatrix {
        self.pre.multiply(&self.post)
    }

    /// Read the decomposition of `id`.
    ///
    /// Missing halves fall back to the default decomposition. If the native
    /// transform was rewritten without going through this module, `A` is
    /// re-derived from the persisted `B` so the pivot survives.
    pub fn of<T: SceneTree + ?Sized>(tree: &T, id: NodeId) -> Self {
        let (pre, post) = tree.anchor_matrices(id);
        Self::from_parts(local_matrix(tree, id), pre, post)
    }

    /// Resolve persisted halves against the native transform they should
    /// compose to. See [`AnchorDecomposition::of`].
    pub fn from_parts(
        native: AffineMatrix,
        pre: Option<AffineMatrix>,
        post: Option<AffineMatrix>,
    ) -> Self {
        match (pre, post) {
            (Some(pre), Some(post)) => {
                let decomposition = AnchorDecomposition { pre, post };
                if decomposition.native().approx_eq(&native, SYNC_TOLERANCE) {
                    return decomposition;
                }
                warn!(?native, "anchor matrices out of sync with transform");
                match pre.invert() {
                    Ok(inverse) => AnchorDecomposition { pre, post: inverse.multiply(&native) },
                    Err(_) => AnchorDecomposition::from_native(native),
                }
            }
            (None, None) => AnchorDecomposition::from_native(native),
            _ => {
                warn!("only one anchor matrix persisted, using defaults");
                AnchorDecomposition::from_native(native)
            }
        }
    }

    /// Persist both matrices and the native transform they compose to
    pub fn write<T: SceneTree + ?Sized>(&self, tree: &mut T, id: NodeId) {
        tree.set_anchor_matrices(id, self.pre, self.post);
        tree.set_transform(id, Some(self.native()));
    }

    /// Apply a root-frame drag matrix `g` about the pivot, given the
    /// element's ancestral matrix `parent`. `B` is unchanged.
    pub fn transformed(
        &self,
        parent: &AffineMatrix,
        g: &AffineMatrix,
        epsilon: f64,
    ) -> Result<AnchorDecomposition, MatrixError> {
        let frame = parent.multiply(&self.pre);
        let m = frame.invert_with_epsilon(epsilon)?.multiply(g).multiply(&frame);
        Ok(AnchorDecomposition { pre: self.pre, post: m.multiply(&self.post) })
    }

    /// Move the pivot by `delta` in the root frame without moving the element
    pub fn relocated(
        &self,
        parent: &AffineMatrix,
        delta: Offset,
        epsilon: f64,
    ) -> Result<AnchorDecomposition, MatrixError> {
        let native = self.native();
        let m = parent
            .invert_with_epsilon(epsilon)?
            .multiply(&AffineMatrix::translation(delta.dx, delta.dy))
            .multiply(parent);
        let pre = m.multiply(&self.pre);
        let post = pre.invert_with_epsilon(epsilon)?.multiply(&native);
        Ok(AnchorDecomposition { pre, post })
    }

    /// Pivot location in the root frame: origin of `P · B`
    pub fn pivot(&self, parent: &AffineMatrix) -> Point {
        parent.multiply(&self.pre).transform_point(Point::ORIGIN)
    }
}

/// Pivot of a single element in the root frame
pub fn anchor_point<T: SceneTree + ?Sized>(tree: &T, id: NodeId) -> Point {
    AnchorDecomposition::of(tree, id).pivot(&ancestral_matrix(tree, id))
}

fn require<T: SceneTree + ?Sized>(tree: &T, id: NodeId) -> Result<(), TransformError> {
    if tree.contains(id) {
        Ok(())
    } else {
        Err(TransformError::UnknownElement { index: id.index() })
    }
}

/// Apply the root-frame drag matrix `g` to every element.
///
/// Each element uses its own ancestral and pre-anchor matrices but the same
/// `g`. All results are computed before anything is written, so a singular
/// element leaves the whole selection untouched.
pub fn apply_group_transform<T: SceneTree + ?Sized>(
    tree: &mut T,
    elements: &[NodeId],
    g: &AffineMatrix,
    options: &Options,
) -> Result<(), TransformError> {
    let mut staged = Vec::with_capacity(elements.len());
    for &id in elements {
        require(tree, id)?;
        let parent = ancestral_matrix(tree, id);
        let next = AnchorDecomposition::of(tree, id).transformed(&parent, g, options.epsilon)?;
        staged.push((id, next));
    }
    for (id, next) in staged {
        next.write(tree, id);
    }
    debug!(count = elements.len(), ?g, "applied group transform");
    Ok(())
}

/// Move the pivot of a single element by `delta` in the root frame.
///
/// The native transform is preserved; only `B` and `A` change.
pub fn relocate_anchor<T: SceneTree + ?Sized>(
    tree: &mut T,
    id: NodeId,
    delta: Offset,
    options: &Options,
) -> Result<(), TransformError> {
    require(tree, id)?;
    let parent = ancestral_matrix(tree, id);
    let next = AnchorDecomposition::of(tree, id).relocated(&parent, delta, options.epsilon)?;
    tree.set_anchor_matrices(id, next.pre, next.post);
    debug!(node = id.index(), dx = delta.dx, dy = delta.dy, "relocated anchor");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::element_to_root;
    use crate::scene::{Scene, SceneElement};
    use crate::shape::Shape;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn nested_scene() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene
            .insert(
                root,
                SceneElement::group().with_transform(
                    AffineMatrix::translation(50.0, 20.0) * AffineMatrix::rotation(0.3),
                ),
            )
            .unwrap();
        let leaf = scene
            .insert(
                group,
                SceneElement::leaf(Shape::rectangle(0.0, 0.0, 10.0, 10.0))
                    .with_transform(AffineMatrix::translation(5.0, 5.0)),
            )
            .unwrap();
        (scene, leaf)
    }

    #[test]
    fn default_decomposition() {
        let (scene, leaf) = nested_scene();
        let d = AnchorDecomposition::of(&scene, leaf);
        assert_eq!(d.pre, AffineMatrix::IDENTITY);
        assert_eq!(d.post, AffineMatrix::translation(5.0, 5.0));
    }

    #[test]
    fn stale_post_anchor_is_rederived() {
        let (mut scene, leaf) = nested_scene();
        let pre = AffineMatrix::translation(1.0, 1.0);
        scene.set_anchor_matrices(leaf, pre, AffineMatrix::IDENTITY);
        let d = AnchorDecomposition::of(&scene, leaf);
        assert_eq!(d.pre, pre);
        assert!(d.native().approx_eq(&AffineMatrix::translation(5.0, 5.0), EPS));
    }

    #[test]
    fn translate_moves_element_in_root_frame() {
        let (mut scene, leaf) = nested_scene();
        let before = element_to_root(&scene, leaf);
        let g = AffineMatrix::translation(7.0, -3.0);
        apply_group_transform(&mut scene, &[leaf], &g, &Options::default()).unwrap();
        let after = element_to_root(&scene, leaf);
        assert!(after.approx_eq(&g.multiply(&before), EPS));
    }

    #[test]
    fn group_transform_writes_both_halves() {
        let (mut scene, leaf) = nested_scene();
        let g = AffineMatrix::about(Point::new(3.0, 4.0), AffineMatrix::rotation(FRAC_PI_2));
        apply_group_transform(&mut scene, &[leaf], &g, &Options::default()).unwrap();
        let (pre, post) = scene.anchor_matrices(leaf);
        let (pre, post) = (pre.unwrap(), post.unwrap());
        assert_eq!(pre, AffineMatrix::IDENTITY);
        assert!(pre.multiply(&post).approx_eq(&scene.transform(leaf).unwrap(), EPS));
    }

    #[test]
    fn singular_element_aborts_whole_group() {
        let mut scene = Scene::new();
        let root = scene.root();
        let ok = scene.insert(root, SceneElement::group()).unwrap();
        let flat = scene
            .insert(root, SceneElement::group().with_transform(AffineMatrix::scale(0.0, 1.0)))
            .unwrap();
        let child = scene.insert(flat, SceneElement::group()).unwrap();

        let err = apply_group_transform(
            &mut scene,
            &[ok, child],
            &AffineMatrix::translation(1.0, 1.0),
            &Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::Matrix(MatrixError::Singular { .. })));
        assert_eq!(scene.transform(ok), None);
        assert_eq!(scene.anchor_matrices(ok), (None, None));
    }

    #[test]
    fn unknown_element_is_reported() {
        let mut scene = Scene::new();
        let err = relocate_anchor(&mut scene, NodeId(9), Offset::new(1.0, 1.0), &Options::default())
            .unwrap_err();
        assert_eq!(err, TransformError::UnknownElement { index: 9 });
    }

    #[test]
    fn relocation_preserves_placement_and_moves_pivot() {
        let (mut scene, leaf) = nested_scene();
        let before = element_to_root(&scene, leaf);
        let pivot_before = anchor_point(&scene, leaf);

        let delta = Offset::new(4.0, -6.0);
        relocate_anchor(&mut scene, leaf, delta, &Options::default()).unwrap();

        assert!(element_to_root(&scene, leaf).approx_eq(&before, EPS));
        assert_eq!(scene.transform(leaf), Some(AffineMatrix::translation(5.0, 5.0)));
        let pivot_after = anchor_point(&scene, leaf);
        assert!((pivot_after.x - (pivot_before.x + delta.dx)).abs() < EPS);
        assert!((pivot_after.y - (pivot_before.y + delta.dy)).abs() < EPS);
    }

    #[test]
    fn rotation_uses_relocated_pivot() {
        let (mut scene, leaf) = nested_scene();
        relocate_anchor(&mut scene, leaf, Offset::new(10.0, 10.0), &Options::default()).unwrap();
        let pivot = anchor_point(&scene, leaf);
        let before = element_to_root(&scene, leaf);

        let g = AffineMatrix::about(pivot, AffineMatrix::rotation(1.0));
        apply_group_transform(&mut scene, &[leaf], &g, &Options::default()).unwrap();

        // the pivot stays put and the element turns around it
        assert!(anchor_point(&scene, leaf).distance(pivot) < EPS);
        let moved = element_to_root(&scene, leaf);
        assert!(moved.approx_eq(&g.multiply(&before), EPS));
    }
}
