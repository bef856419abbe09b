//! Gesture session over a scene tree.
//!
//! A [`Manipulator`] owns the selection, the traversal root whose direct
//! children are selectable, and at most one active drag. Between `begin` and
//! `finish` every `update` recomputes from the state captured at `begin`, so
//! previews never compound. Only `finish` writes anchor matrices.

use crate::anchor::{AnchorDecomposition, apply_group_transform};
use crate::errors::TransformError;
use crate::frame::ancestral_matrix;
use crate::gesture::{DragGesture, DragMode, resolve_drag_matrix_with};
use crate::log::debug;
use crate::matrix::AffineMatrix;
use crate::options::Options;
use crate::scene::{NodeId, SceneTree};
use crate::selection::{PickModifiers, Selection, relocate_selection_anchor};
use crate::types::{Point, Rect};

/// What a finished gesture did
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureOutcome {
    /// No drag was active, or it had nothing to act on
    Nothing,
    /// Every selected element received `matrix` (root frame)
    Transformed { matrix: AffineMatrix },
    /// The pivot now sits at `pivot` (root frame)
    AnchorMoved { pivot: Point },
    /// The swept rectangle, for the caller to hit-test
    RubberBand(Rect),
}

#[derive(Clone, Debug)]
struct ElementSnapshot {
    id: NodeId,
    transform: Option<AffineMatrix>,
    decomposition: AnchorDecomposition,
}

#[derive(Clone, Debug)]
struct ActiveDrag {
    gesture: DragGesture,
    pivot: Point,
    snapshot: Vec<ElementSnapshot>,
}

/// Selection plus the drag in progress
#[derive(Clone, Debug)]
pub struct Manipulator {
    root: NodeId,
    selection: Selection,
    options: Options,
    drag: Option<ActiveDrag>,
}

impl Manipulator {
    pub fn new(root: NodeId) -> Self {
        Manipulator {
            root,
            selection: Selection::new(),
            options: Options::default(),
            drag: None,
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The drag in progress, if any
    pub fn gesture(&self) -> Option<&DragGesture> {
        self.drag.as_ref().map(|d| &d.gesture)
    }

    /// Descend into (or out of) a group. Clears the selection and cancels
    /// any drag.
    pub fn set_root<T: SceneTree + ?Sized>(&mut self, tree: &mut T, root: NodeId) {
        self.cancel(tree);
        self.selection.clear();
        self.root = root;
    }

    /// Direct children of the traversal root are selectable
    pub fn selectable<T: SceneTree + ?Sized>(&self, tree: &T, id: NodeId) -> bool {
        tree.contains(id) && tree.parent(id) == Some(self.root)
    }

    /// Click on `id`. Returns whether a drag may start from the click;
    /// elements outside the traversal root are ignored.
    pub fn pick<T: SceneTree + ?Sized>(&mut self, tree: &T, id: NodeId, modifiers: PickModifiers) -> bool {
        if !self.selectable(tree, id) {
            return false;
        }
        self.selection.pick(id, modifiers)
    }

    /// Start a drag at `start` (root frame).
    ///
    /// A drag already in progress is cancelled first. Transform modes with
    /// an empty selection start nothing, and so do rotate and scale when
    /// the selection has no bounds to pivot about. Rotate and scale fail
    /// when `start` is the pivot, leaving the scene untouched.
    pub fn begin<T: SceneTree + ?Sized>(
        &mut self,
        tree: &mut T,
        mode: DragMode,
        start: Point,
    ) -> Result<(), TransformError> {
        self.cancel(tree);
        self.selection.prune(&*tree);

        let gesture = DragGesture::new(mode, start);
        match mode {
            DragMode::Inactive => return Ok(()),
            DragMode::RubberBand => {
                self.drag = Some(ActiveDrag { gesture, pivot: start, snapshot: Vec::new() });
                return Ok(());
            }
            _ => {}
        }

        if self.selection.is_empty() {
            return Ok(());
        }
        let pivot = match self.selection.pivot(&*tree)? {
            Some(pivot) => pivot,
            None if mode.is_pivoted() => {
                debug!(?mode, "selection has no pivot");
                return Ok(());
            }
            // translate and move-anchor do not depend on the pivot
            None => start,
        };
        if mode.is_pivoted() {
            resolve_drag_matrix_with(&self.options, mode, pivot, start, start)?;
        }

        let snapshot = self
            .selection
            .items()
            .iter()
            .map(|&id| ElementSnapshot {
                id,
                transform: tree.transform(id),
                decomposition: AnchorDecomposition::of(&*tree, id),
            })
            .collect();
        debug!(?mode, ?pivot, "begin drag");
        self.drag = Some(ActiveDrag { gesture, pivot, snapshot });
        Ok(())
    }

    /// Move the drag to `current` and preview it.
    ///
    /// Only native transforms are written, each recomputed from the state
    /// captured at `begin`. A move-anchor drag writes nothing. If the
    /// preview cannot be computed the drag is cancelled, every element is
    /// restored and the error returned.
    pub fn update<T: SceneTree + ?Sized>(&mut self, tree: &mut T, current: Point) -> Result<(), TransformError> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(());
        };
        drag.gesture.current = current;
        match drag.gesture.mode {
            DragMode::Translate | DragMode::Rotate | DragMode::Scale => {}
            _ => return Ok(()),
        }

        match preview(&*tree, drag, &self.options) {
            Ok(staged) => {
                for (id, native) in staged {
                    tree.set_transform(id, Some(native));
                }
                Ok(())
            }
            Err(err) => {
                self.cancel(tree);
                Err(err)
            }
        }
    }

    /// End the drag and commit it once.
    ///
    /// On error every element is back at its state from `begin`.
    pub fn finish<T: SceneTree + ?Sized>(&mut self, tree: &mut T) -> Result<GestureOutcome, TransformError> {
        let Some(drag) = self.drag.take() else {
            return Ok(GestureOutcome::Nothing);
        };
        let gesture = drag.gesture;
        match gesture.mode {
            DragMode::Inactive => Ok(GestureOutcome::Nothing),
            DragMode::RubberBand => Ok(GestureOutcome::RubberBand(gesture.band())),
            DragMode::MoveAnchor => {
                let delta = gesture.delta();
                relocate_selection_anchor(tree, &mut self.selection, delta, &self.options)?;
                Ok(GestureOutcome::AnchorMoved { pivot: drag.pivot + delta })
            }
            DragMode::Translate | DragMode::Rotate | DragMode::Scale => {
                restore(tree, &drag.snapshot);
                let g = gesture.matrix(drag.pivot, &self.options)?;
                let ids: Vec<NodeId> = drag.snapshot.iter().map(|s| s.id).collect();
                apply_group_transform(tree, &ids, &g, &self.options)?;
                self.selection.map_cached_pivot(&g);
                Ok(GestureOutcome::Transformed { matrix: g })
            }
        }
    }

    /// Drop the drag and put every element back
    pub fn cancel<T: SceneTree + ?Sized>(&mut self, tree: &mut T) {
        if let Some(drag) = self.drag.take() {
            restore(tree, &drag.snapshot);
            debug!(mode = ?drag.gesture.mode, "cancelled drag");
        }
    }

    /// Where the pivot is drawn right now: follows an active translate or
    /// move-anchor drag, otherwise the selection's pivot.
    pub fn preview_pivot<T: SceneTree + ?Sized>(&mut self, tree: &T) -> Result<Option<Point>, TransformError> {
        match &self.drag {
            Some(drag) => Ok(Some(match drag.gesture.mode {
                DragMode::Translate | DragMode::MoveAnchor => drag.pivot + drag.gesture.delta(),
                DragMode::RubberBand => return Ok(self.selection.pivot(tree)?),
                _ => drag.pivot,
            })),
            None => Ok(self.selection.pivot(tree)?),
        }
    }
}

/// Native transforms for the current preview, computed from the snapshot
fn preview<T: SceneTree + ?Sized>(
    tree: &T,
    drag: &ActiveDrag,
    options: &Options,
) -> Result<Vec<(NodeId, AffineMatrix)>, TransformError> {
    let g = drag.gesture.matrix(drag.pivot, options)?;
    drag.snapshot
        .iter()
        .map(|s| {
            let parent = ancestral_matrix(tree, s.id);
            let next = s.decomposition.transformed(&parent, &g, options.epsilon)?;
            Ok((s.id, next.native()))
        })
        .collect()
}

fn restore<T: SceneTree + ?Sized>(tree: &mut T, snapshot: &[ElementSnapshot]) {
    for s in snapshot {
        tree.set_transform(s.id, s.transform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::anchor_point;
    use crate::bounds::compute_bounding_box;
    use crate::errors::GestureError;
    use crate::scene::{Scene, SceneElement};
    use crate::shape::Shape;

    const EPS: f64 = 1e-9;

    fn scene_with_boxes() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene
            .insert(root, SceneElement::leaf(Shape::rectangle(0.0, 0.0, 10.0, 10.0)))
            .unwrap();
        let b = scene
            .insert(root, SceneElement::leaf(Shape::rectangle(20.0, 0.0, 10.0, 10.0)))
            .unwrap();
        (scene, a, b)
    }

    #[test]
    fn preview_is_idempotent() {
        let (mut scene, a, _) = scene_with_boxes();
        let mut m = Manipulator::new(scene.root());
        assert!(m.pick(&scene, a, PickModifiers::NONE));

        m.begin(&mut scene, DragMode::Translate, Point::new(1.0, 1.0)).unwrap();
        m.update(&mut scene, Point::new(3.0, 1.0)).unwrap();
        m.update(&mut scene, Point::new(6.0, 1.0)).unwrap();
        m.update(&mut scene, Point::new(6.0, 1.0)).unwrap();
        assert_eq!(scene.transform(a), Some(AffineMatrix::translation(5.0, 0.0)));
        assert_eq!(scene.anchor_matrices(a), (None, None));

        let outcome = m.finish(&mut scene).unwrap();
        assert_eq!(outcome, GestureOutcome::Transformed { matrix: AffineMatrix::translation(5.0, 0.0) });
        assert_eq!(scene.transform(a), Some(AffineMatrix::translation(5.0, 0.0)));
        assert!(scene.anchor_matrices(a).1.is_some());
    }

    #[test]
    fn cancel_restores_snapshot() {
        let (mut scene, a, b) = scene_with_boxes();
        let mut m = Manipulator::new(scene.root());
        m.pick(&scene, a, PickModifiers::NONE);
        m.pick(&scene, b, PickModifiers::SHIFT);

        m.begin(&mut scene, DragMode::Rotate, Point::new(30.0, 5.0)).unwrap();
        m.update(&mut scene, Point::new(15.0, 20.0)).unwrap();
        assert!(scene.transform(a).is_some());
        m.cancel(&mut scene);
        assert_eq!(scene.transform(a), None);
        assert_eq!(scene.transform(b), None);
        assert!(m.gesture().is_none());
    }

    #[test]
    fn rotate_from_pivot_is_rejected() {
        let (mut scene, a, b) = scene_with_boxes();
        let mut m = Manipulator::new(scene.root());
        m.selection_mut().replace_with([a, b]);
        let pivot = m.preview_pivot(&scene).unwrap().unwrap();
        assert_eq!(pivot, Point::new(15.0, 5.0));

        let err = m.begin(&mut scene, DragMode::Rotate, pivot).unwrap_err();
        assert_eq!(err, TransformError::Gesture(GestureError::Degenerate { mode: DragMode::Rotate }));
        assert!(m.gesture().is_none());
        assert_eq!(m.finish(&mut scene).unwrap(), GestureOutcome::Nothing);
        assert_eq!(scene.transform(a), None);
    }

    #[test]
    fn update_through_pivot_cancels_drag() {
        let (mut scene, a, _) = scene_with_boxes();
        let mut m = Manipulator::new(scene.root());
        m.pick(&scene, a, PickModifiers::NONE);
        // single element: the pivot is its anchor at the origin
        m.begin(&mut scene, DragMode::Rotate, Point::new(10.0, 0.0)).unwrap();
        m.update(&mut scene, Point::new(0.0, 10.0)).unwrap();
        assert!(scene.transform(a).is_some());

        let err = m.update(&mut scene, Point::ORIGIN).unwrap_err();
        assert_eq!(err, TransformError::Gesture(GestureError::Degenerate { mode: DragMode::Rotate }));
        assert_eq!(scene.transform(a), None);
        assert!(m.gesture().is_none());

        // later moves and the release do nothing
        m.update(&mut scene, Point::new(0.0, 10.0)).unwrap();
        assert_eq!(m.finish(&mut scene).unwrap(), GestureOutcome::Nothing);
        assert_eq!(scene.transform(a), None);
        assert_eq!(scene.anchor_matrices(a), (None, None));
    }

    #[test]
    fn translate_needs_no_pivot() {
        let mut scene = Scene::new();
        let root = scene.root();
        let empty = scene.insert(root, SceneElement::group()).unwrap();
        let unmeasured = scene.insert(root, SceneElement::leaf(Shape::opaque())).unwrap();
        let mut m = Manipulator::new(root);
        m.selection_mut().replace_with([empty, unmeasured]);
        assert_eq!(m.preview_pivot(&scene).unwrap(), None);

        // no bounds to turn about
        m.begin(&mut scene, DragMode::Rotate, Point::new(1.0, 0.0)).unwrap();
        assert!(m.gesture().is_none());

        m.begin(&mut scene, DragMode::Translate, Point::ORIGIN).unwrap();
        assert!(m.gesture().is_some());
        m.update(&mut scene, Point::new(5.0, 5.0)).unwrap();
        assert_eq!(scene.transform(empty), Some(AffineMatrix::translation(5.0, 5.0)));

        let outcome = m.finish(&mut scene).unwrap();
        assert_eq!(outcome, GestureOutcome::Transformed { matrix: AffineMatrix::translation(5.0, 5.0) });
        assert_eq!(scene.transform(empty), Some(AffineMatrix::translation(5.0, 5.0)));
        assert_eq!(scene.transform(unmeasured), Some(AffineMatrix::translation(5.0, 5.0)));
    }

    #[test]
    fn move_anchor_stages_until_finish() {
        let (mut scene, a, _) = scene_with_boxes();
        let mut m = Manipulator::new(scene.root());
        m.pick(&scene, a, PickModifiers::NONE);

        m.begin(&mut scene, DragMode::MoveAnchor, Point::ORIGIN).unwrap();
        m.update(&mut scene, Point::new(5.0, 5.0)).unwrap();
        assert_eq!(scene.anchor_matrices(a), (None, None));
        assert_eq!(m.preview_pivot(&scene).unwrap(), Some(Point::new(5.0, 5.0)));

        let outcome = m.finish(&mut scene).unwrap();
        assert_eq!(outcome, GestureOutcome::AnchorMoved { pivot: Point::new(5.0, 5.0) });
        assert_eq!(anchor_point(&scene, a), Point::new(5.0, 5.0));
        assert_eq!(scene.transform(a), None);
    }

    #[test]
    fn group_translate_carries_shared_pivot() {
        let (mut scene, a, b) = scene_with_boxes();
        let mut m = Manipulator::new(scene.root());
        m.selection_mut().replace_with([a, b]);

        m.begin(&mut scene, DragMode::Translate, Point::ORIGIN).unwrap();
        m.update(&mut scene, Point::new(2.0, 3.0)).unwrap();
        assert_eq!(m.preview_pivot(&scene).unwrap(), Some(Point::new(17.0, 8.0)));
        m.finish(&mut scene).unwrap();

        assert_eq!(m.selection().cached_pivot(), Some(Point::new(17.0, 8.0)));
        let rect = compute_bounding_box(&scene, &[a, b]).unwrap();
        assert_eq!(rect, Rect { left: 2.0, top: 3.0, right: 32.0, bottom: 13.0 });
    }

    #[test]
    fn rubber_band_reports_swept_rect() {
        let (mut scene, _, _) = scene_with_boxes();
        let mut m = Manipulator::new(scene.root());
        m.begin(&mut scene, DragMode::RubberBand, Point::new(8.0, 8.0)).unwrap();
        m.update(&mut scene, Point::new(-2.0, 12.0)).unwrap();
        assert_eq!(
            m.finish(&mut scene).unwrap(),
            GestureOutcome::RubberBand(Rect { left: -2.0, top: 8.0, right: 8.0, bottom: 12.0 })
        );
    }

    #[test]
    fn only_children_of_root_are_selectable() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.insert(root, SceneElement::group()).unwrap();
        let inner = scene
            .insert(group, SceneElement::leaf(Shape::circle(0.0, 0.0, 1.0)))
            .unwrap();

        let mut m = Manipulator::new(root);
        assert!(!m.pick(&scene, inner, PickModifiers::NONE));
        assert!(m.pick(&scene, group, PickModifiers::NONE));

        m.set_root(&mut scene, group);
        assert!(m.selection().is_empty());
        assert!(m.pick(&scene, inner, PickModifiers::NONE));
    }

    #[test]
    fn relocated_single_anchor_drives_rotation() {
        let (mut scene, a, _) = scene_with_boxes();
        let mut m = Manipulator::new(scene.root());
        m.pick(&scene, a, PickModifiers::NONE);
        m.begin(&mut scene, DragMode::MoveAnchor, Point::ORIGIN).unwrap();
        m.update(&mut scene, Point::new(5.0, 5.0)).unwrap();
        m.finish(&mut scene).unwrap();

        m.begin(&mut scene, DragMode::Rotate, Point::new(10.0, 5.0)).unwrap();
        m.update(&mut scene, Point::new(5.0, 10.0)).unwrap();
        m.finish(&mut scene).unwrap();

        // a quarter turn about the box centre maps the box onto itself
        let rect = compute_bounding_box(&scene, &[a]).unwrap();
        assert!((rect.left - 0.0).abs() < EPS && (rect.right - 10.0).abs() < EPS, "{rect:?}");
        assert!((rect.top - 0.0).abs() < EPS && (rect.bottom - 10.0).abs() < EPS, "{rect:?}");
        assert!(anchor_point(&scene, a).distance(Point::new(5.0, 5.0)) < EPS);
    }
}
