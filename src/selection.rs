//! The current selection and its shared pivot.
//!
//! A single selected element pivots about its own anchor. Several elements
//! share the centre of their combined bounds, computed lazily on first use
//! and then reused until membership changes.

use crate::anchor::{anchor_point, relocate_anchor};
use crate::bounds::compute_bounding_box;
use crate::errors::{MatrixError, TransformError};
use crate::log::debug;
use crate::matrix::AffineMatrix;
use crate::options::Options;
use crate::scene::{NodeId, SceneTree};
use crate::types::{Offset, Point};

/// Modifier keys held during a pick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PickModifiers {
    /// Toggle membership instead of replacing the selection
    pub shift: bool,
    /// Leave the selection as it is and drag whatever is selected
    pub alt: bool,
}

impl PickModifiers {
    pub const NONE: PickModifiers = PickModifiers { shift: false, alt: false };
    pub const SHIFT: PickModifiers = PickModifiers { shift: true, alt: false };
    pub const ALT: PickModifiers = PickModifiers { shift: false, alt: true };
}

/// Ordered set of selected elements
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    items: Vec<NodeId>,
    key: Option<NodeId>,
    cached_pivot: Option<Point>,
    revision: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.items.contains(&id)
    }

    /// The element last clicked again while already selected. Reset by
    /// every replacement of the selection.
    pub fn key_element(&self) -> Option<NodeId> {
        self.key
    }

    /// Bumped on every membership change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.cached_pivot = None;
    }

    pub fn select_only(&mut self, id: NodeId) {
        if self.items == [id] {
            return;
        }
        self.items.clear();
        self.items.push(id);
        self.key = None;
        self.changed();
    }

    /// Replace the selection, dropping duplicates while keeping order
    pub fn replace_with(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        let mut items = Vec::new();
        for id in ids {
            if !items.contains(&id) {
                items.push(id);
            }
        }
        if items == self.items {
            return;
        }
        self.key = None;
        self.items = items;
        self.changed();
    }

    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.key = None;
        self.changed();
    }

    /// Add or remove `id`; returns whether it is selected afterwards
    pub fn toggle(&mut self, id: NodeId) -> bool {
        let selected = if let Some(pos) = self.items.iter().position(|&i| i == id) {
            self.items.remove(pos);
            if self.key == Some(id) {
                self.key = None;
            }
            false
        } else {
            self.items.push(id);
            true
        };
        self.changed();
        selected
    }

    /// Make an already selected element the key element
    pub fn set_key(&mut self, id: NodeId) -> bool {
        if self.contains(id) {
            self.key = Some(id);
            true
        } else {
            false
        }
    }

    /// Apply a click on `id`; returns whether a drag may start from it.
    ///
    /// An alt click always may, dragging the selection unchanged. Otherwise
    /// a drag starts when `id` is selected afterwards.
    pub fn pick(&mut self, id: NodeId, modifiers: PickModifiers) -> bool {
        if modifiers.alt {
            return true;
        }
        if modifiers.shift {
            return self.toggle(id);
        }
        if !self.set_key(id) {
            self.select_only(id);
        }
        true
    }

    /// Drop elements that no longer exist in `tree`
    pub fn prune<T: SceneTree + ?Sized>(&mut self, tree: &T) {
        let before = self.items.len();
        self.items.retain(|&id| tree.contains(id));
        if self.items.len() != before {
            if self.key.is_some_and(|k| !tree.contains(k)) {
                self.key = None;
            }
            self.changed();
        }
    }

    /// Pivot for the next gesture, in the root frame.
    ///
    /// `None` for an empty selection. A single element uses its own anchor;
    /// several elements use the cached centre of their bounds, which is
    /// computed here if nothing is cached.
    pub fn pivot<T: SceneTree + ?Sized>(&mut self, tree: &T) -> Result<Option<Point>, MatrixError> {
        match self.items.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(anchor_point(tree, *only))),
            items => {
                if let Some(pivot) = self.cached_pivot {
                    return Ok(Some(pivot));
                }
                let center = compute_bounding_box(tree, items)?.center();
                self.cached_pivot = center;
                Ok(center)
            }
        }
    }

    /// The cached shared pivot, if one has been computed
    pub fn cached_pivot(&self) -> Option<Point> {
        self.cached_pivot
    }

    /// Carry the cached pivot along with a transform applied to every element
    pub fn map_cached_pivot(&mut self, m: &AffineMatrix) {
        self.cached_pivot = self.cached_pivot.map(|p| m.transform_point(p));
    }

    /// Move the shared pivot without touching any element.
    ///
    /// Computes it first if needed. A no-op for fewer than two elements.
    pub fn move_cached_pivot<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
        delta: Offset,
    ) -> Result<(), MatrixError> {
        if self.items.len() < 2 {
            return Ok(());
        }
        if let Some(pivot) = self.pivot(tree)? {
            self.cached_pivot = Some(pivot + delta);
        }
        Ok(())
    }
}

/// Move the pivot of the selection by `delta` in the root frame.
///
/// One element has its own anchor matrices rewritten. Several elements only
/// move the shared cached pivot; their matrices change on the next group
/// transform.
pub fn relocate_selection_anchor<T: SceneTree + ?Sized>(
    tree: &mut T,
    selection: &mut Selection,
    delta: Offset,
    options: &Options,
) -> Result<(), TransformError> {
    match *selection.items() {
        [] => Ok(()),
        [only] => relocate_anchor(tree, only, delta, options),
        _ => {
            selection.move_cached_pivot(&*tree, delta)?;
            debug!(dx = delta.dx, dy = delta.dy, "moved shared pivot");
            Ok(())
        }
    }
}
