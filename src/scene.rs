//! Scene tree access.
//!
//! The core never owns the document. It reaches the tree through
//! [`SceneTree`], a small capability trait: parent and children links,
//! the native transform, the two persisted anchor matrices, the leaf
//! shape, and the platform's bounds for foreign content.
//!
//! [`Scene`] is an arena implementation with index-based links, used by
//! tests and by hosts that have no tree of their own.

use crate::matrix::AffineMatrix;
use crate::shape::Shape;
use crate::types::Rect;

/// Handle of a node in a scene tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tree-walk capability the transform engine consumes
pub trait SceneTree {
    /// Whether `id` names a live node
    fn contains(&self, id: NodeId) -> bool;

    /// Parent link; `None` for the scene root
    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Ordered children
    fn children(&self, id: NodeId) -> &[NodeId];

    /// Native (local-to-parent) transform; `None` means identity
    fn transform(&self, id: NodeId) -> Option<AffineMatrix>;

    fn set_transform(&mut self, id: NodeId, transform: Option<AffineMatrix>);

    /// Persisted `(pre-anchor, post-anchor)` matrices
    fn anchor_matrices(&self, id: NodeId) -> (Option<AffineMatrix>, Option<AffineMatrix>);

    fn set_anchor_matrices(&mut self, id: NodeId, pre: AffineMatrix, post: AffineMatrix);

    /// Leaf geometry; containers and empty groups have none
    fn shape(&self, id: NodeId) -> Option<&Shape>;

    /// Root-frame rectangle reported by the platform for foreign content
    fn platform_bounds(&self, id: NodeId) -> Option<Rect>;
}

/// A node in the arena
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneElement {
    pub transform: Option<AffineMatrix>,
    pub pre_anchor: Option<AffineMatrix>,
    pub post_anchor: Option<AffineMatrix>,
    pub shape: Option<Shape>,
    /// What the platform measured for `Opaque` content, in the root frame
    pub platform_bounds: Option<Rect>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneElement {
    /// An empty group
    pub fn group() -> Self {
        Self::default()
    }

    /// A leaf holding `shape`
    pub fn leaf(shape: impl Into<Shape>) -> Self {
        Self {
            shape: Some(shape.into()),
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: AffineMatrix) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_anchor(mut self, pre: AffineMatrix, post: AffineMatrix) -> Self {
        self.pre_anchor = Some(pre);
        self.post_anchor = Some(post);
        self
    }

    pub fn with_platform_bounds(mut self, bounds: Rect) -> Self {
        self.platform_bounds = Some(bounds);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed scene tree. Slot 0 is the root; removed slots stay empty.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Option<SceneElement>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Scene { nodes: vec![Some(SceneElement::group())] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneElement> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneElement> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Append `element` as the last child of `parent`.
    ///
    /// Returns `None` if `parent` is not a live node.
    pub fn insert(&mut self, parent: NodeId, mut element: SceneElement) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let id = NodeId(self.nodes.len());
        element.parent = Some(parent);
        element.children.clear();
        self.nodes.push(Some(element));
        self.get_mut(parent)?.children.push(id);
        Some(id)
    }

    /// Remove a node and its whole subtree; the root cannot be removed
    pub fn remove(&mut self, id: NodeId) -> Option<SceneElement> {
        if id == self.root() {
            return None;
        }
        let element = self.nodes.get_mut(id.0)?.take()?;
        if let Some(parent) = element.parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|&c| c != id);
        }
        let mut pending = element.children.clone();
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.get_mut(child.0).and_then(Option::take) {
                pending.extend(removed.children);
            }
        }
        Some(element)
    }

    /// Live node count, root included
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SceneTree for Scene {
    fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn transform(&self, id: NodeId) -> Option<AffineMatrix> {
        self.get(id).and_then(|n| n.transform)
    }

    fn set_transform(&mut self, id: NodeId, transform: Option<AffineMatrix>) {
        if let Some(node) = self.get_mut(id) {
            node.transform = transform;
        }
    }

    fn anchor_matrices(&self, id: NodeId) -> (Option<AffineMatrix>, Option<AffineMatrix>) {
        self.get(id)
            .map(|n| (n.pre_anchor, n.post_anchor))
            .unwrap_or((None, None))
    }

    fn set_anchor_matrices(&mut self, id: NodeId, pre: AffineMatrix, post: AffineMatrix) {
        if let Some(node) = self.get_mut(id) {
            node.pre_anchor = Some(pre);
            node.post_anchor = Some(post);
        }
    }

    fn shape(&self, id: NodeId) -> Option<&Shape> {
        self.get(id).and_then(|n| n.shape.as_ref())
    }

    fn platform_bounds(&self, id: NodeId) -> Option<Rect> {
        self.get(id).and_then(|n| n.platform_bounds)
    }
}
