use std::collections::HashMap;
use std::fmt;

use glam::Mat4;
use tessera_core::{Aabb, Transform};
use tracing::warn;

use crate::group::DrawableGroup;

/// Handle of a node in a [`NodeTree`].
///
/// Slots are recycled after [`NodeTree::remove_subtree`]; the generation
/// makes a handle to a removed node stay dead after its slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    slot: u32,
    generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}v{})", self.slot, self.generation)
    }
}

/// A single node of the scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Local transform relative to the parent node
    pub transformation: Mat4,
    /// Semantic object id, 0 when unannotated
    pub semantic_id: u32,
    /// Bounds of the meshes attached directly to this node, in local space
    pub mesh_bb: Aabb,
    /// World-space bounds, filled in when absolute AABBs are computed
    pub absolute_aabb: Option<Aabb>,
}

impl SceneNode {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            transformation: Mat4::IDENTITY,
            semantic_id: 0,
            mesh_bb: Aabb::EMPTY,
            absolute_aabb: None,
        }
    }

    /// Parent node; `None` only for the tree root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in creation order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// Arena-backed node hierarchy with a single permanent root.
pub struct NodeTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    alive: usize,
    root: NodeId,
}

impl NodeTree {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(SceneNode::new(None)),
            }],
            free: Vec::new(),
            alive: 1,
            root: NodeId {
                slot: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of alive nodes, root included.
    pub fn len(&self) -> usize {
        self.alive
    }

    /// Always `false`: the root cannot be removed.
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Whether `id` still names a node of this tree.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Node data, `None` if `id` was removed.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        let slot = self.slots.get(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Mutable node data, `None` if `id` was removed.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let slot = self.slots.get_mut(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Create a new child of `parent` with an identity transform.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not alive. Callers holding handles that may
    /// have been removed check [`NodeTree::is_alive`] first.
    pub fn create_child(&mut self, parent: NodeId) -> NodeId {
        assert!(
            self.is_alive(parent),
            "cannot create child of dead node {parent:?}"
        );
        let node = Some(SceneNode::new(Some(parent)));
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = node;
                NodeId {
                    slot: index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node,
                });
                NodeId {
                    slot: self.slots.len() as u32 - 1,
                    generation: 0,
                }
            }
        };
        self.alive += 1;
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Local transformation of a node, `None` if it is dead.
    pub fn transformation(&self, id: NodeId) -> Option<Mat4> {
        self.get(id).map(|n| n.transformation)
    }

    /// Set the local transformation. Returns `false` for a dead node.
    pub fn set_transformation(&mut self, id: NodeId, transformation: Mat4) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.transformation = transformation;
                true
            }
            None => false,
        }
    }

    /// Set the local transformation from a decomposed transform.
    pub fn set_transform(&mut self, id: NodeId, transform: &Transform) -> bool {
        self.set_transformation(id, transform.matrix())
    }

    /// Compose local transforms from the root down: `parent_world * local`.
    pub fn absolute_transformation(&self, id: NodeId) -> Option<Mat4> {
        let node = self.get(id)?;
        let mut world = node.transformation;
        let mut cursor = node.parent;
        while let Some(parent_id) = cursor {
            let parent = self.get(parent_id)?;
            world = parent.transformation * world;
            cursor = parent.parent;
        }
        Some(world)
    }

    /// All nodes of the subtree rooted at `id`, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.get(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Remove `id` and all of its descendants. The root cannot be removed.
    /// Returns the number of nodes removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        if id == self.root {
            warn!("Refusing to remove the scene root");
            return 0;
        }
        let Some(parent) = self.get(id).map(|n| n.parent) else {
            return 0;
        };
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }
        let doomed = self.subtree(id);
        for node in &doomed {
            let slot = &mut self.slots[node.slot as usize];
            slot.node = None;
            slot.generation += 1;
            self.free.push(node.slot);
        }
        self.alive -= doomed.len();
        doomed.len()
    }

    /// Bounds of everything under `id`, expressed in `id`'s local frame.
    pub fn cumulative_bb(&self, id: NodeId) -> Aabb {
        let order = self.subtree(id);
        let mut bounds: HashMap<NodeId, Aabb> = HashMap::with_capacity(order.len());
        // children appear after their parents, so walking backwards sees them first
        for current in order.iter().rev() {
            let Some(node) = self.get(*current) else {
                continue;
            };
            let mut bb = node.mesh_bb;
            for child in &node.children {
                if let (Some(child_bb), Some(child_node)) = (bounds.get(child), self.get(*child)) {
                    bb = bb.union(&child_bb.transformed(&child_node.transformation));
                }
            }
            bounds.insert(*current, bb);
        }
        bounds.remove(&id).unwrap_or(Aabb::EMPTY)
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A node tree paired with the drawables that render it.
pub struct SceneGraph<D> {
    pub nodes: NodeTree,
    pub drawables: DrawableGroup<D>,
}

impl<D> SceneGraph<D> {
    pub fn new() -> Self {
        Self {
            nodes: NodeTree::new(),
            drawables: DrawableGroup::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.nodes.root()
    }
}

impl<D> Default for SceneGraph<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_new_tree_has_root_only() {
        let tree = NodeTree::new();
        assert_eq!(tree.len(), 1);
        assert!(tree.get(tree.root()).unwrap().parent().is_none());
    }

    #[test]
    fn test_absolute_transformation_composes_parent_first() {
        let mut tree = NodeTree::new();
        let a = tree.create_child(tree.root());
        let b = tree.create_child(a);
        tree.set_transformation(a, Mat4::from_translation(Vec3::X));
        tree.set_transformation(b, Mat4::from_scale(Vec3::splat(2.0)));

        let world = tree.absolute_transformation(b).unwrap();
        // scale first, then translate
        assert_eq!(world.transform_point3(Vec3::ONE), Vec3::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn test_remove_subtree_detaches_and_invalidates() {
        let mut tree = NodeTree::new();
        let a = tree.create_child(tree.root());
        let b = tree.create_child(a);
        let c = tree.create_child(tree.root());

        assert_eq!(tree.remove_subtree(a), 2);
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(b));
        assert_eq!(tree.get(tree.root()).unwrap().children(), &[c]);
        assert_eq!(tree.len(), 2);

        // freed slots are reused with a new generation
        let d = tree.create_child(c);
        assert!(tree.is_alive(d));
        assert_ne!(d, a);
        assert_ne!(d, b);
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        assert_eq!(tree.remove_subtree(root), 0);
        assert!(tree.is_alive(root));
    }

    #[test]
    fn test_stale_handle_stays_dead_after_slot_reuse() {
        let mut tree = NodeTree::new();
        let a = tree.create_child(tree.root());
        tree.get_mut(a).unwrap().semantic_id = 4;
        tree.remove_subtree(a);

        let reused = tree.create_child(tree.root());
        assert_eq!(format!("{reused:?}"), "Node(1v1)");
        assert!(tree.get(a).is_none());
        assert!(!tree.set_transformation(a, Mat4::IDENTITY));
        assert_eq!(tree.get(reused).unwrap().semantic_id, 0);
    }

    #[test]
    #[should_panic(expected = "cannot create child of dead node")]
    fn test_create_child_of_removed_node_panics() {
        let mut tree = NodeTree::new();
        let a = tree.create_child(tree.root());
        tree.remove_subtree(a);
        tree.create_child(a);
    }

    #[test]
    fn test_cumulative_bb_includes_children() {
        let mut tree = NodeTree::new();
        let child = tree.create_child(tree.root());
        tree.set_transformation(child, Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        tree.get_mut(child).unwrap().mesh_bb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));

        let bb = tree.cumulative_bb(tree.root());
        assert_eq!(bb.min, Vec3::new(4.0, -1.0, -1.0));
        assert_eq!(bb.max, Vec3::new(6.0, 1.0, 1.0));
    }
}
