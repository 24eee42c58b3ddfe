//! Replays cached asset trees into a scene graph.

use glam::Mat4;
use tessera_core::Aabb;
use tessera_scene::{NodeId, NodeTree, SceneGraph};

use crate::drawable::{Drawable, DrawableGroup, StaticDrawableInfo};
use crate::hierarchy::MeshTransformNode;
use crate::material::MaterialRecord;
use crate::mesh::MeshAsset;
use crate::setup::{LightSetup, SetupRegistry, DEFAULT_MATERIAL_KEY};
use crate::store::Store;

/// Where an asset is attached: under `parent` in `nodes`, with drawables
/// added to `drawables` when one is given.
pub struct AttachTarget<'a> {
    pub nodes: &'a mut NodeTree,
    pub parent: NodeId,
    pub drawables: Option<&'a mut DrawableGroup>,
}

impl<'a> AttachTarget<'a> {
    /// Attach nodes only; no drawables are created.
    pub fn new(nodes: &'a mut NodeTree, parent: NodeId) -> Self {
        Self {
            nodes,
            parent,
            drawables: None,
        }
    }

    /// Attach under the root of a scene graph, drawing into its group.
    pub fn scene_root(graph: &'a mut SceneGraph<Drawable>) -> Self {
        let parent = graph.root();
        Self {
            nodes: &mut graph.nodes,
            parent,
            drawables: Some(&mut graph.drawables),
        }
    }
}

/// Shared stores the instantiator reads meshes and setups from.
pub(crate) struct Instantiator<'r> {
    pub meshes: &'r Store<MeshAsset>,
    pub materials: &'r mut SetupRegistry<MaterialRecord>,
    pub lights: &'r mut SetupRegistry<LightSetup>,
}

impl Instantiator<'_> {
    /// Create one scene node per tree node, parents first.
    ///
    /// `root_transform` is applied in front of the tree root's own
    /// transform. Every created node is appended to `visual_nodes`; each
    /// mesh placement is appended to `static_infos`. Tiled meshes get one
    /// child node and drawable per tile.
    pub fn add_component_tree(
        &mut self,
        root: &MeshTransformNode,
        root_transform: Mat4,
        target: &mut AttachTarget<'_>,
        light_key: &str,
        visual_nodes: &mut Vec<NodeId>,
        static_infos: &mut Vec<StaticDrawableInfo>,
    ) {
        let light_setup = self.lights.get(light_key);
        let mut stack = vec![(root, target.parent, root_transform)];
        while let Some((tree_node, parent, prefix)) = stack.pop() {
            let node = target.nodes.create_child(parent);
            target
                .nodes
                .set_transformation(node, prefix * tree_node.transform);
            visual_nodes.push(node);

            let material = self.materials.get(
                tree_node
                    .material_key
                    .as_deref()
                    .unwrap_or(DEFAULT_MATERIAL_KEY),
            );

            let mut mesh_bb = Aabb::EMPTY;
            for &handle in &tree_node.meshes {
                let mesh = self.meshes.resolve(handle);
                if mesh.tiles.is_empty() {
                    mesh_bb = mesh_bb.union(&mesh.local_bounds());
                    static_infos.push(StaticDrawableInfo {
                        node,
                        mesh: handle,
                        submesh: None,
                    });
                    if let Some(drawables) = target.drawables.as_deref_mut() {
                        drawables.add(Drawable {
                            node,
                            mesh: mesh.clone(),
                            mesh_handle: Some(handle),
                            submesh: None,
                            material: material.clone(),
                            light_setup: light_setup.clone(),
                        });
                    }
                    continue;
                }

                for (i, tile) in mesh.tiles.iter().enumerate() {
                    let tile_node = target.nodes.create_child(node);
                    if let Some(scene_node) = target.nodes.get_mut(tile_node) {
                        scene_node.mesh_bb = tile.bounds;
                    }
                    visual_nodes.push(tile_node);
                    static_infos.push(StaticDrawableInfo {
                        node: tile_node,
                        mesh: handle,
                        submesh: Some(i),
                    });
                    if let Some(drawables) = target.drawables.as_deref_mut() {
                        drawables.add(Drawable {
                            node: tile_node,
                            mesh: mesh.clone(),
                            mesh_handle: Some(handle),
                            submesh: Some(i),
                            material: material.clone(),
                            light_setup: light_setup.clone(),
                        });
                    }
                }
            }

            if let Some(scene_node) = target.nodes.get_mut(node) {
                scene_node.mesh_bb = mesh_bb;
                scene_node.semantic_id = tree_node.semantic_id.unwrap_or(0);
            }

            for child in tree_node.children.iter().rev() {
                stack.push((child, node, Mat4::IDENTITY));
            }
        }
    }
}
