//! Per-asset node trees kept in the cache and replayed into scenes.

use std::ops::Range;

use glam::Mat4;
use tracing::warn;

use crate::descriptor::AssetInfo;
use crate::handle::Handle;
use crate::importer::{ImportedObject, ImportedScene};
use crate::mesh::MeshAsset;

pub type MeshHandle = Handle<MeshAsset>;

/// One node of an asset's cached hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTransformNode {
    /// Transform relative to the parent node
    pub transform: Mat4,
    pub meshes: Vec<MeshHandle>,
    /// Registry key of the material; `None` uses the default material
    pub material_key: Option<String>,
    pub semantic_id: Option<u32>,
    pub children: Vec<MeshTransformNode>,
}

impl MeshTransformNode {
    /// Leaf node without meshes or material.
    pub fn new(transform: Mat4) -> Self {
        Self {
            transform,
            meshes: Vec::new(),
            material_key: None,
            semantic_id: None,
            children: Vec::new(),
        }
    }

    /// Pre-order walk yielding each node with its transform composed onto
    /// `base`.
    pub fn walk(&self, base: Mat4) -> Vec<(&MeshTransformNode, Mat4)> {
        let mut out = Vec::new();
        let mut stack = vec![(self, base)];
        while let Some((node, parent)) = stack.pop() {
            let world = parent * node.transform;
            out.push((node, world));
            for child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
        out
    }

    /// Nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        self.walk(Mat4::IDENTITY).len()
    }

    /// Number of mesh references in the whole tree.
    pub fn mesh_count(&self) -> usize {
        self.walk(Mat4::IDENTITY)
            .iter()
            .map(|(node, _)| node.meshes.len())
            .sum()
    }
}

impl Drop for MeshTransformNode {
    fn drop(&mut self) {
        // Flatten so deep trees don't overflow the stack.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// What a loaded asset contributed to the shared stores.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshMetaData {
    /// Meshes this asset appended to the mesh store
    pub mesh_range: Range<usize>,
    /// Textures this asset appended to the texture store
    pub texture_range: Range<usize>,
    /// Registry keys of the materials built for this asset, in import order
    pub material_keys: Vec<String>,
    pub root: MeshTransformNode,
}

/// A cache entry: the asset's description and the data it loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAssetRecord {
    pub info: AssetInfo,
    pub meta: MeshMetaData,
}

/// Build the cached tree for an imported scene.
///
/// `mesh_base` is where the scene's meshes will land in the mesh store.
/// The root is a synthetic identity node whose children are the scene's
/// top-level objects; a scene without roots puts its first mesh on the
/// root itself. Objects reachable twice, references out of range, and
/// meshes without geometry are skipped with a warning.
pub fn load_mesh_hierarchy(
    key: &str,
    scene: &ImportedScene,
    mesh_base: usize,
    material_keys: &[String],
    fallback_material: Option<&str>,
) -> MeshTransformNode {
    let material_for = |index: Option<usize>| -> Option<String> {
        index
            .and_then(|m| material_keys.get(m).cloned())
            .or_else(|| fallback_material.map(str::to_string))
    };

    let mut root = MeshTransformNode::new(Mat4::IDENTITY);

    let Some(roots) = &scene.roots else {
        if let Some(first) = scene.meshes.first() {
            if !first.has_geometry() {
                warn!("Asset '{}': mesh '{}' has no geometry, skipped", key, first.name);
                return root;
            }
            root.meshes.push(Handle::new(mesh_base));
            root.material_key = material_for(if material_keys.is_empty() { None } else { Some(0) });
        }
        return root;
    };

    let convert = |object: &ImportedObject| -> MeshTransformNode {
        let mut node = MeshTransformNode::new(object.transform);
        for &mesh in &object.meshes {
            match scene.meshes.get(mesh) {
                Some(asset) if asset.has_geometry() => {
                    node.meshes.push(Handle::new(mesh_base + mesh))
                }
                Some(asset) => {
                    warn!("Asset '{}': mesh '{}' has no geometry, skipped", key, asset.name)
                }
                None => {
                    warn!("Asset '{}': mesh {} out of {} skipped", key, mesh, scene.meshes.len())
                }
            }
        }
        node.material_key = material_for(object.material);
        node.semantic_id = object.semantic_id;
        node
    };

    // Pre-order listing of reachable objects with the slot of their parent.
    let mut order: Vec<(usize, Option<usize>)> = Vec::new();
    let mut visited = vec![false; scene.objects.len()];
    let mut stack: Vec<(usize, Option<usize>)> = roots.iter().rev().map(|&r| (r, None)).collect();
    while let Some((object, parent)) = stack.pop() {
        let Some(imported) = scene.objects.get(object) else {
            warn!("Asset '{}': object {} out of {} skipped", key, object, scene.objects.len());
            continue;
        };
        if std::mem::replace(&mut visited[object], true) {
            warn!("Asset '{}': object {} reached twice, skipped", key, object);
            continue;
        }
        let slot = order.len();
        order.push((object, parent));
        for &child in imported.children.iter().rev() {
            stack.push((child, Some(slot)));
        }
    }

    // Assemble bottom-up: every descendant has a later slot than its parent.
    let mut nodes: Vec<Option<MeshTransformNode>> = order
        .iter()
        .map(|&(object, _)| Some(convert(&scene.objects[object])))
        .collect();
    for slot in (0..order.len()).rev() {
        let Some(mut node) = nodes[slot].take() else {
            continue;
        };
        node.children.reverse();
        match order[slot].1.and_then(|p| nodes[p].as_mut()) {
            Some(parent) => parent.children.push(node),
            None => root.children.push(node),
        }
    }
    root.children.reverse();
    root
}
