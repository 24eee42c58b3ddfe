use std::sync::Arc;

use tessera_scene::NodeId;

use crate::hierarchy::MeshHandle;
use crate::material::MaterialRecord;
use crate::mesh::MeshAsset;
use crate::setup::{LightSetup, SetupRef};

pub type DrawableGroup = tessera_scene::DrawableGroup<Drawable>;

/// A renderable instance: a mesh attached to a scene node, shaded with a
/// shared material and light setup.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub node: NodeId,
    pub mesh: Arc<MeshAsset>,
    /// Store handle of the mesh; `None` for primitive and navmesh meshes
    pub mesh_handle: Option<MeshHandle>,
    /// Tile of a tiled mesh this drawable renders
    pub submesh: Option<usize>,
    pub material: SetupRef<MaterialRecord>,
    pub light_setup: SetupRef<LightSetup>,
}

impl Drawable {
    /// Key of the bound light setup.
    pub fn light_setup_key(&self) -> &str {
        self.light_setup.key()
    }

    /// Key of the bound material.
    pub fn material_key(&self) -> &str {
        self.material.key()
    }

    /// Number of indices this drawable submits.
    pub fn index_count(&self) -> usize {
        match self.submesh.and_then(|t| self.mesh.tiles.get(t)) {
            Some(tile) => tile.index_range.len(),
            None => self.mesh.index_count(),
        }
    }
}

/// A drawable recorded during stage instantiation for bounds computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticDrawableInfo {
    pub node: NodeId,
    pub mesh: MeshHandle,
    pub submesh: Option<usize>,
}
