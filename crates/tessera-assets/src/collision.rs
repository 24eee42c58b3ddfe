//! Collision geometry derived from cached asset trees.

use glam::Mat4;
use tracing::debug;

use crate::hierarchy::LoadedAssetRecord;
use crate::mesh::{CollisionMeshData, MeshAsset, MeshData};
use crate::store::Store;

/// One collision piece per triangle mesh, in the asset's frame.
pub fn build_collision_group(
    record: &LoadedAssetRecord,
    meshes: &Store<MeshAsset>,
) -> Vec<CollisionMeshData> {
    let mut group = Vec::new();
    for (node, world) in record.meta.root.walk(Mat4::IDENTITY) {
        for &handle in &node.meshes {
            let mesh = meshes.resolve(handle);
            if !mesh.is_triangles() {
                debug!("Skipping non-triangle mesh '{}' for collision", mesh.name);
                continue;
            }
            group.push(mesh.collision_data(&world));
        }
    }
    group
}

/// Flatten an asset tree into a single buffer pair.
pub fn join_hierarchy(record: &LoadedAssetRecord, meshes: &Store<MeshAsset>) -> MeshData {
    let mut joined = MeshData::default();
    for (node, world) in record.meta.root.walk(Mat4::IDENTITY) {
        for &handle in &node.meshes {
            joined.append(meshes.resolve(handle), &world);
        }
    }
    joined
}
