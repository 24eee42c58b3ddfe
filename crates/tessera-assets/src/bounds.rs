//! World-space bounds of instantiated stage drawables.

use glam::{Mat4, Vec3};
use tessera_core::Aabb;
use tessera_scene::NodeTree;
use tracing::debug;

use crate::descriptor::AssetType;
use crate::drawable::StaticDrawableInfo;
use crate::mesh::MeshAsset;
use crate::store::Store;

/// Absolute transform of each drawable's node, aligned with `infos`.
/// Removed nodes yield the identity.
pub fn compute_absolute_transformations(
    nodes: &NodeTree,
    infos: &[StaticDrawableInfo],
) -> Vec<Mat4> {
    infos
        .iter()
        .map(|info| {
            nodes.absolute_transformation(info.node).unwrap_or_else(|| {
                debug!("Node {:?} no longer exists", info.node);
                Mat4::IDENTITY
            })
        })
        .collect()
}

/// Transformed local mesh bounds.
pub fn compute_general_mesh_absolute_aabbs(
    nodes: &mut NodeTree,
    infos: &[StaticDrawableInfo],
    meshes: &Store<MeshAsset>,
) {
    accumulate(nodes, infos, |info, world| {
        meshes.resolve(info.mesh).local_bounds().transformed(world)
    });
}

/// Bounds of every vertex after transformation, tighter than the
/// transformed box for rotated meshes.
pub fn compute_instance_mesh_absolute_aabbs(
    nodes: &mut NodeTree,
    infos: &[StaticDrawableInfo],
    meshes: &Store<MeshAsset>,
) {
    accumulate(nodes, infos, |info, world| {
        Aabb::from_points(
            meshes
                .resolve(info.mesh)
                .positions
                .iter()
                .map(|p| world.transform_point3(Vec3::from(*p))),
        )
    });
}

/// Transformed per-tile bounds.
pub fn compute_height_field_absolute_aabbs(
    nodes: &mut NodeTree,
    infos: &[StaticDrawableInfo],
    meshes: &Store<MeshAsset>,
) {
    accumulate(nodes, infos, |info, world| {
        let mesh = meshes.resolve(info.mesh);
        match info.submesh.and_then(|t| mesh.tiles.get(t)) {
            Some(tile) => tile.bounds.transformed(world),
            None => mesh.local_bounds().transformed(world),
        }
    });
}

/// Pick the bounding-box algorithm that suits `asset_type`.
pub fn compute_absolute_aabbs(
    asset_type: AssetType,
    nodes: &mut NodeTree,
    infos: &[StaticDrawableInfo],
    meshes: &Store<MeshAsset>,
) {
    match asset_type {
        AssetType::InstanceMesh => compute_instance_mesh_absolute_aabbs(nodes, infos, meshes),
        AssetType::HeightField => compute_height_field_absolute_aabbs(nodes, infos, meshes),
        _ => compute_general_mesh_absolute_aabbs(nodes, infos, meshes),
    }
}

fn accumulate(
    nodes: &mut NodeTree,
    infos: &[StaticDrawableInfo],
    bounds_of: impl Fn(&StaticDrawableInfo, &Mat4) -> Aabb,
) {
    let transforms = compute_absolute_transformations(nodes, infos);
    for info in infos {
        if let Some(node) = nodes.get_mut(info.node) {
            node.absolute_aabb = None;
        }
    }
    for (info, world) in infos.iter().zip(&transforms) {
        let bb = bounds_of(info, world);
        if let Some(node) = nodes.get_mut(info.node) {
            node.absolute_aabb = Some(match node.absolute_aabb {
                Some(existing) => existing.union(&bb),
                None => bb,
            });
        }
    }
}
