//! Terrain meshes built from grayscale height maps.

use std::path::Path;

use glam::Vec3;
use tessera_core::Aabb;

use crate::config::HeightFieldConfig;
use crate::error::AssetError;
use crate::mesh::{MeshAsset, MeshTile, MeshTopology};

/// Normalized samples of a height map, row-major.
#[derive(Debug, Clone)]
pub struct HeightMap {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<f32>,
}

impl HeightMap {
    /// Normalized height in `[0, 1]` at a grid point.
    pub fn sample(&self, x: u32, z: u32) -> f32 {
        self.samples[(z * self.width + x) as usize]
    }
}

/// Decode a grayscale image as a height map.
pub fn load_height_map(path: &Path) -> Result<HeightMap, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    let img = image::open(path)
        .map_err(|e| AssetError::ImageLoadFailed(path.to_path_buf(), e.to_string()))?;
    let luma = img.to_luma16();
    let (width, height) = luma.dimensions();
    Ok(HeightMap {
        width,
        height,
        samples: luma
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / u16::MAX as f32)
            .collect(),
    })
}

/// Grid mesh centered on the origin, its cells grouped into square tiles.
pub fn build_height_field_mesh(
    name: &str,
    map: &HeightMap,
    config: &HeightFieldConfig,
) -> Result<MeshAsset, AssetError> {
    if map.width < 2 || map.height < 2 {
        return Err(AssetError::EmptyAsset(name.to_string()));
    }
    let (w, h) = (map.width, map.height);
    let half_x = (w - 1) as f32 * 0.5;
    let half_z = (h - 1) as f32 * 0.5;
    let hs = config.horizontal_scale;
    let vs = config.vertical_scale;

    let mut positions = Vec::with_capacity((w * h) as usize);
    let mut normals = Vec::with_capacity((w * h) as usize);
    let mut tex_coords = Vec::with_capacity((w * h) as usize);
    for z in 0..h {
        for x in 0..w {
            positions.push([
                (x as f32 - half_x) * hs,
                map.sample(x, z) * vs,
                (z as f32 - half_z) * hs,
            ]);
            // central differences, clamped at the border
            let l = map.sample(x.saturating_sub(1), z);
            let r = map.sample((x + 1).min(w - 1), z);
            let d = map.sample(x, z.saturating_sub(1));
            let u = map.sample(x, (z + 1).min(h - 1));
            let normal = Vec3::new((l - r) * vs, 2.0 * hs, (d - u) * vs).normalize_or_zero();
            normals.push(normal.to_array());
            tex_coords.push([x as f32 / (w - 1) as f32, z as f32 / (h - 1) as f32]);
        }
    }

    let tile = config.tile_size.max(1);
    let mut indices = Vec::new();
    let mut tiles = Vec::new();
    for tz in (0..h - 1).step_by(tile as usize) {
        for tx in (0..w - 1).step_by(tile as usize) {
            let start = indices.len();
            let mut bounds = Aabb::EMPTY;
            for z in tz..(tz + tile).min(h - 1) {
                for x in tx..(tx + tile).min(w - 1) {
                    let i = z * w + x;
                    let quad = [i, i + 1, i + w, i + w + 1];
                    indices.extend([quad[0], quad[2], quad[1], quad[1], quad[2], quad[3]]);
                    for v in quad {
                        bounds = bounds.including(Vec3::from(positions[v as usize]));
                    }
                }
            }
            tiles.push(MeshTile {
                index_range: start..indices.len(),
                bounds,
            });
        }
    }

    Ok(MeshAsset::new(name, MeshTopology::Triangles, positions, indices)
        .with_normals(normals)
        .with_tex_coords(tex_coords)
        .with_tiles(tiles))
}
