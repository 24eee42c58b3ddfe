//! Procedural primitive meshes addressed by template handles such as
//! `capsule3DSolid_hemiRings_4_cylRings_1_segments_12_halfLen_0.75`.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::path::Path;

use glam::Vec3;

use super::{AssetImporter, ImportedScene};
use crate::error::AssetError;
use crate::mesh::{MeshAsset, MeshTopology};

/// Handles synthesized up front by the resource manager.
pub const DEFAULT_PRIMITIVE_HANDLES: &[&str] = &[
    "cubeSolid",
    "cubeWireframe",
    "uvSphereSolid_rings_16_segments_32",
    "uvSphereWireframe_rings_16_segments_32",
    "capsule3DSolid_hemiRings_4_cylRings_1_segments_12_halfLen_0.75",
    "capsule3DWireframe_hemiRings_4_cylRings_1_segments_12_halfLen_0.75",
    "cylinderSolid_rings_1_segments_12_halfLen_1",
    "cylinderWireframe_rings_1_segments_12_halfLen_1",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Solid,
    Wireframe,
}

/// Builds unit-sized primitive meshes from their handles.
#[derive(Debug, Default)]
pub struct PrimitiveImporter;

impl AssetImporter for PrimitiveImporter {
    fn name(&self) -> &str {
        "primitive"
    }

    fn import(&mut self, path: &Path) -> Result<ImportedScene, AssetError> {
        let handle = path.to_string_lossy();
        Ok(ImportedScene::single_mesh(self.synthesize(&handle)?))
    }
}

impl PrimitiveImporter {
    /// Build the mesh described by a template handle.
    pub fn synthesize(&self, handle: &str) -> Result<MeshAsset, AssetError> {
        let (kind, style, params) = parse_handle(handle)?;
        let param = |key: &str, default: f32| -> Result<f32, AssetError> {
            match params.get(key) {
                None => Ok(default),
                Some(v) => match v.parse::<f32>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    _ => Err(AssetError::Malformed {
                        key: handle.to_string(),
                        reason: format!("parameter '{key}' is not a finite number"),
                    }),
                },
            }
        };
        let count = |key: &str, default: f32, min: u32| -> Result<u32, AssetError> {
            let value = param(key, default)?;
            if value < min as f32 {
                return Err(AssetError::Malformed {
                    key: handle.to_string(),
                    reason: format!("parameter '{key}' must be at least {min}"),
                });
            }
            Ok(value as u32)
        };

        let solid = match kind {
            "cube" => cube(),
            "uvSphere" => lathe(
                "uvSphere",
                &arc(count("rings", 16.0, 2)?, PI * 0.5, -PI * 0.5, 0.0),
                count("segments", 32.0, 3)?,
            ),
            "capsule3D" => {
                let hemi_rings = count("hemiRings", 4.0, 1)?;
                let cyl_rings = count("cylRings", 1.0, 1)?;
                let half_len = param("halfLen", 0.75)?;
                lathe(
                    "capsule3D",
                    &capsule_profile(hemi_rings, cyl_rings, half_len),
                    count("segments", 12.0, 3)?,
                )
            }
            "cylinder" => cylinder(
                count("rings", 1.0, 1)?,
                count("segments", 12.0, 3)?,
                param("halfLen", 1.0)?,
            ),
            _ => return Err(AssetError::UnknownPrimitive(handle.to_string())),
        };

        let mut mesh = match style {
            Style::Solid => solid,
            Style::Wireframe => solid.wireframe(),
        };
        mesh.name = handle.to_string();
        Ok(mesh)
    }
}

fn parse_handle(handle: &str) -> Result<(&str, Style, HashMap<&str, &str>), AssetError> {
    let (pos, style, marker) = [("Solid", Style::Solid), ("Wireframe", Style::Wireframe)]
        .into_iter()
        .filter_map(|(marker, style)| handle.find(marker).map(|pos| (pos, style, marker)))
        .min_by_key(|(pos, _, _)| *pos)
        .ok_or_else(|| AssetError::UnknownPrimitive(handle.to_string()))?;

    let kind = &handle[..pos];
    let rest = handle[pos + marker.len()..].trim_start_matches('_');
    let words: Vec<&str> = rest.split('_').filter(|w| !w.is_empty()).collect();
    if words.len() % 2 != 0 {
        return Err(AssetError::Malformed {
            key: handle.to_string(),
            reason: "parameters must come in name/value pairs".into(),
        });
    }
    let params = words.chunks_exact(2).map(|kv| (kv[0], kv[1])).collect();
    Ok((kind, style, params))
}

/// One ring of a surface of revolution: radius, height, and the normal's
/// radial and vertical components.
#[derive(Debug, Clone, Copy)]
struct ProfileRow {
    radius: f32,
    y: f32,
    normal_radial: f32,
    normal_y: f32,
}

/// Rows of a unit hemisphere arc from `phi_top` down to `phi_bottom`,
/// shifted vertically by `offset`.
fn arc(rows: u32, phi_top: f32, phi_bottom: f32, offset: f32) -> Vec<ProfileRow> {
    (0..=rows)
        .map(|i| {
            let phi = phi_top + (phi_bottom - phi_top) * i as f32 / rows as f32;
            ProfileRow {
                radius: phi.cos(),
                y: phi.sin() + offset,
                normal_radial: phi.cos(),
                normal_y: phi.sin(),
            }
        })
        .collect()
}

fn capsule_profile(hemi_rings: u32, cyl_rings: u32, half_len: f32) -> Vec<ProfileRow> {
    let mut rows = arc(hemi_rings, PI * 0.5, 0.0, half_len);
    rows.extend((0..=cyl_rings).map(|i| ProfileRow {
        radius: 1.0,
        y: half_len - 2.0 * half_len * i as f32 / cyl_rings as f32,
        normal_radial: 1.0,
        normal_y: 0.0,
    }));
    rows.extend(arc(hemi_rings, 0.0, -PI * 0.5, -half_len));
    rows
}

/// Sweep a profile around the Y axis.
fn lathe(name: &str, profile: &[ProfileRow], segments: u32) -> MeshAsset {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    for row in profile {
        for seg in 0..=segments {
            let theta = 2.0 * PI * seg as f32 / segments as f32;
            let (sin, cos) = theta.sin_cos();
            positions.push([row.radius * cos, row.y, row.radius * sin]);
            let normal = Vec3::new(row.normal_radial * cos, row.normal_y, row.normal_radial * sin)
                .normalize_or_zero();
            normals.push(normal.to_array());
        }
    }

    for ring in 0..profile.len().saturating_sub(1) as u32 {
        for seg in 0..segments {
            let current = ring * (segments + 1) + seg;
            let next = current + segments + 1;

            indices.extend([current, next, current + 1]);
            indices.extend([current + 1, next, next + 1]);
        }
    }

    MeshAsset::new(name, MeshTopology::Triangles, positions, indices).with_normals(normals)
}

fn cylinder(rings: u32, segments: u32, half_len: f32) -> MeshAsset {
    let side: Vec<ProfileRow> = (0..=rings)
        .map(|i| ProfileRow {
            radius: 1.0,
            y: half_len - 2.0 * half_len * i as f32 / rings as f32,
            normal_radial: 1.0,
            normal_y: 0.0,
        })
        .collect();
    let mut mesh = lathe("cylinder", &side, segments);
    let mut positions = std::mem::take(&mut mesh.positions);
    let mut normals = std::mem::take(&mut mesh.normals);
    let mut indices = std::mem::take(&mut mesh.indices);

    for (y, normal_y) in [(half_len, 1.0f32), (-half_len, -1.0)] {
        let center = positions.len() as u32;
        positions.push([0.0, y, 0.0]);
        normals.push([0.0, normal_y, 0.0]);
        for seg in 0..=segments {
            let theta = 2.0 * PI * seg as f32 / segments as f32;
            positions.push([theta.cos(), y, theta.sin()]);
            normals.push([0.0, normal_y, 0.0]);
        }
        for seg in 0..segments {
            let a = center + 1 + seg;
            if normal_y > 0.0 {
                indices.extend([center, a + 1, a]);
            } else {
                indices.extend([center, a, a + 1]);
            }
        }
    }
    MeshAsset::new("cylinder", MeshTopology::Triangles, positions, indices).with_normals(normals)
}

/// Cube spanning [-1, 1] with flat per-face normals.
fn cube() -> MeshAsset {
    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for axis in 0..3 {
        for sign in [1.0f32, -1.0] {
            let mut normal = Vec3::ZERO;
            normal[axis] = sign;
            let u = Vec3::from_array([[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]][axis]);
            let v = normal.cross(u);
            let base = positions.len() as u32;
            for (a, b) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.push((normal + u * a + v * b).to_array());
                normals.push(normal.to_array());
            }
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    MeshAsset::new("cube", MeshTopology::Triangles, positions, indices).with_normals(normals)
}
