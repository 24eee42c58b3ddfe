use std::path::Path;

use ::gltf::mesh::Mode;
use glam::Mat4;
use tessera_core::Color;
use tracing::{debug, warn};

use super::{AssetImporter, ImportedObject, ImportedScene};
use crate::error::AssetError;
use crate::material::{ImportedChannel, ImportedMaterial, ImportedMetallicRoughness};
use crate::mesh::{sequential_indices, MeshAsset, MeshTopology};
use crate::texture::TextureAsset;

/// Scene importer for glTF 2.0 files (.gltf or .glb).
///
/// Each glTF primitive becomes its own mesh. A node whose mesh has several
/// primitives keeps the first and gets one extra child object per
/// remaining primitive.
pub struct GltfImporter;

impl AssetImporter for GltfImporter {
    fn name(&self) -> &str {
        "gltf"
    }

    fn import(&mut self, path: &Path) -> Result<ImportedScene, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }
        load_gltf(path)
    }
}

/// Load a glTF file and extract meshes, textures, materials and nodes.
pub fn load_gltf(path: &Path) -> Result<ImportedScene, AssetError> {
    let (document, buffers, images) = ::gltf::import(path)
        .map_err(|e| AssetError::ImportFailed(path.to_path_buf(), e.to_string()))?;

    let mut scene = ImportedScene::default();

    // Flattened primitive index of each glTF mesh's first primitive.
    let mut mesh_starts = Vec::new();
    let mut primitive_materials = Vec::new();

    for mesh in document.meshes() {
        let name = mesh.name().unwrap_or("unnamed").to_string();
        mesh_starts.push(scene.meshes.len());

        for (i, primitive) in mesh.primitives().enumerate() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let tex_coords: Option<Vec<[f32; 2]>> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect());

            let colors: Option<Vec<[f32; 4]>> = reader
                .read_colors(0)
                .map(|c| c.into_rgba_f32().collect());

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|idx| idx.into_u32().collect())
                .unwrap_or_else(|| sequential_indices(positions.len()));

            let (topology, indices) = to_list_topology(primitive.mode(), indices);

            let mut asset = MeshAsset::new(format!("{name}_{i}"), topology, positions, indices)
                .with_normals(normals);
            asset.tex_coords = tex_coords;
            asset.colors = colors;

            primitive_materials.push(primitive.material().index());
            scene.meshes.push(asset);
        }
        debug!("Loaded mesh '{}' with {} primitives", name, mesh.primitives().len());
    }

    for image_data in &images {
        scene.textures.push(convert_image(image_data));
    }

    for material in document.materials() {
        scene.materials.push(convert_material(&material));
    }

    let node_count = document.nodes().len();
    scene.objects = Vec::with_capacity(node_count);
    let mut extra = Vec::new();
    for node in document.nodes() {
        let mut object = ImportedObject::new(Mat4::from_cols_array_2d(&node.transform().matrix()));
        object.children = node.children().map(|c| c.index()).collect();
        if let Some(mesh) = node.mesh() {
            let start = mesh_starts[mesh.index()];
            let count = mesh.primitives().len();
            if count > 0 {
                object.meshes.push(start);
                object.material = primitive_materials[start];
            }
            for flat in start + 1..start + count {
                object.children.push(node_count + extra.len());
                extra.push(
                    ImportedObject::new(Mat4::IDENTITY)
                        .with_mesh(flat, primitive_materials[flat]),
                );
            }
        }
        scene.objects.push(object);
    }
    scene.objects.extend(extra);

    scene.roots = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .map(|s| s.nodes().map(|n| n.index()).collect());

    debug!(
        "glTF '{}': {} meshes, {} textures, {} materials, {} objects",
        path.display(),
        scene.meshes.len(),
        scene.textures.len(),
        scene.materials.len(),
        scene.objects.len()
    );

    Ok(scene)
}

/// Rewrite strips, fans and loops as plain lists.
fn to_list_topology(mode: Mode, indices: Vec<u32>) -> (MeshTopology, Vec<u32>) {
    match mode {
        Mode::Points => (MeshTopology::Points, indices),
        Mode::Lines => (MeshTopology::Lines, indices),
        Mode::LineStrip | Mode::LineLoop => {
            let mut lines: Vec<u32> = indices.windows(2).flat_map(|w| [w[0], w[1]]).collect();
            if mode == Mode::LineLoop && indices.len() > 2 {
                lines.extend([indices[indices.len() - 1], indices[0]]);
            }
            (MeshTopology::Lines, lines)
        }
        Mode::Triangles => (MeshTopology::Triangles, indices),
        Mode::TriangleStrip => {
            let tris = indices
                .windows(3)
                .enumerate()
                .flat_map(|(i, w)| {
                    if i % 2 == 0 {
                        [w[0], w[1], w[2]]
                    } else {
                        [w[1], w[0], w[2]]
                    }
                })
                .collect();
            (MeshTopology::Triangles, tris)
        }
        Mode::TriangleFan => {
            let tris = match indices.split_first() {
                Some((&hub, rest)) => rest.windows(2).flat_map(|w| [hub, w[0], w[1]]).collect(),
                None => Vec::new(),
            };
            (MeshTopology::Triangles, tris)
        }
    }
}

fn convert_image(image_data: &::gltf::image::Data) -> TextureAsset {
    let (width, height) = (image_data.width, image_data.height);
    let data = match image_data.format {
        ::gltf::image::Format::R8G8B8A8 => image_data.pixels.clone(),
        ::gltf::image::Format::R8G8B8 => {
            let mut rgba = Vec::with_capacity(image_data.pixels.len() / 3 * 4);
            for chunk in image_data.pixels.chunks(3) {
                rgba.extend_from_slice(chunk);
                rgba.push(255);
            }
            rgba
        }
        ::gltf::image::Format::R8 => image_data
            .pixels
            .iter()
            .flat_map(|&l| [l, l, l, 255])
            .collect(),
        other => {
            // Keep the slot so texture indices stay aligned with the file.
            warn!("Unsupported glTF image format {:?}, using placeholder", other);
            return TextureAsset::placeholder();
        }
    };
    TextureAsset::rgba8(width, height, data)
}

fn convert_material(material: &::gltf::Material<'_>) -> ImportedMaterial {
    let pbr = material.pbr_metallic_roughness();
    let emissive = Color::from(material.emissive_factor());
    ImportedMaterial {
        name: material.name().unwrap_or("unnamed").to_string(),
        metallic_roughness: Some(ImportedMetallicRoughness {
            base_color: Color::from(pbr.base_color_factor()),
            base_color_texture: pbr
                .base_color_texture()
                .map(|info| info.texture().source().index()),
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            metallic_roughness_texture: pbr
                .metallic_roughness_texture()
                .map(|info| info.texture().source().index()),
        }),
        normal_texture: material
            .normal_texture()
            .map(|n| n.texture().source().index()),
        emissive: Some(ImportedChannel {
            color: emissive,
            texture: material
                .emissive_texture()
                .map(|info| info.texture().source().index()),
        }),
        ..Default::default()
    }
}
