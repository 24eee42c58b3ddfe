//! Fixtures shared by the unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::{Mat4, Vec3};
use tessera_core::Color;

use crate::config::ResourceManagerConfig;
use crate::error::AssetError;
use crate::importer::{AssetImporter, ImportedObject, ImportedScene, ImporterRegistry};
use crate::manager::ResourceManager;
use crate::material::{ImportedChannel, ImportedMaterial};
use crate::mesh::{MeshAsset, MeshTopology};
use crate::texture::TextureAsset;

/// Importer serving canned scenes by path and counting calls.
pub struct MockImporter {
    scenes: HashMap<String, ImportedScene>,
    calls: Arc<AtomicUsize>,
}

impl MockImporter {
    pub fn new() -> Self {
        Self {
            scenes: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_scene(mut self, path: &str, scene: ImportedScene) -> Self {
        self.scenes.insert(path.to_string(), scene);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl AssetImporter for MockImporter {
    fn name(&self) -> &str {
        "mock"
    }

    fn import(&mut self, path: &Path) -> Result<ImportedScene, AssetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scenes
            .get(path.to_string_lossy().as_ref())
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_path_buf()))
    }
}

pub fn config() -> ResourceManagerConfig {
    ResourceManagerConfig {
        asset_root: PathBuf::from("/virtual"),
        ..Default::default()
    }
}

pub fn manager_with(scenes: MockImporter) -> ResourceManager {
    ResourceManager::with_importers(
        config(),
        ImporterRegistry::new().with_scene_importer(Box::new(scenes)),
    )
}

pub fn manager_with_instances(instances: MockImporter) -> ResourceManager {
    ResourceManager::with_importers(
        config(),
        ImporterRegistry::new().with_instance_importer(Box::new(instances)),
    )
}

pub fn triangle(name: &str) -> MeshAsset {
    MeshAsset::new(
        name,
        MeshTopology::Triangles,
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![0, 1, 2],
    )
}

pub fn texel() -> TextureAsset {
    TextureAsset::placeholder()
}

/// Synthetic root plus one child carrying a mesh and a Phong material
/// with two textures.
pub fn two_component_scene() -> ImportedScene {
    ImportedScene {
        meshes: vec![triangle("body")],
        textures: vec![texel(), texel()],
        materials: vec![ImportedMaterial {
            name: "painted".into(),
            diffuse: Some(ImportedChannel::textured(Color::WHITE, 0)),
            specular: Some(ImportedChannel::textured(Color::WHITE, 1)),
            shininess: Some(32.0),
            ..Default::default()
        }],
        objects: vec![ImportedObject::new(Mat4::from_translation(Vec3::Y)).with_mesh(0, Some(0))],
        roots: Some(vec![0]),
    }
}

/// `depth` nested objects, each translated by +X and carrying its own mesh.
pub fn chain_scene(depth: usize) -> ImportedScene {
    let objects = (0..depth)
        .map(|i| {
            let mut object =
                ImportedObject::new(Mat4::from_translation(Vec3::X)).with_mesh(i, None);
            if i + 1 < depth {
                object.children.push(i + 1);
            }
            object
        })
        .collect();
    ImportedScene {
        meshes: (0..depth).map(|i| triangle(&format!("link{i}"))).collect(),
        objects,
        roots: Some(vec![0]),
        ..Default::default()
    }
}

pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tessera_{}_{}", std::process::id(), name))
}
