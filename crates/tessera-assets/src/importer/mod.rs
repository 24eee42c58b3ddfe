//! Importer backends and the registry the resource manager builds them in.
//!
//! Every backend produces an [`ImportedScene`]: flat lists of meshes,
//! textures and materials plus an object hierarchy that refers to them by
//! asset-local index.

pub mod gltf;
pub mod height_field;
pub mod house;
pub mod ply;
pub mod primitive;

use std::path::Path;

use glam::Mat4;

use crate::error::AssetError;
use crate::material::ImportedMaterial;
use crate::mesh::MeshAsset;
use crate::texture::TextureAsset;

pub use self::gltf::GltfImporter;
pub use self::ply::PlyImporter;
pub use self::primitive::PrimitiveImporter;

/// One node of an imported object hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedObject {
    pub transform: Mat4,
    /// Mesh indices local to the imported scene
    pub meshes: Vec<usize>,
    pub material: Option<usize>,
    pub semantic_id: Option<u32>,
    pub children: Vec<usize>,
}

impl ImportedObject {
    pub fn new(transform: Mat4) -> Self {
        Self {
            transform,
            meshes: Vec::new(),
            material: None,
            semantic_id: None,
            children: Vec::new(),
        }
    }

    /// Reference a mesh of the scene, with an optional material.
    pub fn with_mesh(mut self, mesh: usize, material: Option<usize>) -> Self {
        self.meshes.push(mesh);
        self.material = material;
        self
    }
}

/// Everything an importer extracted from one file.
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    pub meshes: Vec<MeshAsset>,
    pub textures: Vec<TextureAsset>,
    pub materials: Vec<ImportedMaterial>,
    pub objects: Vec<ImportedObject>,
    /// Top-level objects of the default scene. `None` when the file has no
    /// scene, in which case its first mesh stands alone.
    pub roots: Option<Vec<usize>>,
}

impl ImportedScene {
    /// Scene holding one mesh and no object tree.
    pub fn single_mesh(mesh: MeshAsset) -> Self {
        Self {
            meshes: vec![mesh],
            ..Default::default()
        }
    }
}

/// A file format backend.
pub trait AssetImporter {
    fn name(&self) -> &str;

    /// Import a file. Fails with [`AssetError::NotFound`] if it does not exist.
    fn import(&mut self, path: &Path) -> Result<ImportedScene, AssetError>;
}

/// The importers a resource manager dispatches to.
pub struct ImporterRegistry {
    scene: Box<dyn AssetImporter>,
    instance: Box<dyn AssetImporter>,
    primitive: PrimitiveImporter,
}

impl ImporterRegistry {
    /// glTF for general scenes, PLY for instance meshes.
    pub fn new() -> Self {
        Self {
            scene: Box::new(GltfImporter),
            instance: Box::new(PlyImporter),
            primitive: PrimitiveImporter::default(),
        }
    }

    /// Replace the importer used for generic scene files.
    pub fn with_scene_importer(mut self, importer: Box<dyn AssetImporter>) -> Self {
        self.scene = importer;
        self
    }

    /// Replace the importer used for instance and semantic meshes.
    pub fn with_instance_importer(mut self, importer: Box<dyn AssetImporter>) -> Self {
        self.instance = importer;
        self
    }

    /// Importer for generic scene files.
    pub fn scene_mut(&mut self) -> &mut dyn AssetImporter {
        self.scene.as_mut()
    }

    /// Importer for instance and semantic meshes.
    pub fn instance_mut(&mut self) -> &mut dyn AssetImporter {
        self.instance.as_mut()
    }

    /// Synthesizer for standalone primitive meshes.
    pub fn primitive(&self) -> &PrimitiveImporter {
        &self.primitive
    }

    /// Synthesizer behind the primitive loading strategy.
    pub fn primitive_mut(&mut self) -> &mut PrimitiveImporter {
        &mut self.primitive
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
