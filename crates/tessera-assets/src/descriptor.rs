//! Descriptions of what to load: asset infos and the stage/object
//! attribute templates they are derived from.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tessera_core::CoordinateFrame;

/// Semantic type of a file on disk, selecting how it is imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Any scene file handled by the general importer (glTF)
    Generic,
    /// Grayscale height map turned into a tiled terrain mesh
    HeightField,
    /// Mesh carrying per-vertex semantic object ids (PLY)
    InstanceMesh,
    /// JSON composition of other model files
    LegacyHouse,
    /// Procedurally synthesized shape, addressed by handle
    Primitive,
    /// Wireframe of path-finder geometry
    NavMesh,
}

impl AssetType {
    /// Guess the type of a file from its name.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        let ext = Path::new(&lower)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext {
            "ply" => Self::InstanceMesh,
            "json" => Self::LegacyHouse,
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" => Self::HeightField,
            _ => Self::Generic,
        }
    }
}

/// Everything needed to load one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub asset_type: AssetType,
    pub filepath: String,
    pub frame: CoordinateFrame,
    pub requires_lighting: bool,
    /// Split instance meshes into one node per object id
    pub split_instance_mesh: bool,
}

impl AssetInfo {
    /// Unlit asset in the default frame.
    pub fn new(asset_type: AssetType, filepath: impl Into<String>) -> Self {
        Self {
            asset_type,
            filepath: filepath.into(),
            frame: CoordinateFrame::default(),
            requires_lighting: false,
            split_instance_mesh: true,
        }
    }

    /// Synthesized primitive addressed by its template handle.
    pub fn primitive(handle: impl Into<String>) -> Self {
        Self::new(AssetType::Primitive, handle)
    }

    pub fn with_lighting(mut self, requires_lighting: bool) -> Self {
        self.requires_lighting = requires_lighting;
        self
    }

    pub fn with_frame(mut self, frame: CoordinateFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_split(mut self, split: bool) -> Self {
        self.split_instance_mesh = split;
        self
    }
}

/// Stage template: the static environment of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageAttributes {
    pub handle: String,
    pub render_asset: String,
    pub render_asset_type: Option<AssetType>,
    /// Falls back to the render asset when empty
    pub collision_asset: String,
    pub collision_asset_type: Option<AssetType>,
    pub semantic_asset: String,
    pub semantic_asset_type: Option<AssetType>,
    pub requires_lighting: bool,
    pub frame: CoordinateFrame,
}

impl Default for StageAttributes {
    fn default() -> Self {
        Self {
            handle: String::new(),
            render_asset: String::new(),
            render_asset_type: None,
            collision_asset: String::new(),
            collision_asset_type: None,
            semantic_asset: String::new(),
            semantic_asset_type: None,
            requires_lighting: true,
            frame: CoordinateFrame::default(),
        }
    }
}

/// Object template: a dynamic item placed into a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectAttributes {
    pub handle: String,
    pub render_asset: String,
    pub render_asset_type: Option<AssetType>,
    pub collision_asset: String,
    pub collision_asset_type: Option<AssetType>,
    pub requires_lighting: bool,
    pub scale: Vec3,
    pub frame: CoordinateFrame,
}

impl Default for ObjectAttributes {
    fn default() -> Self {
        Self {
            handle: String::new(),
            render_asset: String::new(),
            render_asset_type: None,
            collision_asset: String::new(),
            collision_asset_type: None,
            requires_lighting: true,
            scale: Vec3::ONE,
            frame: CoordinateFrame::default(),
        }
    }
}

impl ObjectAttributes {
    /// Descriptor of the render asset.
    pub fn render_info(&self) -> AssetInfo {
        let asset_type = self
            .render_asset_type
            .unwrap_or_else(|| AssetType::from_path(&self.render_asset));
        AssetInfo::new(asset_type, self.render_asset.clone())
            .with_lighting(self.requires_lighting)
            .with_frame(self.frame)
    }

    /// Descriptor of the collision asset; the render asset when none is set.
    pub fn collision_info(&self) -> AssetInfo {
        if self.collision_asset.is_empty() {
            return self.render_info().with_lighting(false);
        }
        let asset_type = self
            .collision_asset_type
            .unwrap_or_else(|| AssetType::from_path(&self.collision_asset));
        AssetInfo::new(asset_type, self.collision_asset.clone()).with_frame(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_type_from_extension() {
        assert_eq!(AssetType::from_path("a/b/room.glb"), AssetType::Generic);
        assert_eq!(AssetType::from_path("mesh_semantic.PLY"), AssetType::InstanceMesh);
        assert_eq!(AssetType::from_path("house.json"), AssetType::LegacyHouse);
        assert_eq!(AssetType::from_path("terrain.png"), AssetType::HeightField);
        assert_eq!(AssetType::from_path("noext"), AssetType::Generic);
    }

    #[test]
    fn test_stage_attributes_from_toml() {
        let stage: StageAttributes = toml::from_str(
            r#"
            handle = "apartment"
            render_asset = "apartment.glb"
            semantic_asset = "apartment_semantic.ply"
            semantic_asset_type = "instance_mesh"
            requires_lighting = false

            [frame]
            up = [0.0, 0.0, 1.0]
            front = [0.0, 1.0, 0.0]
            "#,
        )
        .unwrap();
        assert_eq!(stage.semantic_asset_type, Some(AssetType::InstanceMesh));
        assert!(!stage.requires_lighting);
        assert_eq!(stage.frame.up, Vec3::Z);
        assert!(stage.collision_asset.is_empty());
    }

    #[test]
    fn test_object_collision_falls_back_to_render_asset() {
        let obj = ObjectAttributes {
            render_asset: "chair.glb".into(),
            ..Default::default()
        };
        let info = obj.collision_info();
        assert_eq!(info.filepath, "chair.glb");
        assert!(!info.requires_lighting);
    }
}
