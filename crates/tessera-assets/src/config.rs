use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AssetError;

/// Resource manager settings, loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceManagerConfig {
    /// Relative asset paths are resolved against this directory
    pub asset_root: PathBuf,
    /// Approximate metallic-roughness materials with Phong shading
    pub build_phong_from_pbr: bool,
    /// Load textures and bind them to materials
    pub requires_textures: bool,
    /// Compute world-space bounds for stage drawables after attaching them
    pub compute_absolute_aabbs: bool,
    /// Default for splitting instance meshes by object id
    pub split_semantic_mesh: bool,
    pub height_field: HeightFieldConfig,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            build_phong_from_pbr: false,
            requires_textures: true,
            compute_absolute_aabbs: true,
            split_semantic_mesh: true,
            height_field: HeightFieldConfig::default(),
        }
    }
}

/// Geometry settings for terrain built from height maps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightFieldConfig {
    /// Cells per tile side; each tile becomes its own drawable
    pub tile_size: u32,
    /// World distance between neighbouring samples
    pub horizontal_scale: f32,
    /// World height of a full-intensity sample
    pub vertical_scale: f32,
}

impl Default for HeightFieldConfig {
    fn default() -> Self {
        Self {
            tile_size: 64,
            horizontal_scale: 1.0,
            vertical_scale: 10.0,
        }
    }
}

impl ResourceManagerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, AssetError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| AssetError::Config(e.to_string()))?;
        if config.height_field.tile_size == 0 {
            return Err(AssetError::Config("height_field.tile_size must be positive".into()));
        }
        Ok(config)
    }

    /// Load from a file, falling back to defaults if it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded resource config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No resource config at {:?}, using defaults", path);
                Self::default()
            }
        }
    }
}
