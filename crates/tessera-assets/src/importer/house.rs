//! Legacy house files: a JSON list of model files placed by transform.

use std::path::Path;

use glam::Mat4;
use serde::Deserialize;

use crate::error::AssetError;

#[derive(Debug, Clone, Deserialize)]
pub struct HouseFile {
    #[serde(default)]
    pub id: String,
    pub nodes: Vec<HouseNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HouseNode {
    #[serde(default)]
    pub id: String,
    /// Model path, relative to the house file
    pub model: String,
    /// Column-major 4x4 matrix
    #[serde(default)]
    pub transform: Option<[f32; 16]>,
    #[serde(default)]
    pub semantic_id: Option<u32>,
}

impl HouseNode {
    /// Node transform, identity when the file omits it.
    pub fn matrix(&self) -> Mat4 {
        self.transform
            .map(|m| Mat4::from_cols_array(&m))
            .unwrap_or(Mat4::IDENTITY)
    }
}

/// Parse a house description.
pub fn parse_house(key: &str, text: &str) -> Result<HouseFile, AssetError> {
    serde_json::from_str(text).map_err(|e| AssetError::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Read and parse a house file.
pub fn load_house(path: &Path) -> Result<HouseFile, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    let text =
        std::fs::read_to_string(path).map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
    parse_house(&path.to_string_lossy(), &text)
}
