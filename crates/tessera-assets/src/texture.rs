use std::path::Path;

use crate::error::AssetError;

/// Pixel layout of [`TextureAsset::data`]. Importers normalize to RGBA8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// Decoded texture pixels, shared read-only through the texture store.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: TextureFormat,
}

impl TextureAsset {
    /// Texture from tightly packed RGBA8 rows.
    pub fn rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        let texture = Self {
            width,
            height,
            data,
            format: TextureFormat::Rgba8,
        };
        debug_assert_eq!(
            texture.data.len(),
            texture.pixel_count() * texture.format.bytes_per_pixel()
        );
        texture
    }

    /// A single opaque white texel, used in place of undecodable images.
    pub fn placeholder() -> Self {
        Self::rgba8(1, 1, vec![255; 4])
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Decode a standalone image file into an RGBA8 texture.
pub fn load_texture(path: &Path) -> Result<TextureAsset, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }

    let rgba = image::open(path)
        .map_err(|e| AssetError::ImageLoadFailed(path.to_path_buf(), e.to_string()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(TextureAsset::rgba8(width, height, rgba.into_raw()))
}
