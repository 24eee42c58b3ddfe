//! Material descriptors as imported, and the records built from them.

use tessera_core::Color;
use tracing::debug;

use crate::error::AssetError;
use crate::handle::Handle;
use crate::texture::TextureAsset;

pub type TextureHandle = Handle<TextureAsset>;

/// A color channel, optionally textured. Texture indices are local to
/// the imported asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedChannel {
    pub color: Color,
    pub texture: Option<usize>,
}

impl ImportedChannel {
    /// Untextured channel.
    pub fn color(color: Color) -> Self {
        Self {
            color,
            texture: None,
        }
    }

    /// Channel sampling the asset-local texture `texture`, tinted by `color`.
    pub fn textured(color: Color, texture: usize) -> Self {
        Self {
            color,
            texture: Some(texture),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedMetallicRoughness {
    pub base_color: Color,
    pub base_color_texture: Option<usize>,
    pub metallic: f32,
    pub roughness: f32,
    pub metallic_roughness_texture: Option<usize>,
}

/// Material description produced by an importer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMaterial {
    pub name: String,
    pub ambient: Option<ImportedChannel>,
    pub diffuse: Option<ImportedChannel>,
    pub specular: Option<ImportedChannel>,
    pub shininess: Option<f32>,
    pub metallic_roughness: Option<ImportedMetallicRoughness>,
    pub normal_texture: Option<usize>,
    pub emissive: Option<ImportedChannel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingModel {
    Flat,
    Phong,
    Pbr,
}

impl ImportedMaterial {
    /// Shading model implied by the channels the material carries.
    pub fn shading_model(&self) -> ShadingModel {
        if self.metallic_roughness.is_some() {
            ShadingModel::Pbr
        } else if self.specular.is_some() || self.shininess.is_some() {
            ShadingModel::Phong
        } else {
            ShadingModel::Flat
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatMaterial {
    pub color: Color,
    pub texture: Option<TextureHandle>,
    /// Color comes from per-vertex object ids instead of `color`
    pub per_vertex_object_id: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhongMaterial {
    pub ambient_color: Color,
    pub ambient_texture: Option<TextureHandle>,
    pub diffuse_color: Color,
    pub diffuse_texture: Option<TextureHandle>,
    pub specular_color: Color,
    pub specular_texture: Option<TextureHandle>,
    pub shininess: f32,
    pub normal_texture: Option<TextureHandle>,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            ambient_color: Color::rgb(0.1, 0.1, 0.1),
            ambient_texture: None,
            diffuse_color: Color::rgb(0.7, 0.7, 0.7),
            diffuse_texture: None,
            specular_color: Color::rgb(0.2, 0.2, 0.2),
            specular_texture: None,
            shininess: 80.0,
            normal_texture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PbrMaterial {
    pub base_color: Color,
    pub base_color_texture: Option<TextureHandle>,
    pub metallic: f32,
    pub roughness: f32,
    pub metallic_roughness_texture: Option<TextureHandle>,
    pub normal_texture: Option<TextureHandle>,
    pub emissive_color: Color,
    pub emissive_texture: Option<TextureHandle>,
}

/// A material stored in the material registry.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialRecord {
    Flat(FlatMaterial),
    Phong(PhongMaterial),
    Pbr(PbrMaterial),
}

impl MaterialRecord {
    /// Unlit white.
    pub fn white() -> Self {
        Self::Flat(FlatMaterial {
            color: Color::WHITE,
            texture: None,
            per_vertex_object_id: false,
        })
    }

    /// Flat material that colors each vertex by its object id.
    pub fn per_vertex_object_id() -> Self {
        Self::Flat(FlatMaterial {
            color: Color::WHITE,
            texture: None,
            per_vertex_object_id: true,
        })
    }

    /// Shading model of this record.
    pub fn shading_model(&self) -> ShadingModel {
        match self {
            Self::Flat(_) => ShadingModel::Flat,
            Self::Phong(_) => ShadingModel::Phong,
            Self::Pbr(_) => ShadingModel::Pbr,
        }
    }

    /// Every texture this material samples.
    pub fn textures(&self) -> Vec<TextureHandle> {
        let slots = match self {
            Self::Flat(m) => vec![m.texture],
            Self::Phong(m) => vec![
                m.ambient_texture,
                m.diffuse_texture,
                m.specular_texture,
                m.normal_texture,
            ],
            Self::Pbr(m) => vec![
                m.base_color_texture,
                m.metallic_roughness_texture,
                m.normal_texture,
                m.emissive_texture,
            ],
        };
        slots.into_iter().flatten().collect()
    }
}

/// Turns imported materials into records bound to the global texture store.
#[derive(Debug, Clone, Copy)]
pub struct MaterialBuilder {
    pub build_phong_from_pbr: bool,
    pub requires_textures: bool,
}

impl MaterialBuilder {
    /// Build a record for a material whose textures start at `texture_base`
    /// in the texture store. `texture_count` is the number of textures the
    /// asset imported.
    pub fn build(
        &self,
        material: &ImportedMaterial,
        texture_base: usize,
        texture_count: usize,
        requires_lighting: bool,
    ) -> Result<MaterialRecord, AssetError> {
        let textures = TextureResolver {
            base: texture_base,
            count: texture_count,
            enabled: self.requires_textures,
        };

        let model = if requires_lighting {
            material.shading_model()
        } else {
            ShadingModel::Flat
        };

        let record = match model {
            ShadingModel::Flat => MaterialRecord::Flat(build_flat(material, &textures)?),
            ShadingModel::Phong => MaterialRecord::Phong(build_phong(material, &textures)?),
            ShadingModel::Pbr if self.build_phong_from_pbr => {
                MaterialRecord::Phong(build_phong_from_pbr(material, &textures)?)
            }
            ShadingModel::Pbr => MaterialRecord::Pbr(build_pbr(material, &textures)?),
        };
        debug!(
            "Built {:?} material '{}'",
            record.shading_model(),
            material.name
        );
        Ok(record)
    }
}

struct TextureResolver {
    base: usize,
    count: usize,
    enabled: bool,
}

impl TextureResolver {
    fn resolve(&self, local: Option<usize>) -> Result<Option<TextureHandle>, AssetError> {
        match local {
            _ if !self.enabled => Ok(None),
            None => Ok(None),
            Some(texture) if texture >= self.count => Err(AssetError::TextureOutOfRange {
                texture,
                count: self.count,
            }),
            Some(texture) => Ok(Some(Handle::new(self.base + texture))),
        }
    }
}

fn build_flat(
    material: &ImportedMaterial,
    textures: &TextureResolver,
) -> Result<FlatMaterial, AssetError> {
    let channel = material
        .diffuse
        .or(material.ambient)
        .or_else(|| {
            material.metallic_roughness.map(|pbr| ImportedChannel {
                color: pbr.base_color,
                texture: pbr.base_color_texture,
            })
        })
        .unwrap_or(ImportedChannel::color(Color::WHITE));
    Ok(FlatMaterial {
        color: channel.color,
        texture: textures.resolve(channel.texture)?,
        per_vertex_object_id: false,
    })
}

fn build_phong(
    material: &ImportedMaterial,
    textures: &TextureResolver,
) -> Result<PhongMaterial, AssetError> {
    let defaults = PhongMaterial::default();
    let ambient = material
        .ambient
        .unwrap_or(ImportedChannel::color(defaults.ambient_color));
    let diffuse = material
        .diffuse
        .unwrap_or(ImportedChannel::color(defaults.diffuse_color));
    let specular = material
        .specular
        .unwrap_or(ImportedChannel::color(defaults.specular_color));
    Ok(PhongMaterial {
        ambient_color: ambient.color,
        ambient_texture: textures.resolve(ambient.texture)?,
        diffuse_color: diffuse.color,
        diffuse_texture: textures.resolve(diffuse.texture)?,
        specular_color: specular.color,
        specular_texture: textures.resolve(specular.texture)?,
        shininess: material.shininess.unwrap_or(defaults.shininess),
        normal_texture: textures.resolve(material.normal_texture)?,
    })
}

fn build_pbr(
    material: &ImportedMaterial,
    textures: &TextureResolver,
) -> Result<PbrMaterial, AssetError> {
    let Some(pbr) = material.metallic_roughness else {
        return Err(AssetError::Malformed {
            key: material.name.clone(),
            reason: "no metallic-roughness channels".into(),
        });
    };
    let emissive = material
        .emissive
        .unwrap_or(ImportedChannel::color(Color::BLACK));
    Ok(PbrMaterial {
        base_color: pbr.base_color,
        base_color_texture: textures.resolve(pbr.base_color_texture)?,
        metallic: pbr.metallic,
        roughness: pbr.roughness,
        metallic_roughness_texture: textures.resolve(pbr.metallic_roughness_texture)?,
        normal_texture: textures.resolve(material.normal_texture)?,
        emissive_color: emissive.color,
        emissive_texture: textures.resolve(emissive.texture)?,
    })
}

/// Approximate a metallic-roughness material with Phong terms.
fn build_phong_from_pbr(
    material: &ImportedMaterial,
    textures: &TextureResolver,
) -> Result<PhongMaterial, AssetError> {
    let pbr = build_pbr(material, textures)?;
    let dielectric = Color::rgb(0.04, 0.04, 0.04);
    let mix = |a: f32, b: f32| a + (b - a) * pbr.metallic;
    let gloss = (1.0 - pbr.roughness).clamp(0.0, 1.0);
    let specular = Color::rgb(
        mix(dielectric.r, pbr.base_color.r),
        mix(dielectric.g, pbr.base_color.g),
        mix(dielectric.b, pbr.base_color.b),
    )
    .scaled(gloss);
    Ok(PhongMaterial {
        ambient_color: pbr.base_color.scaled(0.1),
        ambient_texture: pbr.base_color_texture,
        diffuse_color: pbr.base_color.scaled(1.0 - pbr.metallic),
        diffuse_texture: pbr.base_color_texture,
        specular_color: specular,
        specular_texture: None,
        shininess: (gloss * gloss * 128.0).max(1.0),
        normal_texture: pbr.normal_texture,
    })
}
