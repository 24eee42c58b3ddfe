//! Tessera Assets - Asset import, caching, and scene instantiation
//!
//! The [`ResourceManager`] imports each asset file at most once, keeps the
//! meshes, textures and materials it produced in shared stores, and
//! replays the cached node tree into scene graphs on demand. It also
//! derives collision geometry and world-space bounds, and owns the keyed
//! light and material setups that drawables reference.

mod bounds;
mod collision;
mod config;
mod descriptor;
mod drawable;
mod error;
mod handle;
mod hierarchy;
pub mod importer;
mod instantiate;
mod manager;
mod material;
mod mesh;
mod setup;
mod store;
mod texture;

#[cfg(test)]
mod test_support;

pub use bounds::{
    compute_absolute_aabbs, compute_absolute_transformations,
    compute_general_mesh_absolute_aabbs, compute_height_field_absolute_aabbs,
    compute_instance_mesh_absolute_aabbs,
};
pub use config::{HeightFieldConfig, ResourceManagerConfig};
pub use descriptor::{AssetInfo, AssetType, ObjectAttributes, StageAttributes};
pub use drawable::{Drawable, DrawableGroup, StaticDrawableInfo};
pub use error::AssetError;
pub use handle::Handle;
pub use hierarchy::{LoadedAssetRecord, MeshHandle, MeshMetaData, MeshTransformNode};
pub use instantiate::AttachTarget;
pub use manager::{
    ActiveSceneIds, PrimitiveId, ResourceManager, COLLISION_ASSET, RENDER_ASSET, SEMANTIC_ASSET,
};
pub use material::{
    FlatMaterial, ImportedChannel, ImportedMaterial, ImportedMetallicRoughness, MaterialBuilder,
    MaterialRecord, PbrMaterial, PhongMaterial, ShadingModel, TextureHandle,
};
pub use mesh::{CollisionMeshData, MeshAsset, MeshData, MeshTile, MeshTopology, NavMeshGeometry};
pub use setup::{
    default_light_setup, LightInfo, LightPositionModel, LightSetup, SetupRef, SetupRegistry,
    DEFAULT_LIGHTING_KEY, DEFAULT_MATERIAL_KEY, NO_LIGHT_KEY, PER_VERTEX_OBJECT_ID_MATERIAL_KEY,
    WHITE_MATERIAL_KEY,
};
pub use store::Store;
pub use texture::{load_texture, TextureAsset, TextureFormat};
