use std::path::PathBuf;

/// Errors that can occur while importing, caching, or instantiating assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to import '{0}': {1}")]
    ImportFailed(PathBuf, String),

    #[error("failed to load image '{0}': {1}")]
    ImageLoadFailed(PathBuf, String),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("asset '{0}' produced no usable geometry")]
    EmptyAsset(String),

    #[error("malformed asset '{key}': {reason}")]
    Malformed { key: String, reason: String },

    #[error("unknown primitive template '{0}'")]
    UnknownPrimitive(String),

    #[error("texture reference {texture} is outside the asset's {count} textures")]
    TextureOutOfRange { texture: usize, count: usize },

    #[error("asset '{0}' has not been loaded")]
    NotLoaded(String),

    #[error("scene node {0:?} has been removed")]
    DeadNode(tessera_scene::NodeId),

    #[error("scene graph {0} does not exist")]
    MissingScene(usize),

    #[error("invalid configuration: {0}")]
    Config(String),
}
