//! Tessera - loads a stage description and reports what it instantiated
//!
//! Usage: `tessera <stage.toml> [resources.toml]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tessera_assets::{
    ActiveSceneIds, Drawable, ResourceManager, ResourceManagerConfig, StageAttributes,
    COLLISION_ASSET,
};
use tessera_scene::SceneManager;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let mut args = std::env::args().skip(1);
    let Some(stage_path) = args.next().map(PathBuf::from) else {
        bail!("usage: tessera <stage.toml> [resources.toml]");
    };
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tessera.toml"));

    let config = ResourceManagerConfig::load(&config_path);
    let stage_text = std::fs::read_to_string(&stage_path)
        .with_context(|| format!("Failed to read stage {}", stage_path.display()))?;
    let stage: StageAttributes = toml::from_str(&stage_text)
        .with_context(|| format!("Failed to parse stage {}", stage_path.display()))?;

    info!("Loading stage '{}'...", stage.handle);

    let mut resources = ResourceManager::new(config);
    let primitives = resources.init_default_prim_attributes();
    info!("Built {} primitive templates", primitives);

    let mut scenes: SceneManager<Drawable> = SceneManager::new();
    let mut ids = ActiveSceneIds {
        render: scenes.init_scene_graph(),
        semantic: None,
    };
    let with_semantics = !stage.semantic_asset.is_empty();
    if !resources.load_stage(&stage, true, &mut scenes, &mut ids, with_semantics) {
        bail!("Failed to load stage '{}'", stage.handle);
    }

    if let Some(graph) = scenes.scene_graph(ids.render) {
        let bounds = graph.nodes.cumulative_bb(graph.root());
        info!(
            "Render scene: {} nodes, {} drawables, bounds {:?}..{:?}",
            graph.nodes.len(),
            graph.drawables.len(),
            bounds.min,
            bounds.max
        );
    }
    if let Some(graph) = ids
        .semantic
        .filter(|id| *id != ids.render)
        .and_then(|id| scenes.scene_graph(id))
    {
        info!(
            "Semantic scene: {} nodes, {} drawables",
            graph.nodes.len(),
            graph.drawables.len()
        );
    }

    let infos = resources.create_stage_asset_infos(&stage, true, false);
    if let Some(collision) = infos
        .get(COLLISION_ASSET)
        .and_then(|info| resources.collision_mesh(&info.filepath))
    {
        let vertices: usize = collision.iter().map(|piece| piece.vertex_count()).sum();
        info!(
            "Collision: {} pieces, {} vertices",
            collision.len(),
            vertices
        );
    }

    info!(
        "Cached {} assets: {} meshes, {} textures, {} materials",
        resources.loaded_asset_count(),
        resources.mesh_count(),
        resources.texture_count(),
        resources.material_count()
    );
    Ok(())
}
