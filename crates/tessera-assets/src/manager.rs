use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Mat4;
use tessera_core::Transform;
use tessera_scene::{NodeId, SceneId, SceneManager};
use tracing::{debug, error, info, warn};

use crate::bounds;
use crate::collision;
use crate::config::ResourceManagerConfig;
use crate::descriptor::{AssetInfo, AssetType, ObjectAttributes, StageAttributes};
use crate::drawable::{Drawable, DrawableGroup};
use crate::error::AssetError;
use crate::hierarchy::{self, LoadedAssetRecord, MeshHandle, MeshMetaData, MeshTransformNode};
use crate::importer::height_field;
use crate::importer::house;
use crate::importer::primitive::DEFAULT_PRIMITIVE_HANDLES;
use crate::importer::{AssetImporter, ImportedObject, ImportedScene, ImporterRegistry};
use crate::instantiate::{AttachTarget, Instantiator};
use crate::material::{MaterialBuilder, MaterialRecord, PhongMaterial, TextureHandle};
use crate::mesh::{CollisionMeshData, MeshAsset, MeshData, MeshTopology, NavMeshGeometry};
use crate::setup::{
    default_light_setup, LightSetup, SetupRef, SetupRegistry, DEFAULT_LIGHTING_KEY,
    DEFAULT_MATERIAL_KEY, NO_LIGHT_KEY, PER_VERTEX_OBJECT_ID_MATERIAL_KEY, WHITE_MATERIAL_KEY,
};
use crate::store::Store;
use crate::texture::TextureAsset;

/// Keys of [`ResourceManager::create_stage_asset_infos`].
pub const RENDER_ASSET: &str = "render";
pub const COLLISION_ASSET: &str = "collision";
pub const SEMANTIC_ASSET: &str = "semantic";

/// Id of a mesh held outside the asset cache (debug primitives, navmesh).
pub type PrimitiveId = u32;

/// Scene graphs a stage is loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSceneIds {
    pub render: SceneId,
    pub semantic: Option<SceneId>,
}

/// Loads asset files at most once, caches what they produced, and
/// instantiates cached assets into scene graphs.
pub struct ResourceManager {
    config: ResourceManagerConfig,
    importers: ImporterRegistry,
    meshes: Store<MeshAsset>,
    textures: Store<TextureAsset>,
    next_material_id: u64,
    resource_dict: BTreeMap<String, LoadedAssetRecord>,
    collision_mesh_groups: BTreeMap<String, Vec<CollisionMeshData>>,
    light_setups: SetupRegistry<LightSetup>,
    material_setups: SetupRegistry<MaterialRecord>,
    primitive_meshes: BTreeMap<PrimitiveId, Arc<MeshAsset>>,
    next_primitive_mesh_id: PrimitiveId,
}

impl ResourceManager {
    /// Manager with the default glTF and PLY importers.
    pub fn new(config: ResourceManagerConfig) -> Self {
        Self::with_importers(config, ImporterRegistry::new())
    }

    /// Manager with custom importers. Default light setups and materials
    /// are registered before this returns.
    pub fn with_importers(config: ResourceManagerConfig, importers: ImporterRegistry) -> Self {
        info!(
            "ResourceManager created with asset root: {}",
            config.asset_root.display()
        );
        let mut manager = Self {
            config,
            importers,
            meshes: Store::new(),
            textures: Store::new(),
            next_material_id: 0,
            resource_dict: BTreeMap::new(),
            collision_mesh_groups: BTreeMap::new(),
            light_setups: SetupRegistry::new(),
            material_setups: SetupRegistry::new(),
            primitive_meshes: BTreeMap::new(),
            next_primitive_mesh_id: 0,
        };
        manager.init_default_light_setups();
        manager.init_default_materials();
        manager
    }

    /// Active configuration.
    pub fn config(&self) -> &ResourceManagerConfig {
        &self.config
    }

    /// Takes effect for assets loaded afterwards.
    pub fn set_requires_textures(&mut self, requires_textures: bool) {
        self.config.requires_textures = requires_textures;
    }

    /// Register the empty `NO_LIGHT_KEY` setup and the default camera lights.
    pub fn init_default_light_setups(&mut self) {
        self.light_setups.set(NO_LIGHT_KEY, LightSetup::new());
        self.light_setups
            .set(DEFAULT_LIGHTING_KEY, default_light_setup());
    }

    /// Register the default Phong, flat white and per-vertex object id
    /// materials under their reserved keys.
    pub fn init_default_materials(&mut self) {
        self.material_setups.set(
            DEFAULT_MATERIAL_KEY,
            MaterialRecord::Phong(PhongMaterial::default()),
        );
        self.material_setups
            .set(WHITE_MATERIAL_KEY, MaterialRecord::white());
        self.material_setups.set(
            PER_VERTEX_OBJECT_ID_MATERIAL_KEY,
            MaterialRecord::per_vertex_object_id(),
        );
    }

    /// Synthesize the built-in primitive templates. Returns how many loaded.
    pub fn init_default_prim_attributes(&mut self) -> usize {
        let mut loaded = 0;
        for handle in DEFAULT_PRIMITIVE_HANDLES {
            match self.ensure_loaded(&AssetInfo::primitive(*handle)) {
                Ok(_) => loaded += 1,
                Err(e) => warn!("Failed to build primitive '{}': {}", handle, e),
            }
        }
        loaded
    }

    /// Resolve a relative asset path against the asset root.
    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() || path.starts_with(&self.config.asset_root) {
            path.to_path_buf()
        } else {
            self.config.asset_root.join(path)
        }
    }

    /// Cache key of an asset: its resolved path, or the handle of a primitive.
    pub fn asset_key(&self, info: &AssetInfo) -> String {
        match info.asset_type {
            AssetType::Primitive => info.filepath.clone(),
            _ => self.resolve(&info.filepath).to_string_lossy().into_owned(),
        }
    }

    fn key_for(&self, path: &str) -> String {
        if self.resource_dict.contains_key(path) {
            path.to_string()
        } else {
            self.resolve(path).to_string_lossy().into_owned()
        }
    }

    fn material_builder(&self) -> MaterialBuilder {
        MaterialBuilder {
            build_phong_from_pbr: self.config.build_phong_from_pbr,
            requires_textures: self.config.requires_textures,
        }
    }

    /// Load an asset unless it is already cached, and return its record.
    ///
    /// A failed load leaves the cache and every store untouched.
    pub fn ensure_loaded(&mut self, info: &AssetInfo) -> Result<&LoadedAssetRecord, AssetError> {
        let key = self.asset_key(info);
        self.ensure_loaded_at(info, key)
    }

    fn ensure_loaded_at(
        &mut self,
        info: &AssetInfo,
        key: String,
    ) -> Result<&LoadedAssetRecord, AssetError> {
        if self.resource_dict.contains_key(&key) {
            debug!("Asset '{}' already loaded", key);
        } else {
            let record = match info.asset_type {
                AssetType::Generic => self.load_general(info, &key)?,
                AssetType::HeightField => self.load_height_field(info, &key)?,
                AssetType::InstanceMesh => self.load_instance_mesh(info, &key)?,
                AssetType::LegacyHouse => self.load_house(info, &key)?,
                AssetType::Primitive => self.load_primitive(info, &key)?,
                AssetType::NavMesh => {
                    return Err(AssetError::ImportFailed(
                        PathBuf::from(&key),
                        "navmesh visualizations are built from path-finder geometry".into(),
                    ))
                }
            };
            info!(
                "Loaded {:?} asset '{}': {} meshes, {} textures, {} nodes",
                info.asset_type,
                key,
                record.meta.mesh_range.len(),
                record.meta.texture_range.len(),
                record.meta.root.node_count()
            );
            self.resource_dict.insert(key.clone(), record);
        }
        self.resource_dict
            .get(&key)
            .ok_or(AssetError::NotLoaded(key))
    }

    fn load_general(&mut self, info: &AssetInfo, key: &str) -> Result<LoadedAssetRecord, AssetError> {
        let importer = self.importers.scene_mut();
        debug!("Importing '{}' with the {} importer", key, importer.name());
        let scene = importer.import(Path::new(key))?;
        self.commit_scene(info, key, scene, None)
    }

    fn load_primitive(
        &mut self,
        info: &AssetInfo,
        key: &str,
    ) -> Result<LoadedAssetRecord, AssetError> {
        let scene = self.importers.primitive_mut().import(Path::new(key))?;
        self.commit_scene(info, key, scene, None)
    }

    fn load_height_field(
        &mut self,
        info: &AssetInfo,
        key: &str,
    ) -> Result<LoadedAssetRecord, AssetError> {
        let map = height_field::load_height_map(Path::new(key))?;
        let mesh = height_field::build_height_field_mesh(key, &map, &self.config.height_field)?;
        self.commit_scene(info, key, ImportedScene::single_mesh(mesh), None)
    }

    fn load_instance_mesh(
        &mut self,
        info: &AssetInfo,
        key: &str,
    ) -> Result<LoadedAssetRecord, AssetError> {
        let importer = self.importers.instance_mut();
        debug!("Importing '{}' with the {} importer", key, importer.name());
        let mut scene = importer.import(Path::new(key))?;
        let parts = match scene.meshes.first() {
            Some(mesh) if info.split_instance_mesh => mesh.split_by_object_id(),
            _ => Vec::new(),
        };
        if !parts.is_empty() {
            let mut split = ImportedScene::default();
            for (i, (object, part)) in parts.into_iter().enumerate() {
                split.meshes.push(part);
                let mut node = ImportedObject::new(Mat4::IDENTITY).with_mesh(i, None);
                node.semantic_id = Some(object);
                split.objects.push(node);
            }
            split.roots = Some((0..split.objects.len()).collect());
            debug!("Split '{}' into {} objects", key, split.objects.len());
            scene = split;
        }
        self.commit_scene(info, key, scene, Some(PER_VERTEX_OBJECT_ID_MATERIAL_KEY))
    }

    /// Compose a house from its model files, each cached on its own.
    fn load_house(&mut self, info: &AssetInfo, key: &str) -> Result<LoadedAssetRecord, AssetError> {
        let path = PathBuf::from(key);
        let house = house::load_house(&path)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut root = MeshTransformNode::new(Mat4::IDENTITY);
        for node in &house.nodes {
            let model = dir.join(&node.model).to_string_lossy().into_owned();
            let sub_info = AssetInfo::new(AssetType::Generic, model.clone())
                .with_lighting(info.requires_lighting);
            match self.ensure_loaded_at(&sub_info, model) {
                Ok(record) => {
                    let mut child = record.meta.root.clone();
                    child.transform = node.matrix() * child.transform;
                    if node.semantic_id.is_some() {
                        child.semantic_id = node.semantic_id;
                    }
                    root.children.push(child);
                }
                Err(e) => warn!("House '{}': skipping node '{}': {}", key, node.id, e),
            }
        }
        if root.children.is_empty() {
            return Err(AssetError::EmptyAsset(key.to_string()));
        }

        // Meshes and textures belong to the sub-model records.
        let (meshes, textures) = (self.meshes.len(), self.textures.len());
        Ok(LoadedAssetRecord {
            info: info.clone(),
            meta: MeshMetaData {
                mesh_range: meshes..meshes,
                texture_range: textures..textures,
                material_keys: Vec::new(),
                root,
            },
        })
    }

    /// Validate an imported scene and append it to the stores.
    ///
    /// Everything that can fail runs before the first store is touched.
    fn commit_scene(
        &mut self,
        info: &AssetInfo,
        key: &str,
        mut scene: ImportedScene,
        fallback_material: Option<&str>,
    ) -> Result<LoadedAssetRecord, AssetError> {
        if scene.meshes.is_empty() {
            return Err(AssetError::EmptyAsset(key.to_string()));
        }
        if !self.config.requires_textures {
            scene.textures.clear();
        }

        let mesh_base = self.meshes.len();
        let texture_base = self.textures.len();
        let texture_count = scene.textures.len();

        let builder = self.material_builder();
        let mut next_material_id = self.next_material_id;
        let mut built = Vec::with_capacity(scene.materials.len());
        let mut material_keys = Vec::with_capacity(scene.materials.len());
        for material in &scene.materials {
            match builder.build(material, texture_base, texture_count, info.requires_lighting) {
                Ok(record) => {
                    let material_key = next_material_id.to_string();
                    next_material_id += 1;
                    material_keys.push(material_key.clone());
                    built.push((material_key, record));
                }
                Err(e) => {
                    warn!(
                        "Asset '{}': material '{}' failed ({}), using white",
                        key, material.name, e
                    );
                    material_keys.push(WHITE_MATERIAL_KEY.to_string());
                }
            }
        }

        let root = hierarchy::load_mesh_hierarchy(
            key,
            &scene,
            mesh_base,
            &material_keys,
            fallback_material,
        );
        if root.mesh_count() == 0 {
            return Err(AssetError::EmptyAsset(key.to_string()));
        }

        let mesh_count = scene.meshes.len();
        for mesh in scene.meshes {
            self.meshes.push(mesh);
        }
        for texture in scene.textures {
            self.textures.push(texture);
        }
        for (material_key, record) in built {
            self.material_setups.set(&material_key, record);
        }
        self.next_material_id = next_material_id;

        Ok(LoadedAssetRecord {
            info: info.clone(),
            meta: MeshMetaData {
                mesh_range: mesh_base..mesh_base + mesh_count,
                texture_range: texture_base..texture_base + texture_count,
                material_keys,
                root,
            },
        })
    }

    /// Whether drawables of `record` may use the light setup under `key`.
    /// Lit assets cannot be drawn unlit.
    pub fn is_light_setup_compatible(record: &LoadedAssetRecord, light_setup_key: &str) -> bool {
        !(record.info.requires_lighting && light_setup_key == NO_LIGHT_KEY)
    }

    /// Instantiate a cached asset under `target`.
    ///
    /// Returns every scene node created, parents first.
    pub fn attach(
        &mut self,
        path: &str,
        target: &mut AttachTarget<'_>,
        light_setup_key: &str,
        compute_absolute_aabbs: bool,
    ) -> Result<Vec<NodeId>, AssetError> {
        let key = self.key_for(path);
        let Some(record) = self.resource_dict.get(&key) else {
            return Err(AssetError::NotLoaded(key));
        };
        if !target.nodes.is_alive(target.parent) {
            return Err(AssetError::DeadNode(target.parent));
        }

        let light_setup_key = if Self::is_light_setup_compatible(record, light_setup_key) {
            light_setup_key
        } else {
            debug!(
                "Asset '{}' requires lighting, using the default light setup",
                key
            );
            DEFAULT_LIGHTING_KEY
        };
        if !self.light_setups.contains(light_setup_key) {
            debug!("Light setup '{}' is not set yet", light_setup_key);
        }

        let rotation = Mat4::from_quat(record.info.frame.rotation_frame_to_world());
        let mut visual_nodes = Vec::new();
        let mut static_infos = Vec::new();
        let mut instantiator = Instantiator {
            meshes: &self.meshes,
            materials: &mut self.material_setups,
            lights: &mut self.light_setups,
        };
        instantiator.add_component_tree(
            &record.meta.root,
            rotation,
            target,
            light_setup_key,
            &mut visual_nodes,
            &mut static_infos,
        );

        if compute_absolute_aabbs {
            bounds::compute_absolute_aabbs(
                record.info.asset_type,
                target.nodes,
                &static_infos,
                &self.meshes,
            );
        }
        debug!(
            "Attached '{}': {} nodes, {} mesh placements",
            key,
            visual_nodes.len(),
            static_infos.len()
        );
        Ok(visual_nodes)
    }

    /// Load an asset and, when a target is given, instantiate it there.
    pub fn load_stage_internal(
        &mut self,
        info: &AssetInfo,
        target: Option<AttachTarget<'_>>,
        compute_absolute_aabbs: bool,
        light_setup_key: &str,
    ) -> Result<Vec<NodeId>, AssetError> {
        self.ensure_loaded(info)?;
        let Some(mut target) = target else {
            return Ok(Vec::new());
        };
        let key = self.asset_key(info);
        self.attach(&key, &mut target, light_setup_key, compute_absolute_aabbs)
    }

    fn load_into_scene(
        &mut self,
        info: &AssetInfo,
        scenes: &mut SceneManager<Drawable>,
        scene: SceneId,
        light_setup_key: &str,
    ) -> Result<Vec<NodeId>, AssetError> {
        let Some(graph) = scenes.scene_graph_mut(scene) else {
            return Err(AssetError::MissingScene(scene.0));
        };
        let compute = self.config.compute_absolute_aabbs;
        self.load_stage_internal(
            info,
            Some(AttachTarget::scene_root(graph)),
            compute,
            light_setup_key,
        )
    }

    /// Asset infos for the parts of a stage, keyed by [`RENDER_ASSET`],
    /// [`COLLISION_ASSET`] and [`SEMANTIC_ASSET`].
    pub fn create_stage_asset_infos(
        &self,
        stage: &StageAttributes,
        create_collision_info: bool,
        create_semantic_info: bool,
    ) -> BTreeMap<&'static str, AssetInfo> {
        let typed = |path: &str, declared: Option<AssetType>| {
            declared.unwrap_or_else(|| AssetType::from_path(path))
        };
        let mut infos = BTreeMap::new();

        infos.insert(
            RENDER_ASSET,
            AssetInfo::new(
                typed(&stage.render_asset, stage.render_asset_type),
                stage.render_asset.clone(),
            )
            .with_frame(stage.frame)
            .with_lighting(stage.requires_lighting)
            .with_split(self.config.split_semantic_mesh),
        );

        if create_collision_info {
            let (path, declared) = if stage.collision_asset.is_empty() {
                (&stage.render_asset, stage.render_asset_type)
            } else {
                (&stage.collision_asset, stage.collision_asset_type)
            };
            infos.insert(
                COLLISION_ASSET,
                AssetInfo::new(typed(path, declared), path.clone())
                    .with_frame(stage.frame)
                    .with_lighting(stage.requires_lighting && stage.collision_asset.is_empty()),
            );
        }

        if create_semantic_info && !stage.semantic_asset.is_empty() {
            infos.insert(
                SEMANTIC_ASSET,
                AssetInfo::new(
                    stage
                        .semantic_asset_type
                        .unwrap_or(AssetType::InstanceMesh),
                    stage.semantic_asset.clone(),
                )
                .with_frame(stage.frame)
                .with_split(self.config.split_semantic_mesh),
            );
        }
        infos
    }

    /// Load a stage into the render scene, plus a semantic scene and
    /// collision geometry when asked for. Failures are logged.
    pub fn load_stage(
        &mut self,
        stage: &StageAttributes,
        create_collision_info: bool,
        scenes: &mut SceneManager<Drawable>,
        active_scene_ids: &mut ActiveSceneIds,
        create_semantic_mesh: bool,
    ) -> bool {
        let infos =
            self.create_stage_asset_infos(stage, create_collision_info, create_semantic_mesh);
        let Some(render_info) = infos.get(RENDER_ASSET) else {
            return false;
        };

        if create_semantic_mesh {
            active_scene_ids.semantic = None;
            if let Some(semantic_info) = infos.get(SEMANTIC_ASSET) {
                if semantic_info.filepath == render_info.filepath {
                    active_scene_ids.semantic = Some(active_scene_ids.render);
                } else {
                    let scene = scenes.init_scene_graph();
                    match self.load_into_scene(semantic_info, scenes, scene, NO_LIGHT_KEY) {
                        Ok(_) => active_scene_ids.semantic = Some(scene),
                        Err(e) => error!(
                            "Failed to load semantic asset '{}': {}",
                            semantic_info.filepath, e
                        ),
                    }
                }
            }
        }

        let light_setup_key = if stage.requires_lighting {
            DEFAULT_LIGHTING_KEY
        } else {
            NO_LIGHT_KEY
        };
        if let Err(e) =
            self.load_into_scene(render_info, scenes, active_scene_ids.render, light_setup_key)
        {
            error!(
                "Failed to load stage render asset '{}': {}",
                render_info.filepath, e
            );
            return false;
        }

        if let Some(collision_info) = infos.get(COLLISION_ASSET) {
            if let Err(e) = self.ensure_collision_mesh_group(collision_info) {
                error!(
                    "Failed to build stage collision from '{}': {}",
                    collision_info.filepath, e
                );
                return false;
            }
        }

        info!("Loaded stage '{}'", stage.handle);
        true
    }

    /// Collision pieces for an asset, one per triangle mesh in its tree.
    pub fn build_mesh_groups(&self, path: &str) -> Result<Vec<CollisionMeshData>, AssetError> {
        let key = self.key_for(path);
        let record = self
            .resource_dict
            .get(&key)
            .ok_or_else(|| AssetError::NotLoaded(key.clone()))?;
        let group = collision::build_collision_group(record, &self.meshes);
        if group.is_empty() {
            return Err(AssetError::EmptyAsset(key));
        }
        Ok(group)
    }

    /// Load an asset and build its collision group unless already built.
    pub fn ensure_collision_mesh_group(
        &mut self,
        info: &AssetInfo,
    ) -> Result<&[CollisionMeshData], AssetError> {
        let key = self.asset_key(info);
        if !self.collision_mesh_groups.contains_key(&key) {
            self.ensure_loaded(info)?;
            let group = self.build_mesh_groups(&key)?;
            debug!("Built {} collision pieces for '{}'", group.len(), key);
            self.collision_mesh_groups.insert(key.clone(), group);
        }
        self.collision_mesh_groups
            .get(&key)
            .map(Vec::as_slice)
            .ok_or(AssetError::NotLoaded(key))
    }

    /// Load the render and collision assets of an object template.
    ///
    /// Collision derived from a primitive render asset is skipped; those
    /// shapes are analytic.
    pub fn instantiate_assets_on_demand(&mut self, object: &ObjectAttributes) -> bool {
        let render = object.render_info();
        if let Err(e) = self.ensure_loaded(&render) {
            error!(
                "Failed to load render asset '{}' of object '{}': {}",
                render.filepath, object.handle, e
            );
            return false;
        }

        let collision = object.collision_info();
        if collision.asset_type == AssetType::Primitive {
            return true;
        }
        if let Err(e) = self.ensure_collision_mesh_group(&collision) {
            error!(
                "Failed to load collision asset '{}' of object '{}': {}",
                collision.filepath, object.handle, e
            );
            return false;
        }
        true
    }

    /// Load an object's assets and attach its render asset under a scaling
    /// node created below `target.parent`.
    pub fn add_object_to_drawables(
        &mut self,
        object: &ObjectAttributes,
        target: Option<AttachTarget<'_>>,
        visual_nodes: &mut Vec<NodeId>,
        light_setup_key: &str,
    ) -> bool {
        if !self.instantiate_assets_on_demand(object) {
            return false;
        }
        let Some(mut target) = target else {
            return true;
        };
        if !target.nodes.is_alive(target.parent) {
            error!(
                "Cannot attach object '{}': parent {:?} has been removed",
                object.handle, target.parent
            );
            return false;
        }

        let scale_node = target.nodes.create_child(target.parent);
        target
            .nodes
            .set_transform(scale_node, &Transform::from_scale(object.scale));
        visual_nodes.push(scale_node);

        let key = self.asset_key(&object.render_info());
        let mut scaled = AttachTarget {
            nodes: &mut *target.nodes,
            parent: scale_node,
            drawables: target.drawables.as_deref_mut(),
        };
        match self.attach(&key, &mut scaled, light_setup_key, false) {
            Ok(nodes) => {
                visual_nodes.extend(nodes);
                true
            }
            Err(e) => {
                error!("Failed to attach object '{}': {}", object.handle, e);
                false
            }
        }
    }

    fn insert_primitive_mesh(&mut self, mesh: MeshAsset) -> PrimitiveId {
        let id = self.next_primitive_mesh_id;
        self.next_primitive_mesh_id += 1;
        self.primitive_meshes.insert(id, Arc::new(mesh));
        id
    }

    /// Build a standalone primitive mesh from a template handle.
    pub fn create_primitive_mesh(&mut self, handle: &str) -> Result<PrimitiveId, AssetError> {
        let mesh = self.importers.primitive().synthesize(handle)?;
        Ok(self.insert_primitive_mesh(mesh))
    }

    /// Draw a standalone primitive mesh at `node`, unlit and white.
    pub fn add_primitive_to_drawables(
        &mut self,
        primitive_id: PrimitiveId,
        node: NodeId,
        drawables: &mut DrawableGroup,
    ) -> bool {
        let Some(mesh) = self.primitive_meshes.get(&primitive_id) else {
            warn!("No primitive mesh with id {}", primitive_id);
            return false;
        };
        drawables.add(Drawable {
            node,
            mesh: Arc::clone(mesh),
            mesh_handle: None,
            submesh: None,
            material: self.material_setups.get(WHITE_MATERIAL_KEY),
            light_setup: self.light_setups.get(NO_LIGHT_KEY),
        });
        true
    }

    /// Drop a standalone primitive mesh. Drawables already using it keep
    /// their copy alive.
    pub fn remove_primitive_mesh(&mut self, primitive_id: PrimitiveId) -> bool {
        self.primitive_meshes.remove(&primitive_id).is_some()
    }

    /// Wireframe of path-finder geometry, optionally drawn under
    /// `target.parent`. Returns `None` for empty or inconsistent geometry
    /// and for a removed parent.
    pub fn load_nav_mesh_visualization(
        &mut self,
        geometry: &NavMeshGeometry,
        target: Option<AttachTarget<'_>>,
    ) -> Option<PrimitiveId> {
        if geometry.is_empty() {
            warn!("Navmesh has no triangles, nothing to visualize");
            return None;
        }
        if geometry
            .indices
            .iter()
            .any(|&i| i as usize >= geometry.vertices.len())
        {
            warn!("Navmesh indices exceed its {} vertices", geometry.vertices.len());
            return None;
        }

        let triangles = geometry.indices.len() / 3 * 3;
        let mesh = MeshAsset::new(
            "navmesh",
            MeshTopology::Triangles,
            geometry.vertices.clone(),
            geometry.indices[..triangles].to_vec(),
        )
        .wireframe();
        if let Some(target) = target.as_ref() {
            if !target.nodes.is_alive(target.parent) {
                warn!("Navmesh parent {:?} has been removed", target.parent);
                return None;
            }
        }
        let id = self.insert_primitive_mesh(mesh);

        if let Some(target) = target {
            let node = target.nodes.create_child(target.parent);
            if let Some(drawables) = target.drawables {
                self.add_primitive_to_drawables(id, node, drawables);
            }
        }
        Some(id)
    }

    /// One vertex/index buffer for a loaded asset's whole tree.
    pub fn create_joined_collision_mesh(&self, path: &str) -> Result<MeshData, AssetError> {
        let key = self.key_for(path);
        let record = self
            .resource_dict
            .get(&key)
            .ok_or(AssetError::NotLoaded(key))?;
        Ok(collision::join_hierarchy(record, &self.meshes))
    }

    /// Cached record of an asset, by path or cache key.
    pub fn record(&self, path: &str) -> Option<&LoadedAssetRecord> {
        self.resource_dict.get(&self.key_for(path))
    }

    /// Store ranges, material keys and tree of a loaded asset.
    pub fn mesh_meta_data(&self, path: &str) -> Option<&MeshMetaData> {
        self.record(path).map(|r| &r.meta)
    }

    /// Whether `path` is in the cache. Never triggers a load.
    pub fn is_loaded(&self, path: &str) -> bool {
        self.record(path).is_some()
    }

    /// Number of cached assets, sub-models of houses included.
    pub fn loaded_asset_count(&self) -> usize {
        self.resource_dict.len()
    }

    /// Collision pieces built for `path`, if any.
    pub fn collision_mesh(&self, path: &str) -> Option<&[CollisionMeshData]> {
        self.collision_mesh_groups
            .get(&self.key_for(path))
            .map(Vec::as_slice)
    }

    pub fn collision_group_count(&self) -> usize {
        self.collision_mesh_groups.len()
    }

    /// Shared mesh behind a store handle.
    pub fn mesh(&self, handle: MeshHandle) -> Option<&Arc<MeshAsset>> {
        self.meshes.get(handle)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Shared texture behind a store handle.
    pub fn texture(&self, handle: TextureHandle) -> Option<&Arc<TextureAsset>> {
        self.textures.get(handle)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Standalone primitive or navmesh mesh by id.
    pub fn primitive_mesh(&self, primitive_id: PrimitiveId) -> Option<&Arc<MeshAsset>> {
        self.primitive_meshes.get(&primitive_id)
    }

    /// Live reference to the light setup under `key`.
    ///
    /// Unknown keys get an empty slot that later calls to
    /// [`ResourceManager::set_light_setup`] fill in.
    pub fn light_setup(&mut self, key: &str) -> SetupRef<LightSetup> {
        self.light_setups.get(key)
    }

    /// Replace a light setup; every drawable using `key` sees the change.
    pub fn set_light_setup(&mut self, setup: LightSetup, key: &str) {
        self.light_setups.set(key, setup);
    }

    /// Live reference to the material under `key`, created empty if unknown.
    pub fn material_setup(&mut self, key: &str) -> SetupRef<MaterialRecord> {
        self.material_setups.get(key)
    }

    /// Replace a material; every drawable bound to `key` sees the change.
    pub fn set_material_setup(&mut self, material: MaterialRecord, key: &str) {
        self.material_setups.set(key, material);
    }

    /// Number of material keys holding a value.
    pub fn material_count(&self) -> usize {
        self.material_setups.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use glam::Vec3;
    use tessera_core::{Color, CoordinateFrame};
    use tessera_scene::{NodeTree, SceneGraph};

    use super::*;
    use crate::material::{ImportedChannel, ImportedMaterial};
    use crate::setup::{LightInfo, LightPositionModel};
    use crate::test_support::*;

    const TWO: &str = "/virtual/two.glb";

    fn generic(path: &str) -> AssetInfo {
        AssetInfo::new(AssetType::Generic, path).with_lighting(true)
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let manager = manager_with(MockImporter::new());
        assert_eq!(manager.resolve("/abs/a.glb"), PathBuf::from("/abs/a.glb"));
        assert_eq!(manager.resolve("rel/a.glb"), PathBuf::from("/virtual/rel/a.glb"));
        assert_eq!(manager.resolve("/virtual/a.glb"), PathBuf::from("/virtual/a.glb"));
        assert_eq!(manager.asset_key(&AssetInfo::primitive("cubeSolid")), "cubeSolid");
    }

    #[test]
    fn test_ensure_loaded_imports_once() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let calls = importer.calls();
        let mut manager = manager_with(importer);

        manager.ensure_loaded(&generic(TWO)).unwrap();
        manager.ensure_loaded(&generic("two.glb")).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.loaded_asset_count(), 1);
        assert_eq!(manager.mesh_count(), 1);
        assert_eq!(manager.texture_count(), 2);
    }

    #[test]
    fn test_missing_asset_returns_not_found() {
        let mut manager = manager_with(MockImporter::new());
        match manager.ensure_loaded(&generic("does_not_exist.glb")) {
            Err(AssetError::NotFound(path)) => {
                assert_eq!(path, PathBuf::from("/virtual/does_not_exist.glb"))
            }
            other => panic!("expected NotFound, got: {:?}", other.map(|_| ())),
        }
        assert_eq!(manager.loaded_asset_count(), 0);
    }

    #[test]
    fn test_deferred_load_then_attach() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let mut manager = manager_with(importer);
        let mut graph: SceneGraph<Drawable> = SceneGraph::new();

        let created = manager
            .load_stage_internal(&generic(TWO), None, false, DEFAULT_LIGHTING_KEY)
            .unwrap();
        assert!(created.is_empty());
        assert_eq!(graph.nodes.len(), 1);
        assert!(manager.is_loaded(TWO));

        let created = manager
            .load_stage_internal(
                &generic(TWO),
                Some(AttachTarget::scene_root(&mut graph)),
                false,
                DEFAULT_LIGHTING_KEY,
            )
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.drawables.len(), 1);

        let drawable = graph.drawables.iter().next().unwrap();
        assert_eq!(drawable.node, created[1]);
        assert_eq!(drawable.light_setup_key(), DEFAULT_LIGHTING_KEY);
        assert_eq!(drawable.material_key(), "0");
        let textures = drawable.material.with(|m| m.textures()).unwrap();
        let range = manager.mesh_meta_data(TWO).unwrap().texture_range.clone();
        assert_eq!(range, 0..2);
        assert_eq!(textures.len(), 2);
        assert!(textures.iter().all(|t| range.contains(&t.index())));
    }

    #[test]
    fn test_texture_ranges_stay_disjoint_across_assets() {
        let importer = MockImporter::new()
            .with_scene("/virtual/a.glb", two_component_scene())
            .with_scene("/virtual/b.glb", two_component_scene());
        let mut manager = manager_with(importer);
        manager.ensure_loaded(&generic("a.glb")).unwrap();
        manager.ensure_loaded(&generic("b.glb")).unwrap();

        let b = manager.mesh_meta_data("b.glb").unwrap().clone();
        assert_eq!(b.texture_range, 2..4);
        assert_eq!(b.mesh_range, 1..2);
        let material = manager.material_setup(&b.material_keys[0]);
        let textures = material.with(|m| m.textures()).unwrap();
        assert!(textures.iter().all(|t| b.texture_range.contains(&t.index())));
    }

    #[test]
    fn test_zero_mesh_asset_fails_without_side_effects() {
        let empty = ImportedScene {
            textures: vec![texel()],
            materials: vec![ImportedMaterial::default()],
            roots: Some(Vec::new()),
            ..Default::default()
        };
        let importer = MockImporter::new().with_scene("/virtual/empty.glb", empty);
        let mut manager = manager_with(importer);
        let materials_before = manager.material_count();

        let err = manager.ensure_loaded(&generic("empty.glb")).unwrap_err();
        assert!(matches!(err, AssetError::EmptyAsset(_)));
        assert_eq!(manager.loaded_asset_count(), 0);
        assert_eq!(manager.texture_count(), 0);
        assert_eq!(manager.material_count(), materials_before);
    }

    #[test]
    fn test_mesh_without_geometry_fails_without_side_effects() {
        let void = MeshAsset::new("void", MeshTopology::Triangles, Vec::new(), Vec::new());
        let importer = MockImporter::new()
            .with_scene("/virtual/void.glb", ImportedScene::single_mesh(void));
        let mut manager = manager_with(importer);

        let err = manager.ensure_loaded(&generic("void.glb")).unwrap_err();
        assert!(matches!(err, AssetError::EmptyAsset(_)));
        assert!(!manager.is_loaded("void.glb"));
        assert_eq!(manager.mesh_count(), 0);
    }

    #[test]
    fn test_meshes_without_geometry_are_skipped() {
        let scene = ImportedScene {
            meshes: vec![
                MeshAsset::new("void", MeshTopology::Triangles, Vec::new(), Vec::new()),
                triangle("tri"),
            ],
            objects: vec![
                ImportedObject::new(Mat4::IDENTITY).with_mesh(0, None),
                ImportedObject::new(Mat4::IDENTITY).with_mesh(1, None),
            ],
            roots: Some(vec![0, 1]),
            ..Default::default()
        };
        let mut manager = manager_with(MockImporter::new().with_scene("/virtual/mixed.glb", scene));
        let record = manager.ensure_loaded(&generic("mixed.glb")).unwrap();
        assert_eq!(record.meta.root.mesh_count(), 1);

        let mut graph: SceneGraph<Drawable> = SceneGraph::new();
        manager
            .attach("mixed.glb", &mut AttachTarget::scene_root(&mut graph), DEFAULT_LIGHTING_KEY, false)
            .unwrap();
        assert_eq!(graph.drawables.len(), 1);
        assert_eq!(graph.drawables.iter().next().unwrap().mesh.name, "tri");
    }

    #[test]
    fn test_non_finite_primitive_parameter_is_rejected() {
        let mut manager = manager_with(MockImporter::new());
        let handle = "uvSphereSolid_rings_NaN_segments_32";
        let err = manager.ensure_loaded(&AssetInfo::primitive(handle)).unwrap_err();
        assert!(matches!(err, AssetError::Malformed { .. }));
        assert!(!manager.is_loaded(handle));
        assert_eq!(manager.mesh_count(), 0);
    }

    #[test]
    fn test_attach_under_removed_node_fails() {
        let mut manager = manager_with(MockImporter::new().with_scene(TWO, two_component_scene()));
        manager.ensure_loaded(&generic(TWO)).unwrap();
        let mut nodes = NodeTree::new();
        let removed = nodes.create_child(nodes.root());
        nodes.remove_subtree(removed);

        let err = manager
            .attach(TWO, &mut AttachTarget::new(&mut nodes, removed), DEFAULT_LIGHTING_KEY, false)
            .unwrap_err();
        assert!(matches!(err, AssetError::DeadNode(id) if id == removed));
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_object_under_removed_node_is_not_added() {
        let mut manager = manager_with(MockImporter::new());
        let mut graph: SceneGraph<Drawable> = SceneGraph::new();
        let removed = graph.nodes.create_child(graph.root());
        graph.nodes.remove_subtree(removed);
        let object = ObjectAttributes {
            handle: "crate".into(),
            render_asset: "cubeSolid".into(),
            render_asset_type: Some(AssetType::Primitive),
            ..Default::default()
        };
        let mut visual_nodes = Vec::new();
        let target = AttachTarget {
            nodes: &mut graph.nodes,
            parent: removed,
            drawables: Some(&mut graph.drawables),
        };

        assert!(!manager.add_object_to_drawables(
            &object,
            Some(target),
            &mut visual_nodes,
            DEFAULT_LIGHTING_KEY,
        ));
        assert!(visual_nodes.is_empty());
        assert!(graph.drawables.is_empty());
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn test_meshes_unreachable_from_scene_fail() {
        let mut scene = two_component_scene();
        scene.roots = Some(vec![7]);
        let importer = MockImporter::new().with_scene(TWO, scene);
        let mut manager = manager_with(importer);
        let err = manager.ensure_loaded(&generic(TWO)).unwrap_err();
        assert!(matches!(err, AssetError::EmptyAsset(_)));
        assert_eq!(manager.mesh_count(), 0);
    }

    #[test]
    fn test_broken_material_falls_back_to_white() {
        let mut scene = two_component_scene();
        scene.materials[0].specular = Some(ImportedChannel::textured(Color::WHITE, 5));
        let importer = MockImporter::new().with_scene(TWO, scene);
        let mut manager = manager_with(importer);
        let record = manager.ensure_loaded(&generic(TWO)).unwrap();
        assert_eq!(record.meta.material_keys, vec![WHITE_MATERIAL_KEY.to_string()]);
        assert_eq!(
            record.meta.root.children[0].material_key.as_deref(),
            Some(WHITE_MATERIAL_KEY)
        );
    }

    #[test]
    fn test_nodes_map_one_to_one_with_world_transforms() {
        let importer = MockImporter::new().with_scene("/virtual/chain.glb", chain_scene(3));
        let mut manager = manager_with(importer);
        manager.ensure_loaded(&generic("chain.glb")).unwrap();

        let mut nodes = NodeTree::new();
        let parent = nodes.create_child(nodes.root());
        nodes.set_transformation(parent, Mat4::from_translation(Vec3::Z));
        let mut target = AttachTarget::new(&mut nodes, parent);
        let created = manager
            .attach("chain.glb", &mut target, DEFAULT_LIGHTING_KEY, false)
            .unwrap();

        let tree_nodes = manager.record("chain.glb").unwrap().meta.root.node_count();
        assert_eq!(created.len(), tree_nodes);
        let world: Vec<Vec3> = created
            .iter()
            .map(|&n| nodes.absolute_transformation(n).unwrap().transform_point3(Vec3::ZERO))
            .collect();
        assert_eq!(
            world,
            vec![
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(2.0, 0.0, 1.0),
                Vec3::new(3.0, 0.0, 1.0),
            ]
        );
        // meshes land on their nodes' bounds
        assert!(!nodes.get(created[3]).unwrap().mesh_bb.is_empty());
        assert!(nodes.get(created[0]).unwrap().mesh_bb.is_empty());
    }

    #[test]
    fn test_light_setup_replacement_reaches_drawables() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let mut manager = manager_with(importer);
        let mut graph: SceneGraph<Drawable> = SceneGraph::new();
        manager
            .load_stage_internal(
                &generic(TWO),
                Some(AttachTarget::scene_root(&mut graph)),
                false,
                DEFAULT_LIGHTING_KEY,
            )
            .unwrap();

        let single = vec![LightInfo {
            vector: glam::Vec4::new(0.0, 1.0, 0.0, 1.0),
            color: Vec3::ONE,
            model: LightPositionModel::Global,
        }];
        manager.set_light_setup(single.clone(), DEFAULT_LIGHTING_KEY);

        for drawable in &graph.drawables {
            assert_eq!(drawable.light_setup.cloned(), Some(single.clone()));
        }
    }

    #[test]
    fn test_lit_asset_is_never_drawn_unlit() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let mut manager = manager_with(importer);
        let record = manager.ensure_loaded(&generic(TWO)).unwrap().clone();
        assert!(!ResourceManager::is_light_setup_compatible(&record, NO_LIGHT_KEY));
        assert!(ResourceManager::is_light_setup_compatible(&record, "custom"));

        let mut graph: SceneGraph<Drawable> = SceneGraph::new();
        let mut target = AttachTarget::scene_root(&mut graph);
        manager.attach(TWO, &mut target, NO_LIGHT_KEY, false).unwrap();
        let drawable = graph.drawables.iter().next().unwrap();
        assert_eq!(drawable.light_setup_key(), DEFAULT_LIGHTING_KEY);
    }

    #[test]
    fn test_joined_mesh_counts_every_leaf() {
        let importer = MockImporter::new().with_scene("/virtual/chain.glb", chain_scene(4));
        let mut manager = manager_with(importer);
        manager.ensure_loaded(&generic("chain.glb")).unwrap();

        let joined = manager.create_joined_collision_mesh("chain.glb").unwrap();
        assert_eq!(joined.vbo.len(), 4 * 3);
        assert_eq!(joined.ibo.len(), 4 * 3);
        // fourth link sits at x = 4
        assert_eq!(joined.vbo[9], Vec3::new(4.0, 0.0, 0.0));

        assert!(matches!(
            manager.create_joined_collision_mesh("missing.glb"),
            Err(AssetError::NotLoaded(_))
        ));
    }

    #[test]
    fn test_collision_only_stage_builds_one_group() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let mut manager = manager_with(importer);
        let mut scenes = SceneManager::new();
        let mut ids = ActiveSceneIds {
            render: scenes.init_scene_graph(),
            semantic: None,
        };
        let stage = StageAttributes {
            handle: "stage".into(),
            render_asset: "two.glb".into(),
            semantic_asset: "two_semantic.ply".into(),
            ..Default::default()
        };

        assert!(manager.load_stage(&stage, true, &mut scenes, &mut ids, false));
        assert_eq!(manager.collision_group_count(), 1);
        assert_eq!(manager.collision_mesh(TWO).map(|g| g.len()), Some(1));
        assert_eq!(manager.loaded_asset_count(), 1);
        assert_eq!(ids.semantic, None);
        assert_eq!(scenes.len(), 1);

        let graph = scenes.scene_graph(ids.render).unwrap();
        assert_eq!(graph.drawables.len(), 1);
        // absolute bounds are computed for stages by default
        let drawable = graph.drawables.iter().next().unwrap();
        assert!(graph.nodes.get(drawable.node).unwrap().absolute_aabb.is_some());
    }

    #[test]
    fn test_stage_failure_is_reported() {
        let mut manager = manager_with(MockImporter::new());
        let mut scenes = SceneManager::new();
        let mut ids = ActiveSceneIds {
            render: scenes.init_scene_graph(),
            semantic: None,
        };
        let stage = StageAttributes {
            render_asset: "nowhere.glb".into(),
            ..Default::default()
        };
        assert!(!manager.load_stage(&stage, true, &mut scenes, &mut ids, false));
        assert_eq!(manager.collision_group_count(), 0);
    }

    #[test]
    fn test_stage_frame_rotates_the_asset_root() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let mut manager = manager_with(importer);
        let mut scenes = SceneManager::new();
        let mut ids = ActiveSceneIds {
            render: scenes.init_scene_graph(),
            semantic: None,
        };
        let stage = StageAttributes {
            render_asset: TWO.into(),
            frame: CoordinateFrame::new(Vec3::Z, Vec3::Y, Vec3::ZERO),
            ..Default::default()
        };
        assert!(manager.load_stage(&stage, false, &mut scenes, &mut ids, false));

        let graph = scenes.scene_graph(ids.render).unwrap();
        let asset_root = graph.nodes.get(graph.root()).unwrap().children()[0];
        let rotation = graph.nodes.transformation(asset_root).unwrap();
        let up = rotation.transform_vector3(Vec3::Z);
        assert!((up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_semantic_mesh_loads_into_its_own_scene() {
        let semantic = triangle("sem").with_object_ids(vec![4, 4, 4]);
        let mut quad = MeshAsset::new(
            "quad",
            MeshTopology::Triangles,
            vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2, 2, 3, 0],
        );
        quad.object_ids = Some(vec![7, 7, 9, 9]);
        let instances = MockImporter::new()
            .with_scene("/virtual/sem.ply", ImportedScene::single_mesh(quad))
            .with_scene("/virtual/render.ply", ImportedScene::single_mesh(semantic));
        let mut manager = manager_with_instances(instances);
        let mut scenes = SceneManager::new();
        let mut ids = ActiveSceneIds {
            render: scenes.init_scene_graph(),
            semantic: None,
        };
        let stage = StageAttributes {
            render_asset: "render.ply".into(),
            semantic_asset: "sem.ply".into(),
            requires_lighting: false,
            ..Default::default()
        };

        assert!(manager.load_stage(&stage, false, &mut scenes, &mut ids, true));
        let semantic_scene = ids.semantic.unwrap();
        assert_ne!(semantic_scene, ids.render);

        let graph = scenes.scene_graph(semantic_scene).unwrap();
        assert_eq!(graph.drawables.len(), 2);
        let ids_in_scene: Vec<u32> = graph
            .drawables
            .iter()
            .map(|d| graph.nodes.get(d.node).unwrap().semantic_id)
            .collect();
        assert_eq!(ids_in_scene, vec![7, 9]);
        for drawable in &graph.drawables {
            assert_eq!(drawable.material_key(), PER_VERTEX_OBJECT_ID_MATERIAL_KEY);
            assert_eq!(drawable.light_setup_key(), NO_LIGHT_KEY);
        }
    }

    #[test]
    fn test_same_semantic_and_render_file_shares_the_scene() {
        let instances = MockImporter::new().with_scene(
            "/virtual/room.ply",
            ImportedScene::single_mesh(triangle("room").with_object_ids(vec![1, 1, 1])),
        );
        let mut manager = manager_with_instances(instances);
        let mut scenes = SceneManager::new();
        let mut ids = ActiveSceneIds {
            render: scenes.init_scene_graph(),
            semantic: None,
        };
        let stage = StageAttributes {
            render_asset: "room.ply".into(),
            semantic_asset: "room.ply".into(),
            ..Default::default()
        };
        assert!(manager.load_stage(&stage, false, &mut scenes, &mut ids, true));
        assert_eq!(ids.semantic, Some(ids.render));
        assert_eq!(scenes.len(), 1);
    }

    #[test]
    fn test_unsplit_instance_mesh_stays_whole() {
        let mut quad = triangle("tri");
        quad.object_ids = Some(vec![1, 2, 3]);
        let instances =
            MockImporter::new().with_scene("/virtual/whole.ply", ImportedScene::single_mesh(quad));
        let mut manager = manager_with_instances(instances);
        let info = AssetInfo::new(AssetType::InstanceMesh, "whole.ply").with_split(false);
        let record = manager.ensure_loaded(&info).unwrap();
        assert_eq!(record.meta.root.meshes.len(), 1);
        assert!(record.meta.root.children.is_empty());
    }

    #[test]
    fn test_object_gets_scaling_node() {
        let mut manager = manager_with(MockImporter::new());
        let mut graph: SceneGraph<Drawable> = SceneGraph::new();
        let object = ObjectAttributes {
            handle: "crate".into(),
            render_asset: "cubeSolid".into(),
            render_asset_type: Some(AssetType::Primitive),
            scale: Vec3::splat(2.0),
            ..Default::default()
        };
        let mut visual_nodes = Vec::new();

        assert!(manager.add_object_to_drawables(
            &object,
            Some(AttachTarget::scene_root(&mut graph)),
            &mut visual_nodes,
            DEFAULT_LIGHTING_KEY,
        ));
        assert_eq!(visual_nodes.len(), 2);
        assert_eq!(graph.drawables.len(), 1);
        let bb = graph.nodes.cumulative_bb(visual_nodes[0]);
        let scaled = bb.transformed(&graph.nodes.transformation(visual_nodes[0]).unwrap());
        assert_eq!(scaled.max, Vec3::splat(2.0));
        assert_eq!(scaled.min, Vec3::splat(-2.0));
    }

    #[test]
    fn test_object_without_target_only_loads() {
        let mut manager = manager_with(MockImporter::new().with_scene(TWO, two_component_scene()));
        let object = ObjectAttributes {
            render_asset: TWO.into(),
            ..Default::default()
        };
        let mut visual_nodes = Vec::new();
        assert!(manager.add_object_to_drawables(&object, None, &mut visual_nodes, NO_LIGHT_KEY));
        assert!(visual_nodes.is_empty());
        assert_eq!(manager.collision_group_count(), 1);
    }

    #[test]
    fn test_default_primitives_load() {
        let mut manager = manager_with(MockImporter::new());
        assert_eq!(manager.init_default_prim_attributes(), DEFAULT_PRIMITIVE_HANDLES.len());
        assert!(manager.is_loaded("cubeSolid"));
    }

    #[test]
    fn test_removed_primitive_mesh_outlives_its_drawables() {
        let mut manager = manager_with(MockImporter::new());
        let id = manager.create_primitive_mesh("cubeWireframe").unwrap();
        let mut graph: SceneGraph<Drawable> = SceneGraph::new();
        let node = graph.nodes.create_child(graph.root());
        assert!(manager.add_primitive_to_drawables(id, node, &mut graph.drawables));

        assert!(manager.remove_primitive_mesh(id));
        assert!(manager.primitive_mesh(id).is_none());
        assert!(!manager.remove_primitive_mesh(id));
        assert!(!manager.add_primitive_to_drawables(id, node, &mut graph.drawables));
        let drawable = graph.drawables.iter().next().unwrap();
        assert_eq!(drawable.mesh.topology, MeshTopology::Lines);
        assert_eq!(drawable.material_key(), WHITE_MATERIAL_KEY);
    }

    #[test]
    fn test_nav_mesh_visualization() {
        let mut manager = manager_with(MockImporter::new());
        assert!(manager
            .load_nav_mesh_visualization(&NavMeshGeometry::default(), None)
            .is_none());

        let geometry = NavMeshGeometry {
            vertices: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            indices: vec![0, 1, 2],
        };
        let mut graph: SceneGraph<Drawable> = SceneGraph::new();
        let id = manager
            .load_nav_mesh_visualization(&geometry, Some(AttachTarget::scene_root(&mut graph)))
            .unwrap();
        let mesh = manager.primitive_mesh(id).unwrap();
        assert_eq!(mesh.topology, MeshTopology::Lines);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(graph.drawables.len(), 1);
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_house_composes_cached_models() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let calls = importer.calls();
        let mut manager = manager_with(importer);
        let path = temp_path("house.json");
        std::fs::write(
            &path,
            format!(
                r#"{{"id": "h", "nodes": [
                    {{"id": "a", "model": "{TWO}", "semantic_id": 3,
                      "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 5,0,0,1]}},
                    {{"id": "b", "model": "{TWO}"}},
                    {{"id": "c", "model": "/virtual/missing.glb"}}
                ]}}"#
            ),
        )
        .unwrap();

        let info = AssetInfo::new(AssetType::LegacyHouse, path.to_string_lossy());
        let root = manager.ensure_loaded(&info).unwrap().meta.root.clone();
        std::fs::remove_file(&path).ok();

        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].semantic_id, Some(3));
        let placed = root.walk(Mat4::IDENTITY)[2].1.transform_point3(Vec3::ZERO);
        assert_eq!(placed, Vec3::new(5.0, 1.0, 0.0));
        // two.glb imported once, the missing model attempted once
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(manager.is_loaded(TWO));
        assert_eq!(manager.loaded_asset_count(), 2);
    }

    #[test]
    fn test_height_field_tiles_become_drawables() {
        let path = temp_path("terrain.png");
        image::GrayImage::from_fn(9, 9, |x, _| image::Luma([(x * 30) as u8]))
            .save(&path)
            .unwrap();

        let mut config = config();
        config.height_field.tile_size = 4;
        let mut manager = ResourceManager::new(config);
        let info = AssetInfo::new(AssetType::HeightField, path.to_string_lossy());
        let mut graph: SceneGraph<Drawable> = SceneGraph::new();
        let created = manager
            .load_stage_internal(
                &info,
                Some(AttachTarget::scene_root(&mut graph)),
                true,
                NO_LIGHT_KEY,
            )
            .unwrap();
        std::fs::remove_file(&path).ok();

        // 8x8 cells in 4x4 tiles
        assert_eq!(graph.drawables.len(), 4);
        assert_eq!(created.len(), 5);
        for drawable in &graph.drawables {
            assert!(drawable.submesh.is_some());
            assert_eq!(drawable.index_count(), 4 * 4 * 6);
            let node = graph.nodes.get(drawable.node).unwrap();
            assert!(node.absolute_aabb.is_some());
        }
    }

    #[test]
    fn test_textures_can_be_disabled() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let mut manager = manager_with(importer);
        manager.set_requires_textures(false);
        let record = manager.ensure_loaded(&generic(TWO)).unwrap();
        assert!(record.meta.texture_range.is_empty());
        let key = record.meta.material_keys[0].clone();
        let material = manager.material_setup(&key);
        assert_eq!(material.with(|m| m.textures().len()), Some(0));
        assert_eq!(manager.texture_count(), 0);
    }

    #[test]
    fn test_unlit_assets_get_flat_materials() {
        let importer = MockImporter::new().with_scene(TWO, two_component_scene());
        let mut manager = manager_with(importer);
        let info = AssetInfo::new(AssetType::Generic, TWO);
        let key = manager.ensure_loaded(&info).unwrap().meta.material_keys[0].clone();
        let material = manager.material_setup(&key);
        assert_eq!(
            material.with(|m| m.shading_model()),
            Some(crate::material::ShadingModel::Flat)
        );
    }
}
