//! Keyed light and material setups shared by reference with drawables.
//!
//! A drawable stores a [`SetupRef`] rather than a copy of its setup, so
//! replacing the value under a key is seen by every drawable using it on
//! its next read.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use glam::{Vec3, Vec4};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};

/// Light setup key for drawables rendered without lighting.
pub const NO_LIGHT_KEY: &str = "no_lights";
/// Light setup key used when an asset asks for lighting.
pub const DEFAULT_LIGHTING_KEY: &str = "";
/// Material key for meshes that come without a material.
pub const DEFAULT_MATERIAL_KEY: &str = "";
/// Flat white material, the fallback for materials that fail to build.
pub const WHITE_MATERIAL_KEY: &str = "ambient_white";
/// Flat material colored from per-vertex semantic ids.
pub const PER_VERTEX_OBJECT_ID_MATERIAL_KEY: &str = "per_vertex_object_id";

/// Space a light's position or direction is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightPositionModel {
    Global,
    Camera,
    Object,
}

/// A single light. `vector.w == 0` marks a directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightInfo {
    pub vector: Vec4,
    pub color: Vec3,
    pub model: LightPositionModel,
}

pub type LightSetup = Vec<LightInfo>;

/// Two camera-relative directional lights, key and fill.
pub fn default_light_setup() -> LightSetup {
    vec![
        LightInfo {
            vector: Vec4::new(1.0, 1.0, 0.0, 0.0),
            color: Vec3::splat(0.75),
            model: LightPositionModel::Camera,
        },
        LightInfo {
            vector: Vec4::new(-0.5, 0.0, 1.0, 0.0),
            color: Vec3::splat(0.4),
            model: LightPositionModel::Camera,
        },
    ]
}

type Slot<T> = Arc<RwLock<Option<T>>>;

/// Shared handle to the value stored under one registry key.
pub struct SetupRef<T> {
    key: Arc<str>,
    slot: Slot<T>,
}

impl<T> SetupRef<T> {
    /// Registry key this ref is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a value has been stored under this key yet.
    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Read the current value, if any.
    pub fn get(&self) -> Option<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.slot.read(), |value| value.as_ref()).ok()
    }

    /// Run `f` on the current value, if any.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.slot.read().as_ref().map(f)
    }
}

impl<T: Clone> SetupRef<T> {
    /// Snapshot of the current value.
    pub fn cloned(&self) -> Option<T> {
        self.slot.read().clone()
    }
}

impl<T> Clone for SetupRef<T> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for SetupRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupRef")
            .field("key", &self.key)
            .field("set", &self.is_set())
            .finish()
    }
}

/// Registry of named setups.
pub struct SetupRegistry<T> {
    slots: HashMap<String, (Arc<str>, Slot<T>)>,
}

impl<T> SetupRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Reference to the slot for `key`, creating an empty slot if needed.
    pub fn get(&mut self, key: &str) -> SetupRef<T> {
        let (key, slot) = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| (Arc::from(key), Arc::new(RwLock::new(None))));
        SetupRef {
            key: Arc::clone(key),
            slot: Arc::clone(slot),
        }
    }

    /// Store `value` under `key`, replacing it in place for all holders.
    pub fn set(&mut self, key: &str, value: T) {
        let setup = self.get(key);
        *setup.slot.write() = Some(value);
    }

    /// Whether a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.slots
            .get(key)
            .is_some_and(|(_, slot)| slot.read().is_some())
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .filter(|(_, slot)| slot.read().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for SetupRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
