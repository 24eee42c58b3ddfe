//! Tessera Core - Shared math types for the Tessera asset pipeline
//!
//! This crate provides the foundational types used by the scene graph and
//! the asset pipeline:
//! - Mathematical primitives (re-exported from glam)
//! - Transform and color types
//! - Axis-aligned bounding boxes
//! - Coordinate frames for re-orienting imported assets

pub mod bounds;
pub mod frame;
pub mod types;

pub use bounds::Aabb;
pub use frame::CoordinateFrame;
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
pub use types::{Color, Transform};
