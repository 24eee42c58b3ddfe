//! Coordinate frames describing how an asset was authored

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Up/front axes and origin of an asset's authoring frame.
///
/// World space is Y-up with -Z as the front direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateFrame {
    pub up: Vec3,
    pub front: Vec3,
    pub origin: Vec3,
}

impl Default for CoordinateFrame {
    fn default() -> Self {
        Self {
            up: Vec3::Y,
            front: Vec3::NEG_Z,
            origin: Vec3::ZERO,
        }
    }
}

impl CoordinateFrame {
    /// Frame from its up and front axes and origin.
    pub fn new(up: Vec3, front: Vec3, origin: Vec3) -> Self {
        Self { up, front, origin }
    }

    /// Rotation taking this frame's `up` to +Y and `front` to -Z.
    ///
    /// Degenerate frames (parallel or zero axes) yield the identity.
    pub fn rotation_frame_to_world(&self) -> Quat {
        let up = self.up.normalize_or_zero();
        let front = self.front.normalize_or_zero();
        let right = front.cross(up);
        if right.length_squared() < 1e-8 {
            return Quat::IDENTITY;
        }
        let right = right.normalize();
        // re-orthogonalize front against up
        let front = up.cross(right);
        let frame = Mat3::from_cols(right, up, front);
        let world = Mat3::from_cols(Vec3::X, Vec3::Y, Vec3::NEG_Z);
        Quat::from_mat3(&(world * frame.transpose())).normalize()
    }
}
