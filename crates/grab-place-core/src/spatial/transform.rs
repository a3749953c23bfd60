//! Position, rotation and scale of a placed marker

use serde::{Deserialize, Serialize};

use super::{Point3D, Quaternion, Vector3D};

/// A complete 3D transform (position + rotation + scale)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point3D,
    pub rotation: Quaternion,
    pub scale: Vector3D,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point3D::ORIGIN,
            rotation: Quaternion::IDENTITY,
            scale: Vector3D::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Point3D, rotation: Quaternion, scale: Vector3D) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }
}
