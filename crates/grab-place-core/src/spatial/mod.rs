//! Spatial primitives for object placement
//!
//! Uses the host's world coordinate system:
//! - X: Right (+) / Left (-)
//! - Y: Up (+) / Down (-)
//! - Z: Forward (+) / Backward (-)
//!
//! Heights are metres; floor targets are quantised to whole centimetres.

mod point3d;
mod vector3d;
mod quaternion;
mod transform;

pub use point3d::Point3D;
pub use vector3d::Vector3D;
pub use quaternion::Quaternion;
pub use transform::Transform;

/// Metres to whole centimetres, truncating toward zero
pub fn to_centimeters(meters: f32) -> i32 {
    (meters * 100.0).trunc() as i32
}

/// Whole centimetres back to metres
pub fn from_centimeters(centimeters: i32) -> f32 {
    centimeters as f32 / 100.0
}
