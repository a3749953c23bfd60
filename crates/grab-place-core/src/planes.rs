//! Plane detection results and the static markers placed on them
//!
//! Planes are queried once at startup. Each detected plane becomes a marker
//! whose transform positions a unit quad over the plane: centre, plane
//! rotation and a `(width, height, 1)` scale. Markers play no part in the
//! grab or settle logic.

use serde::{Deserialize, Serialize};

use crate::spatial::{Point3D, Quaternion, Transform, Vector3D};

bitflags::bitflags! {
    /// Filters for the plane query
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PlaneQueryFlags: u32 {
        const VERTICAL = 1 << 0;
        const HORIZONTAL = 1 << 1;
        const ARBITRARY = 1 << 2;
        const ORIENT_TO_GRAVITY = 1 << 3;
        const SEMANTIC_CEILING = 1 << 4;
        const SEMANTIC_FLOOR = 1 << 5;
        const SEMANTIC_WALL = 1 << 6;
    }
}

/// Parameters handed to the plane service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneQuery {
    pub flags: PlaneQueryFlags,
    pub max_results: u32,
}

/// A plane reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedPlane {
    pub center: Point3D,
    #[serde(default)]
    pub rotation: Quaternion,
    pub width: f32,
    pub height: f32,
}

/// Static visual marker for one detected plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaneMarker {
    pub index: usize,
    pub transform: Transform,
}

impl PlaneMarker {
    pub fn from_plane(index: usize, plane: &DetectedPlane) -> Self {
        Self {
            index,
            transform: Transform::new(
                plane.center,
                plane.rotation,
                Vector3D::new(plane.width, plane.height, 1.0),
            ),
        }
    }
}

/// Markers for a plane query result, capped at `max_results`
pub fn markers_from_planes(planes: &[DetectedPlane], max_results: u32) -> Vec<PlaneMarker> {
    planes
        .iter()
        .take(max_results as usize)
        .enumerate()
        .map(|(index, plane)| PlaneMarker::from_plane(index, plane))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(x: f32, width: f32, height: f32) -> DetectedPlane {
        DetectedPlane {
            center: Point3D::new(x, 0.0, 2.0),
            rotation: Quaternion::new(-0.7071, 0.0, 0.0, 0.7071),
            width,
            height,
        }
    }

    #[test]
    fn test_marker_transform() {
        let p = plane(1.5, 2.0, 0.5);
        let marker = PlaneMarker::from_plane(3, &p);
        assert_eq!(marker.index, 3);
        assert_eq!(marker.transform.position, p.center);
        assert_eq!(marker.transform.rotation, p.rotation);
        assert_eq!(marker.transform.scale, Vector3D::new(2.0, 0.5, 1.0));
    }

    #[test]
    fn test_markers_capped() {
        let planes: Vec<_> = (0..8).map(|i| plane(i as f32, 1.0, 1.0)).collect();
        let markers = markers_from_planes(&planes, 5);
        assert_eq!(markers.len(), 5);
        assert_eq!(markers[4].transform.position.x, 4.0);
    }

    #[test]
    fn test_flags_from_toml_text() {
        #[derive(Deserialize)]
        struct Wrapper {
            flags: PlaneQueryFlags,
        }
        let parsed: Wrapper = toml::from_str(r#"flags = "HORIZONTAL | SEMANTIC_FLOOR""#).unwrap();
        assert_eq!(
            parsed.flags,
            PlaneQueryFlags::HORIZONTAL | PlaneQueryFlags::SEMANTIC_FLOOR
        );
    }
}
