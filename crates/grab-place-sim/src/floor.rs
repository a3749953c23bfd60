//! Static floor geometry answering downward raycasts

use grab_place_core::{Point3D, RaycastOutcome, RaycastRequest, Vector3D};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle of floor at a fixed height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorRegion {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
    /// World height of the surface
    pub height: f32,
    /// Confidence reported with hits on this region
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl FloorRegion {
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorMap {
    /// Checked in order; the first region containing the raycast wins
    #[serde(default)]
    pub regions: Vec<FloorRegion>,
    /// Height used under no region; `None` means the raycast finds nothing
    #[serde(default)]
    pub fallback_height: Option<f32>,
}

impl FloorMap {
    pub fn region_at(&self, x: f32, z: f32) -> Option<&FloorRegion> {
        self.regions.iter().find(|r| r.contains(x, z))
    }

    /// Only straight-down raycasts are answered; the floor is never above the
    /// raycast origin.
    pub fn cast(&self, request: &RaycastRequest) -> RaycastOutcome {
        if request.direction != Vector3D::DOWN {
            return RaycastOutcome::RequestFailed;
        }
        let origin = request.origin;
        let (height, confidence) = match self.region_at(origin.x, origin.z) {
            Some(region) => (region.height, region.confidence),
            None => match self.fallback_height {
                Some(height) => (height, default_confidence()),
                None => return RaycastOutcome::NoCollision,
            },
        };
        if height > origin.y {
            return RaycastOutcome::NoCollision;
        }
        RaycastOutcome::Hit {
            point: Point3D::new(origin.x, height, origin.z),
            normal: Vector3D::UP,
            confidence,
        }
    }
}
