//! Analog stick to planar motion

use crate::config::DEFAULT_SPEED_HORIZONTAL;

/// Maps 2-axis analog input to an XZ displacement
#[derive(Debug, Clone, Copy)]
pub struct PlanarInputMapper {
    /// Metres per second at full deflection
    speed: f32,
}

impl Default for PlanarInputMapper {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED_HORIZONTAL)
    }
}

impl PlanarInputMapper {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    /// Displacement `(dx, dz)` for this tick.
    ///
    /// Stick X drives world X and stick Y drives world Z. Input is ignored
    /// while the object is held.
    pub fn compute_delta(&self, axis_x: f32, axis_y: f32, delta_time: f32, is_held: bool) -> (f32, f32) {
        if is_held {
            return (0.0, 0.0);
        }
        (
            self.speed * axis_x * delta_time,
            self.speed * axis_y * delta_time,
        )
    }
}
