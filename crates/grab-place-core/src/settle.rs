//! Height settling onto quantised floor targets
//!
//! The settler is idle until a raycast reports a floor height (in whole
//! centimetres) that differs from the stored target. While converging it moves
//! the object at constant vertical speed and snaps exactly onto the target once
//! within the tolerance band, so it never overshoots and always terminates.

use tracing::{debug, info};

use crate::config::{DEFAULT_SETTLE_TOLERANCE, DEFAULT_SPEED_VERTICAL};
use crate::spatial::{from_centimeters, to_centimeters};

/// Settler state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleState {
    Idle,
    Converging,
}

/// Current floor target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightTarget {
    pub target_centimeters: i32,
    pub is_converging: bool,
}

impl HeightTarget {
    pub fn target_height(&self) -> f32 {
        from_centimeters(self.target_centimeters)
    }
}

#[derive(Debug, Clone)]
pub struct HeightSettler {
    base_height: f32,
    target: HeightTarget,
    speed: f32,
    tolerance: f32,
}

impl HeightSettler {
    /// Settler with the stock speed and one centimetre tolerance
    pub fn new(base_height: f32) -> Self {
        Self::with_params(base_height, DEFAULT_SPEED_VERTICAL, DEFAULT_SETTLE_TOLERANCE)
    }

    pub fn with_params(base_height: f32, speed: f32, tolerance: f32) -> Self {
        Self {
            base_height,
            target: HeightTarget {
                target_centimeters: to_centimeters(base_height),
                is_converging: false,
            },
            speed,
            tolerance,
        }
    }

    pub fn state(&self) -> SettleState {
        if self.target.is_converging {
            SettleState::Converging
        } else {
            SettleState::Idle
        }
    }

    pub fn target(&self) -> HeightTarget {
        self.target
    }

    pub fn base_height(&self) -> f32 {
        self.base_height
    }

    /// Record a floor hit. Returns true if this started (or retargeted) a settle.
    pub fn apply_hit(&mut self, hit_centimeters: i32) -> bool {
        if hit_centimeters == self.target.target_centimeters {
            return false;
        }
        debug!(
            from = self.target.target_centimeters,
            to = hit_centimeters,
            "new floor target"
        );
        self.target.target_centimeters = hit_centimeters;
        self.target.is_converging = true;
        true
    }

    /// Advance one tick from `current` height; returns the new height.
    pub fn step(&mut self, current: f32, delta_time: f32) -> f32 {
        if !self.target.is_converging {
            return current;
        }

        let target = self.target.target_height();
        if (target - current).abs() <= self.tolerance {
            return self.finish(target);
        }

        let travel = self.speed * delta_time;
        if current <= target {
            let next = current + travel;
            if target - next <= self.tolerance {
                return self.finish(target);
            }
            next
        } else {
            let next = current - travel;
            if next - target <= self.tolerance {
                return self.finish(target);
            }
            next
        }
    }

    /// Abort any settle; the object goes straight back to the base height.
    ///
    /// The stored target is kept: only a hit that differs from it starts a
    /// new settle.
    pub fn cancel(&mut self) -> f32 {
        if self.target.is_converging {
            debug!("settle cancelled");
        }
        self.target.is_converging = false;
        self.base_height
    }

    fn finish(&mut self, target: f32) -> f32 {
        self.target.is_converging = false;
        info!(height = target, "settled on floor");
        target
    }
}
