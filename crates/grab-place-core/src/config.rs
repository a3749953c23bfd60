//! Controller configuration
//!
//! Every field defaults to the tuned constants below, so an empty TOML
//! document (or no file at all) yields the stock behaviour.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::input::{Hand, Keypose};
use crate::planes::PlaneQueryFlags;

/// Keypose that counts as a grab
pub const DEFAULT_KEYPOSE: Keypose = Keypose::Fist;
/// Hand whose keypose is sampled
pub const DEFAULT_HAND: Hand = Hand::Right;
/// Classifier confidence must be strictly above this
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
/// Analog control read for planar movement (touchpad)
pub const DEFAULT_CONTROL_INDEX: u32 = 0;
/// Planar speed, metres per second at full deflection
pub const DEFAULT_SPEED_HORIZONTAL: f32 = 0.3;
/// Settling speed, metres per second
pub const DEFAULT_SPEED_VERTICAL: f32 = 0.3;
/// Settle snap band, metres (one centimetre)
pub const DEFAULT_SETTLE_TOLERANCE: f32 = 0.01;
/// Upper bound on planes requested at startup
pub const DEFAULT_MAX_PLANES: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub keypose: Keypose,
    pub hand: Hand,
    pub confidence_threshold: f32,
    pub control_index: u32,
    pub speed_horizontal: f32,
    pub speed_vertical: f32,
    pub settle_tolerance: f32,
    pub max_planes: u32,
    pub plane_flags: PlaneQueryFlags,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            keypose: DEFAULT_KEYPOSE,
            hand: DEFAULT_HAND,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            control_index: DEFAULT_CONTROL_INDEX,
            speed_horizontal: DEFAULT_SPEED_HORIZONTAL,
            speed_vertical: DEFAULT_SPEED_VERTICAL,
            settle_tolerance: DEFAULT_SETTLE_TOLERANCE,
            max_planes: DEFAULT_MAX_PLANES,
            plane_flags: PlaneQueryFlags::HORIZONTAL | PlaneQueryFlags::SEMANTIC_FLOOR,
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading controller config");
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid("confidence_threshold", "must be within [0, 1]"));
        }
        positive("speed_horizontal", self.speed_horizontal)?;
        positive("speed_vertical", self.speed_vertical)?;
        positive("settle_tolerance", self.settle_tolerance)?;
        if self.max_planes == 0 {
            return Err(invalid("max_planes", "must be at least 1"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be a positive number, got {value}")))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
