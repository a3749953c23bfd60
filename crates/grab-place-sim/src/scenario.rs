//! Scenario files: scripted input timelines plus the simulated environment
//!
//! ```toml
//! name = "settle onto a raised floor"
//! ticks = 120
//! dt = 0.016666668
//! raycast_latency = 2
//!
//! [start]
//! x = 0.0
//! y = 1.0
//! z = 0.0
//!
//! [config]
//! speed_vertical = 0.3
//!
//! [[gestures]]
//! from = 60
//! to = 90
//! keypose = "fist"
//! confidence = 0.9
//!
//! [floor]
//! fallback_height = 0.2
//! ```
//!
//! Timeline spans are half-open tick ranges `[from, to)`. Where spans
//! overlap the last one listed wins.

use std::fs;
use std::path::Path;

use grab_place_core::{ControllerConfig, DetectedPlane, Keypose, KeyposeSample, Point3D};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SimError};
use crate::floor::FloorMap;

pub const DEFAULT_TICKS: u32 = 120;
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Half-open tick range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub from: u32,
    pub to: u32,
}

impl Span {
    pub fn contains(&self, tick: u32) -> bool {
        tick >= self.from && tick < self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureSpan {
    pub from: u32,
    pub to: u32,
    pub keypose: Keypose,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

impl GestureSpan {
    pub fn span(&self) -> Span {
        Span {
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StickSpan {
    pub from: u32,
    pub to: u32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl StickSpan {
    pub fn span(&self) -> Span {
        Span {
            from: self.from,
            to: self.to,
        }
    }
}

/// Which simulated service refuses to start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimService {
    Hands,
    Controller,
    Planes,
    Raycast,
}

impl SimService {
    pub fn name(&self) -> &'static str {
        match self {
            SimService::Hands => "hands",
            SimService::Controller => "controller",
            SimService::Planes => "planes",
            SimService::Raycast => "raycast",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub ticks: u32,
    pub dt: f32,
    /// Ticks between issuing a raycast and its response
    pub raycast_latency: u32,
    /// The spatial service swallows every raycast
    pub raycast_silent: bool,
    pub start: Point3D,
    pub config: ControllerConfig,
    /// Hand reading outside every span
    pub idle_gesture: KeyposeSample,
    pub gestures: Vec<GestureSpan>,
    pub stick: Vec<StickSpan>,
    /// Spans during which the analog controller is unplugged
    pub disconnects: Vec<Span>,
    pub floor: FloorMap,
    pub planes: Vec<DetectedPlane>,
    /// Fail the plane query with this message
    pub plane_error: Option<String>,
    pub fail_start: Option<SimService>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            ticks: DEFAULT_TICKS,
            dt: DEFAULT_DT,
            raycast_latency: 0,
            raycast_silent: false,
            start: Point3D::ORIGIN,
            config: ControllerConfig::default(),
            idle_gesture: KeyposeSample::new(Keypose::OpenHand, 1.0),
            gestures: Vec::new(),
            stick: Vec::new(),
            disconnects: Vec::new(),
            floor: FloorMap::default(),
            planes: Vec::new(),
            plane_error: None,
            fail_start: None,
        }
    }
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), name = %scenario.name, "loaded scenario");
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::Invalid(format!("dt must be positive, got {}", self.dt)));
        }
        let spans = self
            .gestures
            .iter()
            .map(GestureSpan::span)
            .chain(self.stick.iter().map(StickSpan::span))
            .chain(self.disconnects.iter().copied());
        for span in spans {
            if span.from >= span.to {
                return Err(SimError::Invalid(format!(
                    "empty span {}..{}",
                    span.from, span.to
                )));
            }
        }
        self.config.validate()?;
        Ok(())
    }

    pub fn gesture_at(&self, tick: u32) -> KeyposeSample {
        self.gestures
            .iter()
            .rev()
            .find(|g| g.span().contains(tick))
            .map(|g| KeyposeSample::new(g.keypose, g.confidence))
            .unwrap_or(self.idle_gesture)
    }

    pub fn stick_at(&self, tick: u32) -> (f32, f32) {
        self.stick
            .iter()
            .rev()
            .find(|s| s.span().contains(tick))
            .map(|s| (s.x, s.y))
            .unwrap_or((0.0, 0.0))
    }

    pub fn connected_at(&self, tick: u32) -> bool {
        !self.disconnects.iter().any(|d| d.contains(tick))
    }
}
