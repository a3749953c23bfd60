//! Hand keypose classifier types

use serde::{Deserialize, Serialize};

/// Which hand is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

/// Static hand poses reported by the host classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keypose {
    /// Closed fist
    Fist,
    /// Thumb and index finger together
    Pinch,
    /// Index finger extended
    Finger,
    /// All fingers extended
    OpenHand,
    /// Thumb up
    Thumb,
    /// Thumb and index forming a ring
    Ok,
    /// Hand tracked, no recognised pose
    NoPose,
    /// Hand not tracked
    NoHand,
}

impl Keypose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keypose::Fist => "fist",
            Keypose::Pinch => "pinch",
            Keypose::Finger => "finger",
            Keypose::OpenHand => "open_hand",
            Keypose::Thumb => "thumb",
            Keypose::Ok => "ok",
            Keypose::NoPose => "no_pose",
            Keypose::NoHand => "no_hand",
        }
    }
}

/// One classifier reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyposeSample {
    pub keypose: Keypose,
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f32,
}

impl KeyposeSample {
    pub fn new(keypose: Keypose, confidence: f32) -> Self {
        Self { keypose, confidence }
    }

    /// No hand in view
    pub fn absent() -> Self {
        Self::new(Keypose::NoHand, 0.0)
    }
}

impl Default for KeyposeSample {
    fn default() -> Self {
        Self::absent()
    }
}
