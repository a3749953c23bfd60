//! Debounced grab state from keypose classifier readings

use tracing::debug;

use super::{Keypose, KeyposeSample};
use crate::config::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_KEYPOSE};

/// Internal memory of the debouncer
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    /// Debounced grab state
    pub is_held: bool,
    /// Confidence of the latest reading
    pub confidence: f32,
    /// Raw keypose match of the latest reading
    pub previous_raw_keypose: bool,
    /// True until the first reading has been observed
    pub is_first_sample: bool,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            is_held: false,
            confidence: 0.0,
            previous_raw_keypose: false,
            is_first_sample: true,
        }
    }
}

/// Result of one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureObservation {
    pub is_held: bool,
    /// Held state changed on this reading
    pub transitioned: bool,
}

/// Turns confidence-scored keypose readings into a held state with edges
#[derive(Debug, Clone)]
pub struct GestureDebouncer {
    target: Keypose,
    threshold: f32,
    state: GestureState,
}

impl Default for GestureDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_KEYPOSE, DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl GestureDebouncer {
    pub fn new(target: Keypose, threshold: f32) -> Self {
        Self {
            target,
            threshold,
            state: GestureState::default(),
        }
    }

    /// Observe a classifier reading for the designated hand
    pub fn observe_sample(&mut self, sample: &KeyposeSample) -> GestureObservation {
        self.observe(sample.keypose == self.target, sample.confidence)
    }

    /// Observe a raw match and its confidence.
    ///
    /// The first reading always reports a transition: the remembered state is
    /// primed with the opposite of the first detection.
    pub fn observe(&mut self, raw_keypose: bool, confidence: f32) -> GestureObservation {
        let detected = raw_keypose && confidence > self.threshold;
        self.state.previous_raw_keypose = raw_keypose;
        self.state.confidence = confidence;

        if self.state.is_first_sample {
            self.state.is_first_sample = false;
            self.state.is_held = !detected;
        }

        let transitioned = detected != self.state.is_held;
        if transitioned {
            debug!(held = detected, confidence, "grab state changed");
            self.state.is_held = detected;
        }

        GestureObservation {
            is_held: self.state.is_held,
            transitioned,
        }
    }

    pub fn is_held(&self) -> bool {
        self.state.is_held
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_always_transitions() {
        for (raw, confidence) in [(true, 0.9), (false, 0.9), (true, 0.1), (false, 0.0)] {
            let mut debouncer = GestureDebouncer::default();
            let obs = debouncer.observe(raw, confidence);
            assert!(obs.transitioned, "raw={raw} confidence={confidence}");
            assert_eq!(obs.is_held, raw && confidence > 0.5);
            assert!(!debouncer.state().is_first_sample);
        }
    }

    #[test]
    fn test_low_confidence_never_holds() {
        let mut debouncer = GestureDebouncer::default();
        for i in 0..=50 {
            let confidence = i as f32 / 100.0;
            assert!(!debouncer.observe(true, confidence).is_held);
        }
        // Exactly at threshold is still rejected
        assert!(!debouncer.observe(true, 0.5).is_held);
    }

    #[test]
    fn test_edges_reported_once() {
        let mut debouncer = GestureDebouncer::default();
        debouncer.observe(false, 0.0);

        let grab = debouncer.observe(true, 0.8);
        assert!(grab.transitioned && grab.is_held);

        let still = debouncer.observe(true, 0.7);
        assert!(!still.transitioned && still.is_held);

        let release = debouncer.observe(true, 0.3);
        assert!(release.transitioned && !release.is_held);

        let idle = debouncer.observe(false, 0.9);
        assert!(!idle.transitioned && !idle.is_held);
    }

    #[test]
    fn test_sample_must_match_target_keypose() {
        let mut debouncer = GestureDebouncer::new(Keypose::Fist, 0.5);
        debouncer.observe_sample(&KeyposeSample::absent());

        let pinch = debouncer.observe_sample(&KeyposeSample::new(Keypose::Pinch, 0.99));
        assert!(!pinch.is_held);

        let fist = debouncer.observe_sample(&KeyposeSample::new(Keypose::Fist, 0.99));
        assert!(fist.transitioned && fist.is_held);
        assert!(debouncer.state().previous_raw_keypose);
    }
}
