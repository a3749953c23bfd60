//! Input stages feeding the controller
//!
//! - Keypose classifier samples for the designated hand
//! - Debounced grab state with edge-triggered transitions
//! - Analog stick mapping to planar motion

mod keypose;
mod debounce;
mod planar;

pub use keypose::{Hand, Keypose, KeyposeSample};
pub use debounce::{GestureDebouncer, GestureObservation, GestureState};
pub use planar::PlanarInputMapper;
