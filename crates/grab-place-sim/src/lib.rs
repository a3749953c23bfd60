//! grab-place-sim: scripted host for the grab-place controller
//!
//! Scenarios describe hand and stick timelines, controller dropouts, the
//! floor under the object and the planes the host reports. The runner binds
//! simulated services to a [`grab_place_core::Driver`] and records one
//! [`Frame`] per tick.

pub mod error;
pub mod floor;
pub mod runner;
pub mod scenario;
pub mod services;

pub use error::SimError;
pub use floor::{FloorMap, FloorRegion};
pub use runner::{run_realtime, Frame, Report, Simulation};
pub use scenario::{GestureSpan, Scenario, SimService, Span, StickSpan};
pub use services::{host_services, SharedWorld, World};
