//! grab-place-core: gesture-driven grab-and-place controller
//!
//! This crate provides the device-agnostic core of an AR placement interaction:
//! - Spatial primitives for positions, directions and plane orientations
//! - Gesture debouncing and analog planar movement
//! - Single-flight downward raycasting with stale-response discarding
//! - Height settling onto quantised floor heights
//! - Plane marker placement from one-shot plane detection
//! - Host service traits and a driver that binds them to the controller

pub mod spatial;
pub mod input;
pub mod settle;
pub mod raycast;
pub mod planes;
pub mod controller;
pub mod host;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use spatial::{Point3D, Vector3D, Quaternion, Transform};
pub use input::{GestureDebouncer, Hand, Keypose, KeyposeSample, PlanarInputMapper};
pub use settle::{HeightSettler, HeightTarget, SettleState};
pub use raycast::{RaycastOutcome, RaycastRequest, RaycastRequestManager, RaycastResponse, ResponseDisposition, TicketId};
pub use planes::{DetectedPlane, PlaneMarker, PlaneQuery, PlaneQueryFlags};
pub use controller::{GrabTransition, HostCommand, InteractionController, TickInputs, TickOutput, TickStatus};
pub use host::{
    AnalogInputService, Driver, GestureService, HostService, HostServices, PlaneDetectionService, SceneObject,
    SpatialRaycastService,
};
pub use config::ControllerConfig;
pub use error::{ConfigError, ServiceError, StartupError};
