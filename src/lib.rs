pub use grab_place_core::{config, controller, error, host, input, planes, raycast, settle, spatial};
pub use grab_place_sim as sim;

pub use grab_place_core::{ControllerConfig, Driver, InteractionController};
