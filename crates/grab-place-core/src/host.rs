//! Host service seams and the driver that binds them to the controller
//!
//! The host (an engine, a device runtime or the simulator) implements the
//! service traits. [`Driver`] starts them, samples them once per tick into
//! [`TickInputs`], runs the controller and executes the returned
//! [`HostCommand`]s. Asynchronous results come back through
//! [`Driver::deliver_raycast`] and [`Driver::deliver_planes`] on the same
//! thread that ticks.

use tracing::{debug, error, info};

use crate::config::ControllerConfig;
use crate::controller::{HostCommand, InteractionController, TickInputs, TickOutput};
use crate::error::{ServiceError, StartupError};
use crate::input::{Hand, Keypose, KeyposeSample};
use crate::planes::{DetectedPlane, PlaneMarker, PlaneQuery};
use crate::raycast::{RaycastRequest, RaycastResponse, ResponseDisposition};
use crate::spatial::Point3D;

/// Lifecycle shared by every host service
pub trait HostService {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    fn start(&mut self) -> Result<(), ServiceError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Hand keypose classifier
pub trait GestureService: HostService {
    /// Restrict classification to these keyposes
    fn enable_keyposes(&mut self, _keyposes: &[Keypose]) {}

    /// Latest reading for `hand`
    fn current_keypose(&mut self, hand: Hand) -> KeyposeSample;
}

/// Analog controller
pub trait AnalogInputService: HostService {
    fn is_connected(&self) -> bool;

    /// Deflection `(x, y)` of the given control
    fn axis_state(&self, control_index: u32) -> (f32, f32);
}

/// Asynchronous spatial raycasts; responses are delivered later
pub trait SpatialRaycastService: HostService {
    fn query(&mut self, request: &RaycastRequest);
}

/// One-shot plane detection; the result is delivered later
pub trait PlaneDetectionService: HostService {
    fn query_planes(&mut self, query: &PlaneQuery);
}

/// The placed object in the host scene
pub trait SceneObject {
    fn position(&self) -> Point3D;

    fn set_position(&mut self, position: Point3D);

    /// Hand the object to host physics
    fn attach_physics(&mut self);

    /// Take the object back from host physics
    fn detach_physics(&mut self);
}

/// Every collaborator the driver needs
pub struct HostServices {
    pub gesture: Box<dyn GestureService>,
    pub analog: Box<dyn AnalogInputService>,
    pub planes: Box<dyn PlaneDetectionService>,
    pub raycast: Box<dyn SpatialRaycastService>,
    pub object: Box<dyn SceneObject>,
}

/// Number of services with a lifecycle, started in field order
const LIFECYCLE_SERVICES: usize = 4;

impl HostServices {
    fn start_service(&mut self, index: usize) -> Result<(), ServiceError> {
        match index {
            0 => self.gesture.start(),
            1 => self.analog.start(),
            2 => self.planes.start(),
            _ => self.raycast.start(),
        }
    }

    fn stop_service(&mut self, index: usize) {
        match index {
            0 => self.gesture.stop(),
            1 => self.analog.stop(),
            2 => self.planes.stop(),
            _ => self.raycast.stop(),
        }
    }

    fn service_name(&self, index: usize) -> &'static str {
        match index {
            0 => self.gesture.name(),
            1 => self.analog.name(),
            2 => self.planes.name(),
            _ => self.raycast.name(),
        }
    }

    /// Start in order; on failure stop whatever already started
    fn start_all(&mut self) -> Result<(), ServiceError> {
        for index in 0..LIFECYCLE_SERVICES {
            if let Err(e) = self.start_service(index) {
                for started in (0..index).rev() {
                    self.stop_service(started);
                }
                return Err(e);
            }
            debug!(service = self.service_name(index), "service started");
        }
        Ok(())
    }

    fn stop_all(&mut self) {
        for index in (0..LIFECYCLE_SERVICES).rev() {
            self.stop_service(index);
            debug!(service = self.service_name(index), "service stopped");
        }
    }
}

pub struct Driver {
    services: HostServices,
    controller: InteractionController,
}

impl Driver {
    /// Start every service and build the controller.
    ///
    /// Any failure is fatal: services already started are stopped again and
    /// no driver is returned.
    pub fn init(config: ControllerConfig, mut services: HostServices) -> Result<Self, StartupError> {
        config.validate()?;
        if let Err(e) = services.start_all() {
            error!(error = %e, "failed to start host services, controller disabled");
            return Err(e.into());
        }

        services.gesture.enable_keyposes(&[config.keypose]);

        let start = services.object.position();
        let controller = InteractionController::new(config, start);
        services.planes.query_planes(&controller.plane_query());
        info!(base_height = start.y, "controller started");

        Ok(Self {
            services,
            controller,
        })
    }

    /// Sample the host, advance the controller and apply its commands
    pub fn tick(&mut self, delta_time: f32) -> TickOutput {
        let inputs = self.sample();
        let output = self.controller.tick(delta_time, &inputs);
        for command in &output.commands {
            self.execute(command);
        }
        output
    }

    pub fn deliver_raycast(&mut self, response: &RaycastResponse) -> ResponseDisposition {
        self.controller.on_raycast_response(response)
    }

    pub fn deliver_planes(&mut self, result: Result<Vec<DetectedPlane>, ServiceError>) -> &[PlaneMarker] {
        self.controller.on_planes(result)
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Stop every service in reverse start order
    pub fn shutdown(mut self) {
        self.services.stop_all();
        info!("controller shut down");
    }

    fn sample(&mut self) -> TickInputs {
        let config = self.controller.config();
        if !self.services.analog.is_connected() {
            return TickInputs {
                connected: false,
                ..TickInputs::default()
            };
        }
        TickInputs {
            connected: true,
            keypose: self.services.gesture.current_keypose(config.hand),
            axis: self.services.analog.axis_state(config.control_index),
        }
    }

    fn execute(&mut self, command: &HostCommand) {
        match command {
            HostCommand::AttachPhysics => self.services.object.attach_physics(),
            HostCommand::DetachPhysics => self.services.object.detach_physics(),
            HostCommand::IssueRaycast(request) => self.services.raycast.query(request),
            HostCommand::CommitPose(pose) => self.services.object.set_position(*pose),
        }
    }
}
