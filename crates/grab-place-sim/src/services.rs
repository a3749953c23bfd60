//! Scripted host services over a shared single-threaded world
//!
//! Every service holds a handle to the same [`World`]. The runner advances
//! `World::tick` before each controller tick so the services answer from the
//! scenario timelines at that tick.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use grab_place_core::planes::PlaneQuery;
use grab_place_core::{
    AnalogInputService, GestureService, Hand, HostService, HostServices, Keypose, KeyposeSample,
    PlaneDetectionService, Point3D, RaycastRequest, RaycastResponse, SceneObject, ServiceError,
    SpatialRaycastService,
};
use tracing::debug;

use crate::scenario::{Scenario, SimService};

pub type SharedWorld = Rc<RefCell<World>>;

/// A raycast waiting for its simulated latency to elapse
#[derive(Debug, Clone, Copy)]
struct InFlight {
    due: u32,
    request: RaycastRequest,
}

pub struct World {
    pub scenario: Scenario,
    pub tick: u32,
    pub object: Point3D,
    pub physics_attached: bool,
    /// Keyposes the classifier was asked to report
    pub enabled_keyposes: Vec<Keypose>,
    pub plane_query: Option<PlaneQuery>,
    pub running: Vec<SimService>,
    pub raycasts_issued: u32,
    in_flight: VecDeque<InFlight>,
}

impl World {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            object: scenario.start,
            scenario,
            tick: 0,
            physics_attached: false,
            enabled_keyposes: Vec::new(),
            plane_query: None,
            running: Vec::new(),
            raycasts_issued: 0,
            in_flight: VecDeque::new(),
        }
    }

    pub fn shared(scenario: Scenario) -> SharedWorld {
        Rc::new(RefCell::new(Self::new(scenario)))
    }

    /// Responses whose latency has elapsed by the current tick, in issue order
    pub fn due_responses(&mut self) -> Vec<RaycastResponse> {
        let mut responses = Vec::new();
        while let Some(next) = self.in_flight.front() {
            if next.due > self.tick {
                break;
            }
            let request = next.request;
            self.in_flight.pop_front();
            responses.push(RaycastResponse {
                ticket: request.ticket,
                outcome: self.scenario.floor.cast(&request),
            });
        }
        responses
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn begin(&mut self, service: SimService) -> Result<(), ServiceError> {
        if self.scenario.fail_start == Some(service) {
            return Err(ServiceError::new(service.name(), "simulated start failure"));
        }
        self.running.push(service);
        Ok(())
    }

    fn end(&mut self, service: SimService) {
        self.running.retain(|s| *s != service);
    }
}

/// Hand tracking driven by the scenario's gesture timeline
pub struct SimHands {
    world: SharedWorld,
}

impl SimHands {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl HostService for SimHands {
    fn name(&self) -> &'static str {
        SimService::Hands.name()
    }

    fn start(&mut self) -> Result<(), ServiceError> {
        self.world.borrow_mut().begin(SimService::Hands)
    }

    fn stop(&mut self) {
        self.world.borrow_mut().end(SimService::Hands);
    }
}

impl GestureService for SimHands {
    fn enable_keyposes(&mut self, keyposes: &[Keypose]) {
        self.world.borrow_mut().enabled_keyposes = keyposes.to_vec();
    }

    fn current_keypose(&mut self, _hand: Hand) -> KeyposeSample {
        let world = self.world.borrow();
        let sample = world.scenario.gesture_at(world.tick);
        if world.enabled_keyposes.is_empty() || world.enabled_keyposes.contains(&sample.keypose) {
            return sample;
        }
        // A classifier restricted to other keyposes cannot name this one
        KeyposeSample::new(Keypose::NoPose, sample.confidence)
    }
}

/// Analog controller driven by the stick and disconnect timelines
pub struct SimController {
    world: SharedWorld,
}

impl SimController {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl HostService for SimController {
    fn name(&self) -> &'static str {
        SimService::Controller.name()
    }

    fn start(&mut self) -> Result<(), ServiceError> {
        self.world.borrow_mut().begin(SimService::Controller)
    }

    fn stop(&mut self) {
        self.world.borrow_mut().end(SimService::Controller);
    }
}

impl AnalogInputService for SimController {
    fn is_connected(&self) -> bool {
        let world = self.world.borrow();
        world.scenario.connected_at(world.tick)
    }

    fn axis_state(&self, _control_index: u32) -> (f32, f32) {
        let world = self.world.borrow();
        world.scenario.stick_at(world.tick)
    }
}

/// Records the plane query; the runner delivers the scripted result
pub struct SimPlanes {
    world: SharedWorld,
}

impl SimPlanes {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl HostService for SimPlanes {
    fn name(&self) -> &'static str {
        SimService::Planes.name()
    }

    fn start(&mut self) -> Result<(), ServiceError> {
        self.world.borrow_mut().begin(SimService::Planes)
    }

    fn stop(&mut self) {
        self.world.borrow_mut().end(SimService::Planes);
    }
}

impl PlaneDetectionService for SimPlanes {
    fn query_planes(&mut self, query: &PlaneQuery) {
        debug!(flags = ?query.flags, max_results = query.max_results, "plane query received");
        self.world.borrow_mut().plane_query = Some(*query);
    }
}

/// Queues raycasts against the floor map with a fixed tick latency
pub struct SimRaycaster {
    world: SharedWorld,
}

impl SimRaycaster {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl HostService for SimRaycaster {
    fn name(&self) -> &'static str {
        SimService::Raycast.name()
    }

    fn start(&mut self) -> Result<(), ServiceError> {
        self.world.borrow_mut().begin(SimService::Raycast)
    }

    fn stop(&mut self) {
        self.world.borrow_mut().end(SimService::Raycast);
    }
}

impl SpatialRaycastService for SimRaycaster {
    fn query(&mut self, request: &RaycastRequest) {
        let mut world = self.world.borrow_mut();
        world.raycasts_issued += 1;
        if world.scenario.raycast_silent {
            debug!(ticket = %request.ticket, "raycast swallowed");
            return;
        }
        let due = world.tick + world.scenario.raycast_latency;
        world.in_flight.push_back(InFlight {
            due,
            request: *request,
        });
    }
}

/// The placed object; physics is only flagged, never simulated
pub struct SimObject {
    world: SharedWorld,
}

impl SimObject {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl SceneObject for SimObject {
    fn position(&self) -> Point3D {
        self.world.borrow().object
    }

    fn set_position(&mut self, position: Point3D) {
        self.world.borrow_mut().object = position;
    }

    fn attach_physics(&mut self) {
        self.world.borrow_mut().physics_attached = true;
    }

    fn detach_physics(&mut self) {
        self.world.borrow_mut().physics_attached = false;
    }
}

/// One simulated service of each kind over `world`
pub fn host_services(world: &SharedWorld) -> HostServices {
    HostServices {
        gesture: Box::new(SimHands::new(world.clone())),
        analog: Box::new(SimController::new(world.clone())),
        planes: Box::new(SimPlanes::new(world.clone())),
        raycast: Box::new(SimRaycaster::new(world.clone())),
        object: Box::new(SimObject::new(world.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::GestureSpan;
    use grab_place_core::{RaycastOutcome, TicketId, Vector3D};

    fn request(ticket: u64) -> RaycastRequest {
        RaycastRequest {
            ticket: TicketId(ticket),
            origin: Point3D::new(0.0, 1.0, 0.0),
            direction: Vector3D::DOWN,
        }
    }

    #[test]
    fn test_raycast_latency() {
        let mut scenario = Scenario::default();
        scenario.raycast_latency = 2;
        scenario.floor.fallback_height = Some(0.1);
        let world = World::shared(scenario);
        let mut rays = SimRaycaster::new(world.clone());

        rays.query(&request(1));
        world.borrow_mut().tick = 1;
        assert!(world.borrow_mut().due_responses().is_empty());

        world.borrow_mut().tick = 2;
        let responses = world.borrow_mut().due_responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].ticket, TicketId(1));
        assert!(matches!(responses[0].outcome, RaycastOutcome::Hit { .. }));
        assert_eq!(world.borrow().in_flight(), 0);
    }

    #[test]
    fn test_silent_raycaster_never_answers() {
        let mut scenario = Scenario::default();
        scenario.raycast_silent = true;
        let world = World::shared(scenario);
        let mut rays = SimRaycaster::new(world.clone());

        rays.query(&request(1));
        world.borrow_mut().tick = 1000;
        assert!(world.borrow_mut().due_responses().is_empty());
        assert_eq!(world.borrow().raycasts_issued, 1);
    }

    #[test]
    fn test_hands_filtered_by_enabled_keyposes() {
        let mut scenario = Scenario::default();
        scenario.gestures.push(GestureSpan {
            from: 0,
            to: 10,
            keypose: Keypose::Pinch,
            confidence: 0.9,
        });
        let world = World::shared(scenario);
        let mut hands = SimHands::new(world.clone());

        assert_eq!(hands.current_keypose(Hand::Right).keypose, Keypose::Pinch);
        hands.enable_keyposes(&[Keypose::Fist]);
        assert_eq!(hands.current_keypose(Hand::Right).keypose, Keypose::NoPose);
    }

    #[test]
    fn test_start_failure_and_stop() {
        let mut scenario = Scenario::default();
        scenario.fail_start = Some(SimService::Planes);
        let world = World::shared(scenario);

        let mut hands = SimHands::new(world.clone());
        let mut planes = SimPlanes::new(world.clone());
        hands.start().unwrap();
        let err = planes.start().unwrap_err();
        assert_eq!(err.service, "planes");
        assert_eq!(world.borrow().running, vec![SimService::Hands]);

        hands.stop();
        assert!(world.borrow().running.is_empty());
    }
}
