//! Per-tick grab-and-place state machine
//!
//! The controller owns the object's position and decides each tick which
//! subsystem is authoritative: while held, the host's physics body drives the
//! object and the controller only tracks edges; while free, the stick slides
//! it and floor raycasts settle it. Everything the host must do is returned as
//! [`HostCommand`]s, so the controller itself performs no I/O.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::ServiceError;
use crate::input::{GestureDebouncer, KeyposeSample, PlanarInputMapper};
use crate::planes::{markers_from_planes, DetectedPlane, PlaneMarker, PlaneQuery};
use crate::raycast::{RaycastRequest, RaycastRequestManager, RaycastResponse, ResponseDisposition};
use crate::settle::{HeightSettler, HeightTarget, SettleState};
use crate::spatial::Point3D;

/// Everything sampled from the host for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInputs {
    /// Analog controller link is up
    pub connected: bool,
    /// Classifier reading for the designated hand
    pub keypose: KeyposeSample,
    /// Stick deflection (x, y), each in [-1, 1]
    pub axis: (f32, f32),
}

impl Default for TickInputs {
    fn default() -> Self {
        Self {
            connected: true,
            keypose: KeyposeSample::absent(),
            axis: (0.0, 0.0),
        }
    }
}

/// Side effects requested from the host, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    /// Hand the object to host physics
    AttachPhysics,
    /// Take the object back from host physics
    DetachPhysics,
    /// Send a floor raycast to the spatial service
    IssueRaycast(RaycastRequest),
    /// Write the object's position
    CommitPose(Point3D),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStatus {
    /// Controller link down; nothing changed
    Skipped,
    /// Object is free (sliding or settling)
    Free,
    /// Object is held
    Held,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrabTransition {
    Grabbed,
    Released,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub status: TickStatus,
    pub pose: Point3D,
    pub transition: Option<GrabTransition>,
    pub commands: Vec<HostCommand>,
}

pub struct InteractionController {
    config: ControllerConfig,
    pose: Point3D,
    debouncer: GestureDebouncer,
    mapper: PlanarInputMapper,
    raycasts: RaycastRequestManager,
    settler: HeightSettler,
    physics_active: bool,
    link_lost: bool,
    markers: Vec<PlaneMarker>,
}

impl InteractionController {
    /// Controller for an object starting at `start`; its height becomes the
    /// base height for the session.
    pub fn new(config: ControllerConfig, start: Point3D) -> Self {
        let base_height = start.y;
        Self {
            debouncer: GestureDebouncer::new(config.keypose, config.confidence_threshold),
            mapper: PlanarInputMapper::new(config.speed_horizontal),
            raycasts: RaycastRequestManager::new(base_height),
            settler: HeightSettler::with_params(
                base_height,
                config.speed_vertical,
                config.settle_tolerance,
            ),
            config,
            pose: start,
            physics_active: false,
            link_lost: false,
            markers: Vec::new(),
        }
    }

    pub fn tick(&mut self, delta_time: f32, inputs: &TickInputs) -> TickOutput {
        if !inputs.connected {
            if !self.link_lost {
                warn!("controller not connected, skipping ticks");
                self.link_lost = true;
            } else {
                debug!("controller still not connected");
            }
            return TickOutput {
                status: TickStatus::Skipped,
                pose: self.pose,
                transition: None,
                commands: Vec::new(),
            };
        }
        if self.link_lost {
            info!("controller reconnected");
            self.link_lost = false;
        }

        let mut commands = Vec::new();
        let mut transition = None;

        let observation = self.debouncer.observe_sample(&inputs.keypose);
        if observation.transitioned {
            if observation.is_held {
                self.raycasts.discard_outstanding();
                self.pose.y = self.settler.cancel();
                if !self.physics_active {
                    self.physics_active = true;
                    commands.push(HostCommand::AttachPhysics);
                }
                info!(confidence = inputs.keypose.confidence, "object grabbed");
                transition = Some(GrabTransition::Grabbed);
            } else {
                if self.physics_active {
                    self.physics_active = false;
                    commands.push(HostCommand::DetachPhysics);
                }
                self.pose.y = self.settler.cancel();
                info!(height = self.pose.y, "object released");
                transition = Some(GrabTransition::Released);
            }
        }

        let is_held = observation.is_held;
        if !is_held {
            let (dx, dz) = self
                .mapper
                .compute_delta(inputs.axis.0, inputs.axis.1, delta_time, is_held);
            self.pose = self.pose.offset_planar(dx, dz);

            if let Some(request) = self.raycasts.maybe_request(self.pose, is_held) {
                commands.push(HostCommand::IssueRaycast(request));
            }
        }

        if self.settler.state() == SettleState::Converging {
            self.pose.y = self.settler.step(self.pose.y, delta_time);
        }

        commands.push(HostCommand::CommitPose(self.pose));

        TickOutput {
            status: if is_held { TickStatus::Held } else { TickStatus::Free },
            pose: self.pose,
            transition,
            commands,
        }
    }

    /// Apply a spatial service response.
    pub fn on_raycast_response(&mut self, response: &RaycastResponse) -> ResponseDisposition {
        let disposition = self.raycasts.on_response(response, self.debouncer.is_held());
        if let ResponseDisposition::Hit(centimeters) = disposition {
            self.settler.apply_hit(centimeters);
        }
        disposition
    }

    /// The one-shot plane query issued at startup
    pub fn plane_query(&self) -> PlaneQuery {
        PlaneQuery {
            flags: self.config.plane_flags,
            max_results: self.config.max_planes,
        }
    }

    /// Apply the plane query result; failures leave no markers.
    pub fn on_planes(&mut self, result: Result<Vec<DetectedPlane>, ServiceError>) -> &[PlaneMarker] {
        match result {
            Ok(planes) => {
                self.markers = markers_from_planes(&planes, self.config.max_planes);
                info!(
                    detected = planes.len(),
                    placed = self.markers.len(),
                    "plane markers placed"
                );
            }
            Err(e) => warn!(error = %e, "plane query failed"),
        }
        &self.markers
    }

    pub fn pose(&self) -> Point3D {
        self.pose
    }

    pub fn base_height(&self) -> f32 {
        self.settler.base_height()
    }

    pub fn is_held(&self) -> bool {
        self.debouncer.is_held()
    }

    pub fn physics_active(&self) -> bool {
        self.physics_active
    }

    pub fn settle_state(&self) -> SettleState {
        self.settler.state()
    }

    pub fn height_target(&self) -> HeightTarget {
        self.settler.target()
    }

    pub fn has_pending_raycast(&self) -> bool {
        self.raycasts.has_pending()
    }

    pub fn markers(&self) -> &[PlaneMarker] {
        &self.markers
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Keypose;
    use crate::raycast::RaycastOutcome;
    use crate::spatial::Vector3D;

    const DT: f32 = 1.0 / 60.0;

    fn free(axis: (f32, f32)) -> TickInputs {
        TickInputs {
            connected: true,
            keypose: KeyposeSample::new(Keypose::OpenHand, 0.9),
            axis,
        }
    }

    fn fist() -> TickInputs {
        TickInputs {
            connected: true,
            keypose: KeyposeSample::new(Keypose::Fist, 0.95),
            axis: (1.0, 1.0),
        }
    }

    fn disconnected() -> TickInputs {
        TickInputs {
            connected: false,
            ..free((1.0, 1.0))
        }
    }

    fn issued(output: &TickOutput) -> Option<RaycastRequest> {
        output.commands.iter().find_map(|c| match c {
            HostCommand::IssueRaycast(r) => Some(*r),
            _ => None,
        })
    }

    fn floor_hit(request: &RaycastRequest, y: f32) -> RaycastResponse {
        RaycastResponse {
            ticket: request.ticket,
            outcome: RaycastOutcome::Hit {
                point: Point3D::new(request.origin.x, y, request.origin.z),
                normal: Vector3D::UP,
                confidence: 0.9,
            },
        }
    }

    fn controller() -> InteractionController {
        InteractionController::new(ControllerConfig::default(), Point3D::new(0.0, 1.0, 0.0))
    }

    #[test]
    fn test_first_tick_releases_and_raycasts() {
        let mut c = controller();
        let out = c.tick(DT, &free((0.0, 0.0)));
        assert_eq!(out.status, TickStatus::Free);
        assert_eq!(out.transition, Some(GrabTransition::Released));
        assert!(issued(&out).is_some());
        assert_eq!(out.commands.last(), Some(&HostCommand::CommitPose(out.pose)));
        // Physics was never attached, so nothing to detach
        assert!(!out.commands.contains(&HostCommand::DetachPhysics));
    }

    #[test]
    fn test_settles_onto_floor_then_grab_resets() {
        let mut c = controller();
        let out = c.tick(DT, &free((0.0, 0.0)));
        let request = issued(&out).unwrap();

        assert_eq!(c.on_raycast_response(&floor_hit(&request, 0.2)), ResponseDisposition::Hit(120));
        assert_eq!(c.height_target().target_centimeters, 120);
        assert_eq!(c.settle_state(), SettleState::Converging);

        c.tick(DT, &free((0.0, 0.0)));
        c.tick(DT, &free((0.0, 0.0)));
        let mid = c.pose().y;
        assert!(mid > 1.0 && mid < 1.2);

        let grab = c.tick(DT, &fist());
        assert_eq!(grab.transition, Some(GrabTransition::Grabbed));
        assert_eq!(grab.pose.y, 1.0);
        assert_eq!(c.settle_state(), SettleState::Idle);
        assert!(grab.commands.contains(&HostCommand::AttachPhysics));
        assert!(c.physics_active());
    }

    fn run_answered(c: &mut InteractionController, inputs: &TickInputs, ticks: usize, floor_y: f32) {
        for _ in 0..ticks {
            let out = c.tick(DT, inputs);
            if let Some(req) = issued(&out) {
                c.on_raycast_response(&floor_hit(&req, floor_y));
            }
        }
    }

    #[test]
    fn test_release_over_same_floor_stays_at_base() {
        let mut c = controller();
        run_answered(&mut c, &free((0.0, 0.0)), 200, 0.2);
        assert_eq!(c.pose().y, 1.2);
        assert_eq!(c.height_target().target_centimeters, 120);

        c.tick(DT, &fist());
        assert_eq!(c.pose().y, 1.0);
        assert_eq!(c.height_target().target_centimeters, 120);

        run_answered(&mut c, &free((0.0, 0.0)), 200, 0.2);
        assert_eq!(c.pose().y, 1.0);
        assert_eq!(c.height_target().target_centimeters, 120);
        assert_eq!(c.settle_state(), SettleState::Idle);

        // A different floor still settles
        run_answered(&mut c, &free((0.0, 0.0)), 200, 0.1);
        assert_eq!(c.pose().y, 1.1);
    }

    #[test]
    fn test_converges_exactly() {
        let mut c = controller();
        let request = issued(&c.tick(DT, &free((0.0, 0.0)))).unwrap();
        c.on_raycast_response(&floor_hit(&request, 0.2));

        let mut ticks = 0;
        while c.settle_state() == SettleState::Converging {
            let out = c.tick(DT, &free((0.0, 0.0)));
            // Keep the raycast loop going with the same floor
            if let Some(req) = issued(&out) {
                c.on_raycast_response(&floor_hit(&req, 0.2));
            }
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(c.pose().y, 120.0 / 100.0);
    }

    #[test]
    fn test_held_ignores_stick_and_raycasts() {
        let mut c = controller();
        c.tick(DT, &fist());
        let before = c.pose();
        for _ in 0..30 {
            let out = c.tick(DT, &fist());
            assert_eq!(out.status, TickStatus::Held);
            assert!(issued(&out).is_none());
        }
        assert_eq!(c.pose(), before);
    }

    #[test]
    fn test_stale_response_after_grab_is_ignored() {
        let mut c = controller();
        let request = issued(&c.tick(DT, &free((0.0, 0.0)))).unwrap();
        c.tick(DT, &fist());
        let target = c.height_target();
        let pose = c.pose();

        assert_eq!(c.on_raycast_response(&floor_hit(&request, 0.6)), ResponseDisposition::Stale);
        assert_eq!(c.height_target(), target);
        assert_eq!(c.pose(), pose);
    }

    #[test]
    fn test_discarded_raycast_dropped_even_after_release() {
        let mut c = controller();
        let request = issued(&c.tick(DT, &free((0.0, 0.0)))).unwrap();
        c.tick(DT, &fist());
        let release = c.tick(DT, &free((0.0, 0.0)));
        assert_eq!(release.transition, Some(GrabTransition::Released));
        assert!(release.commands.contains(&HostCommand::DetachPhysics));
        // Old raycast still in flight: no second raycast yet
        assert!(issued(&release).is_none());

        assert_eq!(c.on_raycast_response(&floor_hit(&request, 0.6)), ResponseDisposition::Stale);
        assert_eq!(c.settle_state(), SettleState::Idle);
        assert!(issued(&c.tick(DT, &free((0.0, 0.0)))).is_some());
    }

    #[test]
    fn test_single_flight_across_many_ticks() {
        let mut c = controller();
        let mut in_flight: Vec<RaycastRequest> = Vec::new();
        for i in 0..500 {
            let inputs = if (i / 40) % 3 == 1 { fist() } else { free((0.3, -0.2)) };
            let out = c.tick(DT, &inputs);
            if let Some(req) = issued(&out) {
                in_flight.push(req);
            }
            assert!(in_flight.len() <= 1, "tick {i}: {} raycasts in flight", in_flight.len());
            // Answer every seventh tick
            if i % 7 == 0 {
                if let Some(req) = in_flight.pop() {
                    c.on_raycast_response(&floor_hit(&req, 0.1));
                }
            }
        }
    }

    #[test]
    fn test_disconnected_ticks_change_nothing() {
        let mut c = controller();
        let request = issued(&c.tick(DT, &free((0.5, 0.5)))).unwrap();
        c.on_raycast_response(&floor_hit(&request, 0.3));
        let pose = c.pose();
        let target = c.height_target();

        for _ in 0..25 {
            let out = c.tick(DT, &disconnected());
            assert_eq!(out.status, TickStatus::Skipped);
            assert!(out.commands.is_empty());
        }
        assert_eq!(c.pose(), pose);
        assert_eq!(c.height_target(), target);
        assert!(!c.is_held());
    }

    #[test]
    fn test_stick_slides_object() {
        let mut c = controller();
        c.tick(1.0, &free((0.0, 0.0)));
        c.tick(1.0, &free((1.0, -0.5)));
        let pose = c.pose();
        assert!((pose.x - 0.3).abs() < 1e-6);
        assert!((pose.z + 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_failed_raycast_retried_next_tick() {
        let mut c = controller();
        let request = issued(&c.tick(DT, &free((0.0, 0.0)))).unwrap();
        let failed = RaycastResponse {
            ticket: request.ticket,
            outcome: RaycastOutcome::NoCollision,
        };
        assert_eq!(c.on_raycast_response(&failed), ResponseDisposition::Failed);
        assert_eq!(c.height_target().target_centimeters, 100);
        assert!(issued(&c.tick(DT, &free((0.0, 0.0)))).is_some());
    }

    #[test]
    fn test_plane_markers() {
        let mut c = InteractionController::new(
            ControllerConfig {
                max_planes: 2,
                ..ControllerConfig::default()
            },
            Point3D::ORIGIN,
        );
        let planes = vec![
            DetectedPlane {
                center: Point3D::new(0.0, 0.0, 1.0),
                rotation: Default::default(),
                width: 1.0,
                height: 2.0,
            };
            3
        ];
        assert_eq!(c.on_planes(Ok(planes)).len(), 2);

        // A failed query leaves the existing markers alone
        let err = ServiceError::new("planes", "timeout");
        assert_eq!(c.on_planes(Err(err)).len(), 2);
        assert_eq!(c.plane_query().max_results, 2);
    }
}
