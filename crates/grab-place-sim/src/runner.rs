//! Scenario runner
//!
//! [`Simulation::step`] advances one tick deterministically: the world clock
//! moves, the driver ticks against the scripted services, then every raycast
//! response that has come due is delivered. [`run_realtime`] performs the same
//! steps paced by a tokio interval.

use std::time::Duration;

use grab_place_core::{
    Driver, GrabTransition, HostCommand, PlaneMarker, Point3D, ResponseDisposition, ServiceError, TickStatus,
};
use serde::Serialize;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::Result;
use crate::scenario::Scenario;
use crate::services::{host_services, SharedWorld, World};

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub tick: u32,
    pub status: TickStatus,
    pub pose: Point3D,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<GrabTransition>,
    pub physics_attached: bool,
    pub raycast_issued: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<ResponseDisposition>,
    pub target_centimeters: i32,
    pub converging: bool,
}

/// Outcome of a finished scenario
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub name: String,
    pub base_height: f32,
    pub final_pose: Point3D,
    pub raycasts_issued: u32,
    pub markers: Vec<PlaneMarker>,
    pub frames: Vec<Frame>,
}

pub struct Simulation {
    driver: Driver,
    world: SharedWorld,
    tick: u32,
    frames: Vec<Frame>,
}

impl Simulation {
    /// Start the driver against fresh simulated services and answer its
    /// plane query.
    pub fn new(scenario: Scenario) -> Result<Self> {
        scenario.validate()?;
        let config = scenario.config.clone();
        let world = World::shared(scenario);
        let mut driver = Driver::init(config, host_services(&world))?;

        let query = world.borrow_mut().plane_query.take();
        if let Some(query) = query {
            let result = {
                let world = world.borrow();
                match &world.scenario.plane_error {
                    Some(message) => Err(ServiceError::new("planes", message.clone())),
                    None => Ok(world
                        .scenario
                        .planes
                        .iter()
                        .take(query.max_results as usize)
                        .copied()
                        .collect()),
                }
            };
            driver.deliver_planes(result);
        }

        Ok(Self {
            driver,
            world,
            tick: 0,
            frames: Vec::new(),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.world.borrow().scenario.ticks
    }

    /// Advance one tick; `None` once the scenario has run out of ticks
    pub fn step(&mut self) -> Option<&Frame> {
        if self.is_finished() {
            return None;
        }

        let dt = {
            let mut world = self.world.borrow_mut();
            world.tick = self.tick;
            world.scenario.dt
        };
        let output = self.driver.tick(dt);

        let due = self.world.borrow_mut().due_responses();
        let responses: Vec<_> = due
            .iter()
            .map(|response| self.driver.deliver_raycast(response))
            .collect();

        let controller = self.driver.controller();
        let target = controller.height_target();
        let frame = Frame {
            tick: self.tick,
            status: output.status,
            pose: controller.pose(),
            transition: output.transition,
            physics_attached: self.world.borrow().physics_attached,
            raycast_issued: output
                .commands
                .iter()
                .any(|c| matches!(c, HostCommand::IssueRaycast(_))),
            responses,
            target_centimeters: target.target_centimeters,
            converging: target.is_converging,
        };
        if frame.transition.is_some() || !frame.responses.is_empty() {
            debug!(tick = frame.tick, ?frame.transition, responses = frame.responses.len(), "frame");
        }

        self.tick += 1;
        self.frames.push(frame);
        self.frames.last()
    }

    /// Step until the scenario ends
    pub fn run(&mut self) -> &[Frame] {
        while self.step().is_some() {}
        &self.frames
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    /// Shut the driver down and summarise the run
    pub fn finish(self) -> Report {
        let controller = self.driver.controller();
        let final_pose = controller.pose();
        let base_height = controller.base_height();
        let markers = controller.markers().to_vec();
        let (name, raycasts_issued) = {
            let world = self.world.borrow();
            (world.scenario.name.clone(), world.raycasts_issued)
        };
        self.driver.shutdown();

        info!(
            scenario = %name,
            ticks = self.frames.len(),
            x = final_pose.x,
            y = final_pose.y,
            z = final_pose.z,
            "scenario finished"
        );
        Report {
            name,
            base_height,
            final_pose,
            raycasts_issued,
            markers,
            frames: self.frames,
        }
    }
}

/// Run `scenario` ticking every `dt` of wall-clock time, handing each frame
/// to `on_frame` as it is produced.
pub async fn run_realtime<F>(scenario: Scenario, mut on_frame: F) -> Result<Report>
where
    F: FnMut(&Frame),
{
    let period = Duration::from_secs_f32(scenario.dt);
    let mut sim = Simulation::new(scenario)?;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sim.step() {
            Some(frame) => on_frame(frame),
            None => break,
        }
    }
    Ok(sim.finish())
}
