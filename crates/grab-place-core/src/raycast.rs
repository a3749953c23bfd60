//! Single-flight downward raycasting
//!
//! At most one raycast is outstanding at any time. Each raycast carries a ticket;
//! a response is only applied if its ticket is the outstanding one, the
//! ticket has not been discarded by a grab, and the object is not held when
//! it arrives. A discarded ticket stays discarded after release, so its
//! response is dropped even when the object is free again; this is stricter
//! than the held check on its own. There is no cancel call to the host
//! service and no timeout: a raycast that never answers keeps the slot occupied.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::spatial::{to_centimeters, Point3D, Vector3D};

/// Correlates a response with the request that caused it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ray#{}", self.0)
    }
}

/// Lifecycle of the outstanding ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    /// In flight, result will be applied
    Pending,
    /// In flight, result will be dropped
    Discarded,
}

/// A raycast to hand to the spatial service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastRequest {
    pub ticket: TicketId,
    pub origin: Point3D,
    pub direction: Vector3D,
}

/// What the spatial service reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RaycastOutcome {
    Hit {
        point: Point3D,
        normal: Vector3D,
        confidence: f32,
    },
    RequestFailed,
    NoCollision,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastResponse {
    pub ticket: TicketId,
    pub outcome: RaycastOutcome,
}

/// How a response was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "centimeters", rename_all = "snake_case")]
pub enum ResponseDisposition {
    /// Floor found at this height (whole centimetres)
    Hit(i32),
    /// Service failure or no intersection; retried on a later tick
    Failed,
    /// Context changed since the request; ignored entirely
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct Outstanding {
    request: RaycastRequest,
    state: TicketState,
}

#[derive(Debug, Clone)]
pub struct RaycastRequestManager {
    base_height: f32,
    next_ticket: u64,
    outstanding: Option<Outstanding>,
}

impl RaycastRequestManager {
    pub fn new(base_height: f32) -> Self {
        Self {
            base_height,
            next_ticket: 1,
            outstanding: None,
        }
    }

    /// A raycast is in flight (pending or discarded)
    pub fn has_pending(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn outstanding(&self) -> Option<(RaycastRequest, TicketState)> {
        self.outstanding.map(|o| (o.request, o.state))
    }

    /// Issue a raycast straight down from `current` if none is in flight and
    /// the object is free.
    pub fn maybe_request(&mut self, current: Point3D, is_held: bool) -> Option<RaycastRequest> {
        if is_held || self.outstanding.is_some() {
            return None;
        }

        let request = RaycastRequest {
            ticket: TicketId(self.next_ticket),
            origin: current,
            direction: Vector3D::DOWN,
        };
        self.next_ticket += 1;
        self.outstanding = Some(Outstanding {
            request,
            state: TicketState::Pending,
        });
        debug!(ticket = %request.ticket, "raycast issued");
        Some(request)
    }

    /// Mark the in-flight raycast so its result is dropped on arrival
    pub fn discard_outstanding(&mut self) {
        if let Some(outstanding) = self.outstanding.as_mut() {
            if outstanding.state == TicketState::Pending {
                debug!(ticket = %outstanding.request.ticket, "raycast discarded");
            }
            outstanding.state = TicketState::Discarded;
        }
    }

    pub fn on_response(&mut self, response: &RaycastResponse, is_held: bool) -> ResponseDisposition {
        let Some(outstanding) = self.outstanding else {
            debug!(ticket = %response.ticket, "response with nothing outstanding");
            return ResponseDisposition::Stale;
        };
        if outstanding.request.ticket != response.ticket {
            debug!(
                ticket = %response.ticket,
                expected = %outstanding.request.ticket,
                "response for unknown ticket"
            );
            return ResponseDisposition::Stale;
        }

        // The outstanding raycast has answered; the slot is free again
        self.outstanding = None;

        if is_held || outstanding.state == TicketState::Discarded {
            debug!(ticket = %response.ticket, "stale raycast dropped");
            return ResponseDisposition::Stale;
        }

        match response.outcome {
            RaycastOutcome::RequestFailed => {
                debug!(ticket = %response.ticket, "raycast request failed");
                ResponseDisposition::Failed
            }
            RaycastOutcome::NoCollision => {
                debug!(ticket = %response.ticket, "raycast found no collision");
                ResponseDisposition::Failed
            }
            RaycastOutcome::Hit { point, .. } => {
                ResponseDisposition::Hit(to_centimeters(self.base_height + point.y))
            }
        }
    }
}
