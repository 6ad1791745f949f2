//! Outbound push-channel payloads.
//!
//! The orchestrator appends events to a queue while it works; whoever drives
//! it drains the queue and forwards the events to observers.  Simulation
//! timing never waits on delivery.

use serde::Serialize;

use rf_agent::{AgentFlags, AgentStatus};
use rf_core::{EdgeId, GeoPoint, SimTime};
use rf_zones::ZoneExport;

use crate::SimOptions;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SimEvent {
    /// One agent moved (or was reset).
    Agent(AgentSnapshot),
    /// An agent got a new route, explicit or random.
    Route(RouteUpdate),
    /// An agent reached the end of its route.
    DestinationReached { id: String, position: GeoPoint },
    /// The active zone set was replaced.
    HeatZones(ZoneExport),
    Status(SimStatus),
    Options(SimOptions),
}

/// What observers see of one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    pub flags: AgentFlags,
    pub position: GeoPoint,
    pub speed: f64,
    pub heading: f64,
    pub odometer_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteUpdate {
    pub id: String,
    pub edges: Vec<EdgeId>,
    /// The agent's position, then the end node of every edge.
    pub coordinates: Vec<GeoPoint>,
    /// Still to drive, from the agent's position.
    pub distance_km: f64,
    /// Seconds left at the agent's current speed; absent at zero speed.
    pub eta_secs: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimStatus {
    pub running: bool,
    pub interval_ms: u64,
    pub agents: usize,
    pub time: SimTime,
}
