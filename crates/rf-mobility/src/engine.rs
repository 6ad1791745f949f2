//! High-level mobility engine: placement, per-agent ticks, redirection.

use rf_core::{millis_to_hours, AgentId, AgentRng, GeoPoint, NodeId, SimTime};
use rf_spatial::{RoadNetwork, Route, Router, SpatialError};
use rf_zones::ZoneSet;

use crate::kinematics::{in_heat_zone, next_edge, next_speed};
use crate::{ActiveEdge, MobilityResult, MobilityStore, MotionParams, MotionState, RouteCursor};

/// Random destinations tried after a route completes before falling back to
/// wandering.
const REROUTE_ATTEMPTS: usize = 5;

/// Upper bound on edge transitions within one tick.
const MAX_TRANSITIONS: usize = 4_096;

/// What one tick did, for the orchestrator to publish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Kilometres consumed this tick (`speed × elapsed`).
    pub distance_km: f64,
    /// The agent reached the end of its route during this tick.
    pub route_completed: bool,
    /// A random route installed after completion.
    pub new_route: Option<Route>,
    pub in_heat_zone: bool,
}

/// Wraps a [`Router`] and [`MobilityStore`].
///
/// # Type parameter
///
/// `R` must implement [`Router`] (e.g. [`rf_spatial::AStarRouter`]).
pub struct MobilityEngine<R: Router> {
    pub router: R,
    pub store: MobilityStore,
}

impl<R: Router> MobilityEngine<R> {
    /// Create a new engine with every agent unplaced.
    pub fn new(router: R, agent_count: usize) -> Self {
        Self { router, store: MobilityStore::new(agent_count) }
    }

    pub fn state(&self, agent: AgentId) -> MobilityResult<&MotionState> {
        self.store.get(agent)
    }

    /// Put `agent` at the start of `edge`, discarding all prior motion state.
    pub fn place_on(
        &mut self,
        agent: AgentId,
        net: &RoadNetwork,
        edge: ActiveEdge,
        speed_kmh: f64,
        now: SimTime,
    ) -> MobilityResult<()> {
        if edge.edge.index() >= net.edge_count() {
            return Err(SpatialError::EmptyNetwork.into());
        }
        *self.store.get_mut(agent)? = MotionState::at_start(net, edge, speed_kmh, now);
        Ok(())
    }

    /// Initial placement.  Near `hint` the agent starts on one of the nearest
    /// node's outgoing edges; otherwise on a uniformly random edge.  Speed
    /// starts at `min_speed`.
    pub fn place(
        &mut self,
        agent: AgentId,
        net: &RoadNetwork,
        hint: Option<GeoPoint>,
        params: &MotionParams,
        rng: &mut AgentRng,
        now: SimTime,
    ) -> MobilityResult<()> {
        let near = match hint {
            Some(p) => {
                let node = net.find_nearest_node(p)?;
                let outs: Vec<_> = net.out_edges(node).collect();
                rng.choose(&outs).copied()
            }
            None => None,
        };
        let edge = near
            .or_else(|| net.random_edge(rng.inner()))
            .ok_or(SpatialError::EmptyNetwork)?;
        self.place_on(agent, net, ActiveEdge::forward(edge), params.min_speed, now)
    }

    /// Full reset of a stuck agent: random edge, empty visited set, no
    /// route, speed back to `min_speed`.
    pub fn reset_agent(
        &mut self,
        agent: AgentId,
        net: &RoadNetwork,
        params: &MotionParams,
        rng: &mut AgentRng,
        now: SimTime,
    ) -> MobilityResult<()> {
        tracing::debug!(%agent, "resetting agent");
        self.place(agent, net, None, params, rng, now)
    }

    /// Route `agent` toward `target`.
    ///
    /// Both the agent's position and `target` snap to their nearest nodes;
    /// either node lacking connections is [`SpatialError::NoConnections`].
    /// On success the agent jumps to the start of the route's first edge.
    /// A trivial route (same node) leaves the agent where it is.
    pub fn set_destination(
        &mut self,
        agent: AgentId,
        net: &RoadNetwork,
        target: GeoPoint,
    ) -> MobilityResult<Route> {
        let router = &self.router;
        let state = self.store.placed_mut(agent)?;

        let from = net.find_nearest_node(state.position)?;
        let to = net.find_nearest_node(target)?;
        for node in [from, to] {
            if net.out_degree(node) == 0 {
                return Err(SpatialError::NoConnections(node).into());
            }
        }

        let route = router.route(net, from, to)?;
        if let Some(&first) = route.edges.first() {
            state.enter(net, ActiveEdge::forward(first));
            state.route = Some(RouteCursor::started(route.clone()));
            state.lookahead = None;
        }
        tracing::debug!(%agent, edges = route.len(), km = route.distance_km, "destination set");
        Ok(route)
    }

    /// Advance `agent` to `now`: speed update, then position update.
    pub fn tick(
        &mut self,
        agent: AgentId,
        net: &RoadNetwork,
        zones: &ZoneSet,
        params: &MotionParams,
        rng: &mut AgentRng,
        now: SimTime,
    ) -> MobilityResult<TickReport> {
        let router = &self.router;
        let state = self.store.placed_mut(agent)?;

        let dt_hours = millis_to_hours(now.since(state.last_update));
        state.last_update = now;
        state.in_heat_zone = in_heat_zone(zones, state);

        // ── Speed ─────────────────────────────────────────────────────────
        if state.lookahead.is_none() {
            state.lookahead = next_edge(net, state, rng);
        }
        let next_bearing = state.lookahead.map(|e| e.bearing(net));
        state.speed_kmh = next_speed(
            state.speed_kmh,
            state.bearing,
            next_bearing,
            state.in_heat_zone,
            dt_hours,
            params,
            rng,
        );

        // ── Position ──────────────────────────────────────────────────────
        let mut remaining = state.speed_kmh * dt_hours;
        let mut report = TickReport {
            distance_km: remaining,
            in_heat_zone: state.in_heat_zone,
            ..TickReport::default()
        };
        state.odometer_km += remaining;
        if remaining > 0.0 {
            state.last_moved = now;
        }

        let mut transitions = 0;
        loop {
            let len = state.edge.distance_km(net);
            let left = (1.0 - state.progress) * len;
            if remaining <= left || transitions >= MAX_TRANSITIONS {
                if len > 0.0 {
                    state.progress = (state.progress + remaining / len).min(1.0);
                }
                state.position = state.edge.point_at(net, state.progress);
                state.bearing = state.edge.bearing(net);
                break;
            }

            remaining -= left;
            transitions += 1;
            let next = advance(router, net, state, rng, &mut report);
            state.lookahead = None;
            state.enter(net, next);
        }

        Ok(report)
    }
}

/// Pick the edge to enter at the end of the current one.
fn advance<R: Router>(
    router: &R,
    net: &RoadNetwork,
    state: &mut MotionState,
    rng: &mut AgentRng,
    report: &mut TickReport,
) -> ActiveEdge {
    let end = state.edge.to(net);
    let u_turn = state.edge.u_turn();

    if let Some(cursor) = state.route.as_mut() {
        if let Some(e) = cursor.advance() {
            return ActiveEdge::forward(e);
        }
        state.route = None;
        report.route_completed = true;
        if let Some(route) = random_route(router, net, end, rng) {
            let first = route.edges[0];
            state.route = Some(RouteCursor::started(route.clone()));
            report.new_route = Some(route);
            return ActiveEdge::forward(first);
        }
    }

    match state.lookahead.take() {
        Some(e) if e.from(net) == end => e,
        _ => next_edge(net, state, rng).unwrap_or(u_turn),
    }
}

/// A non-empty route from `from` to a random node, or `None` after
/// [`REROUTE_ATTEMPTS`] failures.
fn random_route<R: Router>(
    router: &R,
    net: &RoadNetwork,
    from: NodeId,
    rng: &mut AgentRng,
) -> Option<Route> {
    for attempt in 0..REROUTE_ATTEMPTS {
        let Some(to) = net.random_node(rng.inner()) else { return None };
        match router.route(net, from, to) {
            Ok(route) if !route.is_empty() => return Some(route),
            Ok(_) => {}
            Err(e) => tracing::debug!(attempt, %from, %to, error = %e, "random re-route failed"),
        }
    }
    tracing::debug!(%from, "no random route found; wandering");
    None
}
