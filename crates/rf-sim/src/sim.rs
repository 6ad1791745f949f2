//! The `Sim` struct: lifecycle, dispatch, and the control surface.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use rf_agent::{AgentRngs, AgentStore, AgentStoreBuilder, RosterEntry};
use rf_core::{AgentId, EdgeId, GeoPoint, NodeId, SimRng, SimTime};
use rf_mobility::{MobilityEngine, MobilityStore};
use rf_schedule::{Task, WakeQueue};
use rf_spatial::{RoadMatch, RoadNetwork, Route, Router};
use rf_zones::{generate, ExportFormat, ZoneExport, ZoneSet};

use crate::event::{AgentSnapshot, RouteUpdate, SimEvent, SimStatus};
use crate::external::LocationReport;
use crate::{OptionsPatch, SimError, SimOptions, SimResult};

/// Result of [`Sim::set_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsApplied {
    /// Takes effect on the next fired task.
    Live,
    /// The roster source changed.  The simulation has been stopped and the
    /// caller must [`reset`](Sim::reset) it from the newly selected source.
    ResetRequired,
}

/// Nearest graph features to a coordinate.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Nearest {
    pub node: NodeId,
    pub node_position: GeoPoint,
    pub edge: EdgeId,
    pub edge_name: Option<String>,
}

/// The orchestrator.
///
/// `Sim<R>` owns the roster, every agent's motion state, and a single
/// [`WakeQueue`] holding one pending task per agent plus the sync and
/// heat-zone tasks.  Time is virtual: [`advance_to`](Sim::advance_to) fires
/// every task due up to the given instant, in fire-time order.
///
/// The network is shared read-only; the zone set is swapped as a whole
/// `Arc` on regeneration.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<R: Router> {
    pub(crate) options: SimOptions,
    pub(crate) network: Arc<RoadNetwork>,
    pub(crate) zones: Arc<ZoneSet>,
    pub(crate) agents: AgentStore,
    pub(crate) rngs: AgentRngs,
    pub(crate) mobility: MobilityEngine<R>,
    pub(crate) queue: WakeQueue,
    pub(crate) rng: SimRng,
    pub(crate) roster: Vec<RosterEntry>,
    pub(crate) running: bool,
    pub(crate) now: SimTime,
    pub(crate) epoch: DateTime<Utc>,
    pub(crate) origin_tag: String,
    pub(crate) events: VecDeque<SimEvent>,
    pub(crate) sync_batches: Vec<Vec<LocationReport>>,
}

impl<R: Router> Sim<R> {
    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Merge `patch`, then schedule one repeating tick per agent, plus the
    /// sync task when enabled and the heat-zone task.  Starting a running
    /// simulation re-arms every task with the merged options.
    pub fn start(&mut self, patch: &OptionsPatch) -> SimResult<()> {
        let options = self.options.merged(patch);
        options.validate()?;
        self.options = options;
        self.queue.clear();

        let now = self.now;
        let interval = self.options.update_interval_ms;
        for agent in self.agents.agent_ids() {
            if let Ok(state) = self.mobility.store.get_mut(agent) {
                state.last_update = now;
                state.last_moved = now;
            }
            self.queue.schedule(Task::Agent(agent), now.after(interval));
        }
        if self.options.update_server {
            self.queue.schedule(Task::Sync, now.after(self.options.sync_interval_ms));
        }
        self.queue.schedule(Task::HeatZones, now.after(self.options.heat_zone_interval_ms));

        self.running = true;
        tracing::info!(agents = self.agents.count, interval_ms = interval, "simulation started");
        self.publish(SimEvent::Options(self.options.clone()));
        self.publish_status();
        Ok(())
    }

    /// Cancel every scheduled task.  Agent state is kept.  Stopping a
    /// stopped simulation does nothing.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.queue.clear();
        self.running = false;
        tracing::info!("simulation stopped");
        self.publish_status();
    }

    /// Stop, discard every agent, and rebuild the roster from `roster`
    /// (`None` reuses the last roster, e.g. after a failed fetch).
    pub fn reset(&mut self, roster: Option<Vec<RosterEntry>>) {
        self.stop();
        if let Some(r) = roster {
            self.roster = r;
        }

        let (agents, mut rngs) = AgentStoreBuilder::new(self.rng.next_seed())
            .entries(self.roster.iter().cloned())
            .build();
        self.mobility.store = MobilityStore::new(agents.count);

        let params = self.options.motion_params();
        let now = self.now;
        for agent in agents.agent_ids() {
            let hint = agents.initial_position[agent.index()];
            let placed = self.mobility.place(agent, &self.network, hint, &params, rngs.get_mut(agent), now);
            if let Err(e) = placed {
                tracing::warn!(%agent, error = %e, "could not place agent");
            }
        }
        tracing::info!(agents = agents.count, "roster loaded");

        self.agents = agents;
        self.rngs = rngs;
        self.publish_status();
    }

    /// Merge `patch` into the live options.  An invalid result is rejected
    /// and the live options stay as they were.
    pub fn set_options(&mut self, patch: &OptionsPatch) -> SimResult<OptionsApplied> {
        let options = self.options.merged(patch);
        options.validate()?;
        let source_changed = options.use_adapter != self.options.use_adapter;
        let sync_changed = options.update_server != self.options.update_server;
        self.options = options;
        self.publish(SimEvent::Options(self.options.clone()));

        if source_changed {
            self.stop();
            return Ok(OptionsApplied::ResetRequired);
        }
        if self.running && sync_changed {
            if self.options.update_server {
                self.queue.schedule(Task::Sync, self.now.after(self.options.sync_interval_ms));
            } else {
                self.queue.cancel(Task::Sync);
            }
        }
        Ok(OptionsApplied::Live)
    }

    // ── Clock ─────────────────────────────────────────────────────────────

    /// Fire every task due at or before `now`.  Earlier instants are ignored.
    pub fn advance_to(&mut self, now: SimTime) {
        while let Some((at, task)) = self.queue.pop_due(now) {
            self.now = self.now.max(at);
            self.dispatch(task, at);
        }
        self.now = self.now.max(now);
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// When the next task fires, if any.
    pub fn next_wake(&self) -> Option<SimTime> {
        self.queue.next_time()
    }

    fn dispatch(&mut self, task: Task, at: SimTime) {
        match task {
            Task::Agent(agent) => {
                self.tick_agent(agent, at);
                self.queue.schedule(task, at.after(self.options.update_interval_ms));
            }
            Task::Sync => {
                if self.options.update_server {
                    let batch = self.location_batch(at);
                    self.sync_batches.push(batch);
                    self.queue.schedule(task, at.after(self.options.sync_interval_ms));
                }
            }
            Task::HeatZones => {
                if let Err(e) = self.generate_heat_zones() {
                    tracing::warn!(error = %e, "heat-zone regeneration failed");
                }
                self.queue.schedule(task, at.after(self.options.heat_zone_interval_ms));
            }
        }
    }

    fn tick_agent(&mut self, agent: AgentId, now: SimTime) {
        let params = self.options.motion_params();

        let stuck = match (self.options.stuck_timeout_ms, self.mobility.state(agent)) {
            (Some(limit), Ok(state)) => now.since(state.last_moved) > limit,
            _ => false,
        };
        if stuck {
            tracing::warn!(%agent, "agent stuck; resetting");
            if let Err(e) = self.mobility.reset_agent(agent, &self.network, &params, self.rngs.get_mut(agent), now) {
                tracing::warn!(%agent, error = %e, "reset failed");
            }
            self.publish_agent(agent);
            return;
        }

        let ticked = self.mobility.tick(
            agent,
            &self.network,
            &self.zones,
            &params,
            self.rngs.get_mut(agent),
            now,
        );
        match ticked {
            Ok(report) => {
                self.agents.flags[agent.index()].in_heat_zone = report.in_heat_zone;
                if report.route_completed {
                    if let Ok(state) = self.mobility.state(agent) {
                        let position = state.position;
                        let id = self.agents.external_id[agent.index()].clone();
                        self.publish(SimEvent::DestinationReached { id, position });
                    }
                }
                if let Some(route) = report.new_route {
                    self.publish_route(agent, &route);
                }
            }
            Err(e) => {
                tracing::warn!(%agent, error = %e, "tick failed; resetting agent");
                if let Err(e) = self.mobility.reset_agent(agent, &self.network, &params, self.rngs.get_mut(agent), now) {
                    tracing::warn!(%agent, error = %e, "reset failed");
                }
            }
        }
        self.publish_agent(agent);
    }

    fn location_batch(&self, at: SimTime) -> Vec<LocationReport> {
        let offset = TimeDelta::milliseconds(i64::try_from(at.0).unwrap_or(i64::MAX));
        let stamp = self.epoch.checked_add_signed(offset).unwrap_or(self.epoch);
        self.agents
            .agent_ids()
            .filter_map(|a| {
                let state = self.mobility.state(a).ok().filter(|s| s.is_placed())?;
                Some(LocationReport {
                    latitude: state.position.lat,
                    longitude: state.position.lon,
                    id: self.agents.external_id[a.index()].clone(),
                    position_received_at: stamp,
                    position_origin_ref_id: self.origin_tag.clone(),
                })
            })
            .collect()
    }

    // ── Control surface ───────────────────────────────────────────────────

    /// Route the agent with external id `id` toward `target`.
    pub fn set_destination(&mut self, id: &str, target: GeoPoint) -> SimResult<Route> {
        let agent = self.resolve(id)?;
        let route = self.mobility.set_destination(agent, &self.network, target)?;
        if !route.is_trivial() {
            self.publish_route(agent, &route);
        }
        self.publish_agent(agent);
        Ok(route)
    }

    /// [`set_destination`](Self::set_destination) for each request; one
    /// failure does not stop the others.
    pub fn set_destinations(&mut self, requests: &[(String, GeoPoint)]) -> Vec<SimResult<Route>> {
        requests
            .iter()
            .map(|(id, target)| {
                let r = self.set_destination(id, *target);
                if let Err(e) = &r {
                    tracing::warn!(id = %id, error = %e, "destination request failed");
                }
                r
            })
            .collect()
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.agent_ids().filter_map(|a| self.snapshot_of(a)).collect()
    }

    pub fn snapshot(&self, id: &str) -> SimResult<AgentSnapshot> {
        let agent = self.resolve(id)?;
        self.snapshot_of(agent).ok_or_else(|| SimError::AgentNotFound(id.to_owned()))
    }

    /// Active routes from each agent's current position: the rest of the
    /// current edge, then the edges not yet entered.
    pub fn routes(&self) -> Vec<RouteUpdate> {
        self.agents.agent_ids().filter_map(|a| self.remaining_route(a)).collect()
    }

    pub fn status(&self) -> SimStatus {
        SimStatus {
            running: self.running,
            interval_ms: self.options.update_interval_ms,
            agents: self.agents.count,
            time: self.now,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    pub fn network(&self) -> &Arc<RoadNetwork> {
        &self.network
    }

    /// The active zone set.  Holders keep their snapshot across
    /// regenerations.
    pub fn zones(&self) -> Arc<ZoneSet> {
        Arc::clone(&self.zones)
    }

    pub fn export_zones(&self, format: ExportFormat) -> ZoneExport {
        ZoneExport::from_set(&self.zones, format)
    }

    /// Replace the active zone set with a freshly generated one.
    pub fn generate_heat_zones(&mut self) -> SimResult<usize> {
        let set = generate(&self.network, &self.options.heat_zones, &mut self.rng, self.now)?;
        let n = set.len();
        self.zones = Arc::new(set);
        self.publish(SimEvent::HeatZones(self.export_zones(ExportFormat::Polygons)));
        Ok(n)
    }

    pub fn search_roads(&self, query: &str) -> Vec<RoadMatch> {
        self.network.search_by_name(query)
    }

    pub fn nearest(&self, point: GeoPoint) -> SimResult<Nearest> {
        let node = self.network.find_nearest_node(point)?;
        let edge = self.network.find_nearest_edge(point)?;
        Ok(Nearest {
            node,
            node_position: self.network.node_pos[node.index()],
            edge,
            edge_name: self.network.edge_name(edge).map(str::to_owned),
        })
    }

    // ── Outbound queues ───────────────────────────────────────────────────

    /// Take every event published since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    /// Take the location batches produced by fired sync tasks.
    pub fn take_sync_batches(&mut self) -> Vec<Vec<LocationReport>> {
        std::mem::take(&mut self.sync_batches)
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn resolve(&self, id: &str) -> SimResult<AgentId> {
        self.agents.lookup(id).map_err(|_| SimError::AgentNotFound(id.to_owned()))
    }

    fn snapshot_of(&self, agent: AgentId) -> Option<AgentSnapshot> {
        let state = self.mobility.state(agent).ok().filter(|s| s.is_placed())?;
        let i = agent.index();
        Some(AgentSnapshot {
            id: self.agents.external_id[i].clone(),
            name: self.agents.name[i].clone(),
            status: self.agents.status[i],
            flags: self.agents.flags[i],
            position: state.position,
            speed: state.speed_kmh,
            heading: state.bearing,
            odometer_km: state.odometer_km,
        })
    }

    /// What is left of `agent`'s active route; `None` while wandering.
    fn remaining_route(&self, agent: AgentId) -> Option<RouteUpdate> {
        let net = &self.network;
        let state = self.mobility.state(agent).ok()?;
        let ahead = state.route.as_ref()?.remaining();

        let edges: Vec<EdgeId> = std::iter::once(state.edge.edge).chain(ahead.iter().copied()).collect();
        let distance_km = ahead
            .iter()
            .fold((1.0 - state.progress) * state.edge.distance_km(net), |km, e| {
                km + net.edge_distance_km[e.index()]
            });
        let coordinates = std::iter::once(state.position)
            .chain(std::iter::once(net.node_pos[state.edge.to(net).index()]))
            .chain(ahead.iter().map(|e| net.node_pos[net.edge_to[e.index()].index()]))
            .collect();
        let speed = state.speed_kmh;
        Some(RouteUpdate {
            id: self.agents.external_id[agent.index()].clone(),
            edges,
            coordinates,
            distance_km,
            eta_secs: (speed > 0.0).then(|| distance_km / speed * 3_600.0),
        })
    }

    /// `route` in full, for a route the agent has already finished.
    fn route_update(&self, agent: AgentId, route: &Route, speed_kmh: f64) -> RouteUpdate {
        let net = &self.network;
        let coordinates = route
            .edges
            .first()
            .map(|e| net.node_pos[net.edge_from[e.index()].index()])
            .into_iter()
            .chain(route.edges.iter().map(|e| net.node_pos[net.edge_to[e.index()].index()]))
            .collect();
        RouteUpdate {
            id: self.agents.external_id[agent.index()].clone(),
            edges: route.edges.clone(),
            coordinates,
            distance_km: route.distance_km,
            eta_secs: route.eta_secs(speed_kmh),
        }
    }

    fn publish(&mut self, event: SimEvent) {
        self.events.push_back(event);
    }

    fn publish_status(&mut self) {
        let status = self.status();
        self.publish(SimEvent::Status(status));
    }

    fn publish_agent(&mut self, agent: AgentId) {
        if let Some(snap) = self.snapshot_of(agent) {
            self.publish(SimEvent::Agent(snap));
        }
    }

    /// Publish the agent's active route from where it stands; a route it
    /// already completed within the same tick goes out whole.
    fn publish_route(&mut self, agent: AgentId, route: &Route) {
        let update = self.remaining_route(agent).unwrap_or_else(|| {
            let speed = self.mobility.state(agent).map(|s| s.speed_kmh).unwrap_or(0.0);
            self.route_update(agent, route, speed)
        });
        self.publish(SimEvent::Route(update));
    }
}
