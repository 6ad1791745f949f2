//! Per-agent motion state.

use rustc_hash::FxHashSet;

use rf_core::{reverse_bearing, EdgeId, GeoPoint, NodeId, SimTime};
use rf_spatial::{RoadNetwork, Route};

// ── ActiveEdge ────────────────────────────────────────────────────────────────

/// The edge an agent is on, possibly traversed against its direction.
///
/// A reversed edge is the synthetic U-turn taken at a dead end: endpoints
/// swapped, bearing + 180°.  It is never inserted into the graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEdge {
    pub edge: EdgeId,
    pub reversed: bool,
}

impl ActiveEdge {
    #[inline]
    pub fn forward(edge: EdgeId) -> Self {
        Self { edge, reversed: false }
    }

    /// The same segment in the opposite direction.
    #[inline]
    pub fn u_turn(self) -> Self {
        Self { edge: self.edge, reversed: !self.reversed }
    }

    #[inline]
    pub fn from(self, net: &RoadNetwork) -> NodeId {
        if self.reversed { net.edge_to[self.edge.index()] } else { net.edge_from[self.edge.index()] }
    }

    #[inline]
    pub fn to(self, net: &RoadNetwork) -> NodeId {
        if self.reversed { net.edge_from[self.edge.index()] } else { net.edge_to[self.edge.index()] }
    }

    #[inline]
    pub fn bearing(self, net: &RoadNetwork) -> f64 {
        let b = net.edge_bearing[self.edge.index()];
        if self.reversed { reverse_bearing(b) } else { b }
    }

    #[inline]
    pub fn distance_km(self, net: &RoadNetwork) -> f64 {
        net.edge_distance_km[self.edge.index()]
    }

    /// Planar interpolation between this edge's start and end.
    pub fn point_at(self, net: &RoadNetwork, fraction: f64) -> GeoPoint {
        let a = net.node_pos[self.from(net).index()];
        let b = net.node_pos[self.to(net).index()];
        a.lerp(b, fraction)
    }
}

// ── RouteCursor ───────────────────────────────────────────────────────────────

/// An active route and the index of the next edge to enter.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteCursor {
    pub route: Route,
    pub next: usize,
}

impl RouteCursor {
    /// Cursor for an agent already on `route.edges[0]`.
    pub fn started(route: Route) -> Self {
        Self { route, next: 1 }
    }

    #[inline]
    pub fn peek(&self) -> Option<EdgeId> {
        self.route.edges.get(self.next).copied()
    }

    pub fn advance(&mut self) -> Option<EdgeId> {
        let e = self.peek()?;
        self.next += 1;
        Some(e)
    }

    /// Edges not yet entered.
    pub fn remaining(&self) -> &[EdgeId] {
        self.route.edges.get(self.next..).unwrap_or(&[])
    }
}

// ── MotionParams ──────────────────────────────────────────────────────────────

/// Tunables read on every tick.  Speeds are km/h; `acceleration` and
/// `deceleration` are km/h gained or shed per hour of elapsed time, so the
/// defaults amount to +5 and −7 km/h over a 5 s tick.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionParams {
    pub min_speed: f64,
    pub max_speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    /// Degrees; sharper turns brake.
    pub turn_threshold: f64,
    /// Jitter amplitude in `[0, 1)`.
    pub speed_variation: f64,
    /// Multiplier applied inside heat zones, in `(0, 1]`.
    pub heat_zone_speed_factor: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            min_speed:              20.0,
            max_speed:              60.0,
            acceleration:           3_600.0,
            deceleration:           5_040.0,
            turn_threshold:         30.0,
            speed_variation:        0.1,
            heat_zone_speed_factor: 0.5,
        }
    }
}

// ── MotionState ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionMode {
    Following,
    Wandering,
}

/// Everything the kinematic update reads and writes for one agent.
#[derive(Clone, Debug)]
pub struct MotionState {
    pub edge: ActiveEdge,
    pub position: GeoPoint,
    pub speed_kmh: f64,
    /// Always the bearing of `edge`.
    pub bearing: f64,
    /// Fraction of `edge` covered, `[0, 1)`.
    pub progress: f64,
    /// Edges this agent has chosen while wandering.  Never shared.
    pub visited: FxHashSet<EdgeId>,
    pub route: Option<RouteCursor>,
    /// Next edge chosen by the last speed update, consumed at the next
    /// edge transition.
    pub lookahead: Option<ActiveEdge>,
    pub in_heat_zone: bool,
    pub last_update: SimTime,
    /// Last tick that covered a positive distance, or the placement time.
    pub last_moved: SimTime,
    /// Total kilometres travelled since placement.
    pub odometer_km: f64,
}

impl MotionState {
    /// Placeholder for an agent not yet on the network.
    pub fn unplaced() -> Self {
        Self {
            edge: ActiveEdge::forward(EdgeId::INVALID),
            position: GeoPoint::default(),
            speed_kmh: 0.0,
            bearing: 0.0,
            progress: 0.0,
            visited: FxHashSet::default(),
            route: None,
            lookahead: None,
            in_heat_zone: false,
            last_update: SimTime::ZERO,
            last_moved: SimTime::ZERO,
            odometer_km: 0.0,
        }
    }

    /// Fresh state at the start of `edge`, which counts as visited.
    pub fn at_start(net: &RoadNetwork, edge: ActiveEdge, speed_kmh: f64, now: SimTime) -> Self {
        let mut visited = FxHashSet::default();
        visited.insert(edge.edge);
        Self {
            edge,
            position: edge.point_at(net, 0.0),
            speed_kmh,
            bearing: edge.bearing(net),
            visited,
            last_update: now,
            last_moved: now,
            ..Self::unplaced()
        }
    }

    #[inline]
    pub fn is_placed(&self) -> bool {
        self.edge.edge.is_valid()
    }

    pub fn mode(&self) -> MotionMode {
        if self.route.is_some() { MotionMode::Following } else { MotionMode::Wandering }
    }

    /// Move to the start of `edge`, keeping speed, route and visited set.
    pub fn enter(&mut self, net: &RoadNetwork, edge: ActiveEdge) {
        self.edge = edge;
        self.progress = 0.0;
        self.position = edge.point_at(net, 0.0);
        self.bearing = edge.bearing(net);
    }
}
