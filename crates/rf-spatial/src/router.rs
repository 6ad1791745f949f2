//! Routing trait and default A* implementation.
//!
//! # Pluggability
//!
//! The mobility layer calls routing via the [`Router`] trait, so other search
//! strategies can be swapped in without touching the agent model.
//!
//! # Cost units
//!
//! Edge cost is great-circle length in kilometres and the heuristic is the
//! great-circle distance to the goal.  Since edge lengths are themselves
//! great-circle distances, the triangle inequality makes the heuristic
//! admissible and consistent, so a node never needs re-expanding once
//! closed.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use rf_core::{EdgeId, NodeId};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// An ordered, contiguous list of edges and their total length.
///
/// Invariant: `edge_to[edges[i]] == edge_from[edges[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub edges: Vec<EdgeId>,
    /// Sum of `edge_distance_km` over `edges`.
    pub distance_km: f64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Seconds to cover the whole route at a constant `speed_kmh`.
    /// `None` when the speed is not positive.
    pub fn eta_secs(&self, speed_kmh: f64) -> Option<f64> {
        (speed_kmh > 0.0).then(|| self.distance_km / speed_kmh * 3_600.0)
    }

    /// Check the contiguity invariant against `network`.
    pub fn is_contiguous(&self, network: &RoadNetwork) -> bool {
        self.edges
            .windows(2)
            .all(|w| network.edge_to[w[0].index()] == network.edge_from[w[1].index()])
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// Implementations must be `Send + Sync`; one router is shared by every
/// agent tick.
pub trait Router: Send + Sync {
    /// Shortest route from `from` to `to`.  `from == to` yields an empty
    /// route, not an error.
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route>;
}

// ── AStarRouter ───────────────────────────────────────────────────────────────

/// A* over the CSR graph with a binary-heap open set.
///
/// Ties on f-score are broken by insertion order.  `max_expansions` bounds
/// the work done by one query; exceeding it yields
/// [`SpatialError::SearchBudgetExceeded`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarRouter {
    pub max_expansions: Option<usize>,
}

impl AStarRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(max_expansions: usize) -> Self {
        Self { max_expansions: Some(max_expansions) }
    }
}

impl Router for AStarRouter {
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route> {
        astar(network, from, to, self.max_expansions)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

fn astar(
    network: &RoadNetwork,
    from: NodeId,
    to: NodeId,
    budget: Option<usize>,
) -> SpatialResult<Route> {
    let n = network.node_count();
    if n == 0 {
        return Err(SpatialError::EmptyNetwork);
    }
    for node in [from, to] {
        if node.index() >= n {
            return Err(SpatialError::NodeNotFound(node));
        }
    }
    if from == to {
        return Ok(Route::default());
    }

    let goal = network.node_pos[to.index()];
    let h = |v: NodeId| network.node_pos[v.index()].distance_km(goal);

    let mut g_score   = vec![f64::INFINITY; n];
    let mut prev_edge = vec![EdgeId::INVALID; n];
    let mut closed    = vec![false; n];

    // Min-heap on (f, insertion seq, node).
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, u64, NodeId)>> = BinaryHeap::new();
    let mut seq = 0u64;
    let mut expanded = 0usize;

    g_score[from.index()] = 0.0;
    heap.push(Reverse((OrderedFloat(h(from)), seq, from)));

    while let Some(Reverse((_, _, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_edge, to));
        }
        if closed[node.index()] {
            continue;
        }
        closed[node.index()] = true;

        expanded += 1;
        if budget.is_some_and(|max| expanded > max) {
            return Err(SpatialError::SearchBudgetExceeded { from, to, expanded });
        }

        let g = g_score[node.index()];
        for edge in network.out_edges(node) {
            let next = network.edge_to[edge.index()];
            if closed[next.index()] {
                continue;
            }
            let tentative = g + network.edge_distance_km[edge.index()];
            if tentative < g_score[next.index()] {
                g_score[next.index()] = tentative;
                prev_edge[next.index()] = edge;
                seq += 1;
                heap.push(Reverse((OrderedFloat(tentative + h(next)), seq, next)));
            }
        }
    }

    Err(SpatialError::NoRouteFound { from, to })
}

fn reconstruct(network: &RoadNetwork, prev_edge: &[EdgeId], to: NodeId) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    loop {
        let e = prev_edge[cur.index()];
        if !e.is_valid() {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();
    let distance_km = edges.iter().map(|e| network.edge_distance_km[e.index()]).sum();
    Route { edges, distance_km }
}
