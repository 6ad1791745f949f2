//! Stateless pieces of the tick: next-edge choice and the speed rule.

use rf_core::{bearing_delta, AgentRng, EdgeId};
use rf_spatial::RoadNetwork;
use rf_zones::ZoneSet;

use crate::state::{ActiveEdge, MotionState, MotionParams};

/// The edge the agent would take after its current one.
///
/// Following: the route's next edge, or `None` on the last route edge.
/// Wandering: a continuation not yet visited (marked visited when chosen),
/// else any continuation, else a U-turn.  Never `None` while wandering.
pub fn next_edge(net: &RoadNetwork, state: &mut MotionState, rng: &mut AgentRng) -> Option<ActiveEdge> {
    if let Some(cursor) = &state.route {
        return cursor.peek().map(ActiveEdge::forward);
    }

    let candidates = net.continuations(state.edge.from(net), state.edge.to(net));
    if candidates.is_empty() {
        return Some(state.edge.u_turn());
    }

    let unvisited: Vec<EdgeId> = candidates
        .iter()
        .copied()
        .filter(|e| !state.visited.contains(e))
        .collect();
    let pick = match rng.choose(&unvisited) {
        Some(&e) => {
            state.visited.insert(e);
            e
        }
        None => *rng.choose(&candidates)?,
    };
    Some(ActiveEdge::forward(pick))
}

/// One application of the speed rule.
///
/// Gentle turn (or none) accelerates, a turn sharper than the threshold or
/// no next edge at all brakes.  Inside a heat zone the result is scaled by
/// the zone factor.  Then clamp, jitter, clamp.
pub fn next_speed(
    speed_kmh: f64,
    bearing: f64,
    next_bearing: Option<f64>,
    in_zone: bool,
    dt_hours: f64,
    params: &MotionParams,
    rng: &mut AgentRng,
) -> f64 {
    let gentle = next_bearing.is_some_and(|nb| bearing_delta(bearing, nb) <= params.turn_threshold);
    let mut v = if gentle {
        speed_kmh + params.acceleration * dt_hours
    } else {
        speed_kmh - params.deceleration * dt_hours
    };
    if in_zone {
        v *= params.heat_zone_speed_factor;
    }
    v = clamp(v, params);
    v *= rng.jitter(params.speed_variation);
    clamp(v, params)
}

/// `max`/`min` rather than `f64::clamp`, which panics on inverted bounds.
#[inline]
fn clamp(v: f64, params: &MotionParams) -> f64 {
    v.max(params.min_speed).min(params.max_speed)
}

#[inline]
pub fn in_heat_zone(zones: &ZoneSet, state: &MotionState) -> bool {
    zones.contains(state.position)
}
