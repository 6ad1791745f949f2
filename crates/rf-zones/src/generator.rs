//! Procedural zone placement.
//!
//! For each zone: draw a center, a radius and an intensity; walk 12 equal
//! bearing steps around the center placing a vertex at `radius × U(0.7, 1.3)`
//! by spherical destination projection; close the ring and smooth it.

use rand::distributions::{Distribution, WeightedIndex};

use rf_core::{GeoPoint, NodeId, SimRng, SimTime, ZoneId};
use rf_spatial::RoadNetwork;

use crate::smooth::smooth_ring;
use crate::zone::{HeatZone, ZoneSet};
use crate::{ZoneError, ZoneResult};

const VERTICES: usize = 12;
const JITTER_MIN: f64 = 0.7;
const JITTER_MAX: f64 = 1.3;

/// Minimum out-degree for a node to count as an intersection.
const INTERSECTION_DEGREE: usize = 3;

/// Where zone centers come from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case", tag = "kind"))]
pub enum CenterStrategy {
    /// Uniform over the network's bounding box.
    #[default]
    UniformBounds,
    /// Intersections (out-degree ≥ 3), weighted by degree.  With
    /// `scale_radius`, busier junctions get proportionally larger zones
    /// (`degree / 4`, clamped to `[0.75, 1.5]`).
    WeightedIntersections { scale_radius: bool },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ZoneParams {
    pub count: usize,
    pub min_radius_km: f64,
    pub max_radius_km: f64,
    pub min_intensity: f64,
    pub max_intensity: f64,
    pub centers: CenterStrategy,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            count:         5,
            min_radius_km: 0.5,
            max_radius_km: 2.0,
            min_intensity: 0.3,
            max_intensity: 1.0,
            centers:       CenterStrategy::UniformBounds,
        }
    }
}

impl ZoneParams {
    pub fn validate(&self) -> ZoneResult<()> {
        let all = [self.min_radius_km, self.max_radius_km, self.min_intensity, self.max_intensity];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ZoneError::InvalidParams("values must be finite".into()));
        }
        if self.min_radius_km <= 0.0 || self.min_radius_km > self.max_radius_km {
            return Err(ZoneError::InvalidParams(format!(
                "radius range {}..{} km",
                self.min_radius_km, self.max_radius_km
            )));
        }
        if self.min_intensity < 0.0 || self.max_intensity > 1.0 || self.min_intensity > self.max_intensity {
            return Err(ZoneError::InvalidParams(format!(
                "intensity range {}..{}",
                self.min_intensity, self.max_intensity
            )));
        }
        Ok(())
    }
}

/// Generate a fresh zone set over `network`.
pub fn generate(
    network: &RoadNetwork,
    params: &ZoneParams,
    rng: &mut SimRng,
    now: SimTime,
) -> ZoneResult<ZoneSet> {
    params.validate()?;
    let bounds = network.bounds().ok_or(ZoneError::EmptyNetwork)?;

    let intersections: Vec<(NodeId, usize)> = match params.centers {
        CenterStrategy::UniformBounds => Vec::new(),
        CenterStrategy::WeightedIntersections { .. } => (0..network.node_count())
            .map(NodeId::from_index)
            .map(|n| (n, network.out_degree(n)))
            .filter(|&(_, d)| d >= INTERSECTION_DEGREE)
            .collect(),
    };
    let weighted = if intersections.is_empty() {
        None
    } else {
        WeightedIndex::new(intersections.iter().map(|&(_, d)| d)).ok()
    };
    if weighted.is_none() && params.centers != CenterStrategy::UniformBounds {
        tracing::debug!("no intersections to weight; placing zones uniformly");
    }

    let mut zones = Vec::with_capacity(params.count);
    for i in 0..params.count {
        let (center, scale) = match &weighted {
            Some(dist) => {
                let (node, degree) = intersections[dist.sample(rng.inner())];
                let scale = match params.centers {
                    CenterStrategy::WeightedIntersections { scale_radius: true } => {
                        (degree as f64 / 4.0).clamp(0.75, 1.5)
                    }
                    _ => 1.0,
                };
                (network.node_pos[node.index()], scale)
            }
            None => (
                GeoPoint::new(
                    rng.between(bounds.min.lat, bounds.max.lat),
                    rng.between(bounds.min.lon, bounds.max.lon),
                ),
                1.0,
            ),
        };
        let radius_km = rng.between(params.min_radius_km, params.max_radius_km) * scale;
        let intensity = rng.between(params.min_intensity, params.max_intensity);
        let ring = smooth_ring(&irregular_ring(center, radius_km, rng));

        zones.push(HeatZone {
            id: ZoneId::from_index(i),
            ring,
            intensity,
            created_at: now,
            center,
            radius_km,
        });
    }

    tracing::info!(count = zones.len(), at = %now, "generated heat zones");
    Ok(ZoneSet::new(zones, now))
}

/// 12 jittered vertices around `center`, closed.
fn irregular_ring(center: GeoPoint, radius_km: f64, rng: &mut SimRng) -> Vec<GeoPoint> {
    let mut ring: Vec<GeoPoint> = (0..VERTICES)
        .map(|i| {
            let bearing = i as f64 * 360.0 / VERTICES as f64;
            let jitter = rng.between(JITTER_MIN, JITTER_MAX);
            center.destination(radius_km * jitter, bearing)
        })
        .collect();
    ring.push(ring[0]);
    ring
}
