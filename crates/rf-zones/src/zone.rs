//! Heat-zone polygons and membership tests.

use rf_core::{GeoPoint, SimTime, ZoneId};

/// One closed polygon that slows agents inside it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeatZone {
    pub id: ZoneId,
    /// Closed ring: `ring[0] == ring[ring.len() - 1]`.
    pub ring: Vec<GeoPoint>,
    /// In `[0, 1]`.
    pub intensity: f64,
    pub created_at: SimTime,
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl HeatZone {
    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        point_in_ring(p, &self.ring)
    }
}

/// Even-odd ray casting on planar (lon, lat).  Points exactly on an edge
/// may land on either side.
pub fn point_in_ring(p: GeoPoint, ring: &[GeoPoint]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let cross_lon = a.lon + (p.lat - a.lat) * (b.lon - a.lon) / (b.lat - a.lat);
            if p.lon < cross_lon {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// The active zone set.  Immutable once built; regeneration produces a new
/// set which callers swap in whole.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneSet {
    pub zones: Vec<HeatZone>,
    pub generated_at: SimTime,
}

impl ZoneSet {
    pub fn new(zones: Vec<HeatZone>, generated_at: SimTime) -> Self {
        Self { zones, generated_at }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// `true` if `p` lies inside any zone.  Linear in the zone count.
    pub fn contains(&self, p: GeoPoint) -> bool {
        self.zones.iter().any(|z| z.contains(p))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeatZone> {
        self.zones.iter()
    }
}
