//! Closed-curve smoothing.
//!
//! Each side `P[i] → P[i+1]` of the ring is replaced by a cubic Bézier whose
//! control points follow the neighbouring chords (Catmull-Rom style), so the
//! curve passes through every original vertex and stays tangent-continuous
//! across them.  Works on raw lat/lon; zones are a few kilometres across.

use rf_core::GeoPoint;

/// Fraction of the neighbouring chord used for each control-point offset.
const TENSION: f64 = 0.15;

/// Interpolated points per original side.
const STEPS_PER_SIDE: usize = 8;

/// Smooth a closed ring (`ring[0] == ring[last]`) or an open vertex cycle.
///
/// The result is closed.  Inputs with fewer than three distinct vertices are
/// returned closed but otherwise unchanged.
pub fn smooth_ring(ring: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut pts: Vec<GeoPoint> = ring.to_vec();
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    let n = pts.len();
    if n < 3 {
        if let Some(&first) = pts.first() {
            pts.push(first);
        }
        return pts;
    }

    let at = |i: usize| pts[i % n];
    let mut out = Vec::with_capacity(n * STEPS_PER_SIDE + 1);
    for i in 0..n {
        let p0 = at(i + n - 1);
        let p1 = at(i);
        let p2 = at(i + 1);
        let p3 = at(i + 2);
        let c1 = GeoPoint::new(
            p1.lat + (p2.lat - p0.lat) * TENSION,
            p1.lon + (p2.lon - p0.lon) * TENSION,
        );
        let c2 = GeoPoint::new(
            p2.lat - (p3.lat - p1.lat) * TENSION,
            p2.lon - (p3.lon - p1.lon) * TENSION,
        );
        for s in 0..STEPS_PER_SIDE {
            out.push(cubic(p1, c1, c2, p2, s as f64 / STEPS_PER_SIDE as f64));
        }
    }
    out.push(out[0]);
    out
}

fn cubic(a: GeoPoint, b: GeoPoint, c: GeoPoint, d: GeoPoint, t: f64) -> GeoPoint {
    let u = 1.0 - t;
    let (w0, w1, w2, w3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    GeoPoint::new(
        w0 * a.lat + w1 * b.lat + w2 * c.lat + w3 * d.lat,
        w0 * a.lon + w1 * b.lon + w2 * c.lon + w3 * d.lon,
    )
}
