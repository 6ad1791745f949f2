//! Encoded polyline format (precision 1e-5).
//!
//! Each coordinate is rounded to an integer number of 1e-5 degrees,
//! delta-encoded against the previous point, zigzag-encoded, and emitted as
//! 5-bit chunks (low first, `0x20` continuation bit) offset by 63 into
//! printable ASCII.  Latitude precedes longitude for every point.
//!
//! Rounding is half-up (`floor(x + 0.5)`), so `-0.5` rounds to `0`; other
//! encoders in the wild that round half away from zero can differ on exact
//! ties.

use rf_core::GeoPoint;

const PRECISION: f64 = 1e5;

#[inline]
fn round_e5(deg: f64) -> i64 {
    (deg * PRECISION + 0.5).floor() as i64
}

fn push_value(out: &mut String, delta: i64) {
    let mut v = ((delta << 1) ^ (delta >> 63)) as u64;
    while v >= 0x20 {
        out.push(char::from((0x20 | (v & 0x1f)) as u8 + 63));
        v >>= 5;
    }
    out.push(char::from(v as u8 + 63));
}

/// Encode `points` as a polyline string.  Empty input gives an empty string.
pub fn encode_polyline(points: &[GeoPoint]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let (mut prev_lat, mut prev_lon) = (0i64, 0i64);
    for p in points {
        let (lat, lon) = (round_e5(p.lat), round_e5(p.lon));
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lon - prev_lon);
        prev_lat = lat;
        prev_lon = lon;
    }
    out
}
