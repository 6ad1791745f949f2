//! Build a [`RoadNetwork`] from GeoJSON line geometry.
//!
//! Accepts a `FeatureCollection`, a single `Feature`, or a bare geometry.
//! `LineString` and `MultiLineString` geometries become streets; every other
//! geometry type, and any feature whose coordinates cannot be read, is
//! skipped.  Positions are GeoJSON `[lon, lat, ...]`.
//!
//! Street key: `properties.id`, then the feature-level `id`, else generated.
//! Street name: `properties.name`.

use std::path::Path;

use serde_json::Value;

use rf_core::GeoPoint;

use crate::network::{RoadNetwork, RoadNetworkBuilder};
use crate::SpatialResult;

/// Read and parse a GeoJSON file.
pub fn load_geojson(path: impl AsRef<Path>) -> SpatialResult<RoadNetwork> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let net = network_from_geojson_str(&text)?;
    tracing::info!(
        path = %path.as_ref().display(),
        nodes = net.node_count(),
        edges = net.edge_count(),
        "loaded road network"
    );
    Ok(net)
}

pub fn network_from_geojson_str(text: &str) -> SpatialResult<RoadNetwork> {
    let value: Value = serde_json::from_str(text)?;
    Ok(network_from_geojson_value(&value))
}

pub fn network_from_geojson_value(value: &Value) -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    let mut skipped = 0usize;

    let features: Vec<&Value> = match kind(value) {
        Some("FeatureCollection") => value
            .get("features")
            .and_then(Value::as_array)
            .map(|fs| fs.iter().collect())
            .unwrap_or_default(),
        Some("Feature") => vec![value],
        Some(_) => {
            // Bare geometry, no properties.
            add_geometry(&mut b, value, None, None);
            vec![]
        }
        None => vec![],
    };

    for feature in features {
        let Some(geometry) = feature.get("geometry") else {
            skipped += 1;
            continue;
        };
        let props = feature.get("properties");
        let key = props
            .and_then(|p| p.get("id"))
            .or_else(|| feature.get("id"))
            .and_then(id_string);
        let name = props
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        if !add_geometry(&mut b, geometry, key, name) {
            skipped += 1;
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped non-line or malformed features");
    }
    b.build()
}

fn kind(v: &Value) -> Option<&str> {
    v.get("type").and_then(Value::as_str)
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Returns `false` if the geometry was not line-shaped or was unreadable.
fn add_geometry(
    b: &mut RoadNetworkBuilder,
    geometry: &Value,
    key: Option<String>,
    name: Option<String>,
) -> bool {
    let coords = geometry.get("coordinates");
    match kind(geometry) {
        Some("LineString") => match coords.and_then(line) {
            Some(vertices) => {
                b.add_line(key, name, &vertices);
                true
            }
            None => false,
        },
        Some("MultiLineString") => {
            let Some(parts) = coords.and_then(Value::as_array) else { return false };
            let lines: Option<Vec<Vec<GeoPoint>>> = parts.iter().map(line).collect();
            let Some(lines) = lines else { return false };
            let street = b.add_street(key, name);
            for vertices in &lines {
                for pair in vertices.windows(2) {
                    b.add_segment(street, pair[0], pair[1]);
                }
            }
            true
        }
        _ => false,
    }
}

fn line(v: &Value) -> Option<Vec<GeoPoint>> {
    v.as_array()?.iter().map(position).collect()
}

fn position(v: &Value) -> Option<GeoPoint> {
    let p = v.as_array()?;
    let lon = p.first()?.as_f64()?;
    let lat = p.get(1)?.as_f64()?;
    Some(GeoPoint::new(lat, lon))
}
