//! Embedded sample road network.
//!
//! Six named streets laid out as a small downtown grid near Mobile, Alabama.
//! Used when no `geojson_path` is configured.

use rf_spatial::{RoadNetwork, SpatialResult, network_from_geojson_str};

const SAMPLE_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    { "type": "Feature", "properties": { "id": "st-1", "name": "Government Street" },
      "geometry": { "type": "LineString", "coordinates": [[-88.070, 30.690], [-88.060, 30.690], [-88.050, 30.690], [-88.040, 30.690]] } },
    { "type": "Feature", "properties": { "id": "st-2", "name": "Dauphin Street" },
      "geometry": { "type": "LineString", "coordinates": [[-88.070, 30.700], [-88.060, 30.700], [-88.050, 30.700], [-88.040, 30.700]] } },
    { "type": "Feature", "properties": { "id": "st-3", "name": "Spring Hill Avenue" },
      "geometry": { "type": "LineString", "coordinates": [[-88.070, 30.710], [-88.060, 30.710], [-88.050, 30.710], [-88.040, 30.710]] } },
    { "type": "Feature", "properties": { "id": "st-4", "name": "Broad Street" },
      "geometry": { "type": "LineString", "coordinates": [[-88.060, 30.690], [-88.060, 30.700], [-88.060, 30.710]] } },
    { "type": "Feature", "properties": { "id": "st-5", "name": "Water Street" },
      "geometry": { "type": "LineString", "coordinates": [[-88.050, 30.690], [-88.050, 30.700], [-88.050, 30.710]] } },
    { "type": "Feature", "properties": { "id": "st-6", "name": "Broad Street" },
      "geometry": { "type": "MultiLineString", "coordinates": [
        [[-88.070, 30.690], [-88.070, 30.700]],
        [[-88.040, 30.700], [-88.040, 30.710]]
      ] } }
  ]
}"#;

pub fn sample_network() -> SpatialResult<RoadNetwork> {
    network_from_geojson_str(SAMPLE_GEOJSON)
}
