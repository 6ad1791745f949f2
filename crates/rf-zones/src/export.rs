//! Zone serialization for observers.

use crate::polyline::encode_polyline;
use crate::zone::ZoneSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExportFormat {
    /// Raw rings as GeoJSON-ordered `[lon, lat]` pairs.
    #[default]
    Polygons,
    /// One encoded polyline string per zone.
    Paths,
}

/// One zone as a plain polygon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZonePolygon {
    pub id: u32,
    pub intensity: f64,
    pub created_at_ms: u64,
    pub ring: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case", tag = "format", content = "zones"))]
pub enum ZoneExport {
    Polygons(Vec<ZonePolygon>),
    Paths(Vec<String>),
}

impl ZoneExport {
    pub fn from_set(set: &ZoneSet, format: ExportFormat) -> Self {
        match format {
            ExportFormat::Polygons => ZoneExport::Polygons(
                set.iter()
                    .map(|z| ZonePolygon {
                        id: z.id.0,
                        intensity: z.intensity,
                        created_at_ms: z.created_at.as_millis(),
                        ring: z.ring.iter().map(|p| [p.lon, p.lat]).collect(),
                    })
                    .collect(),
            ),
            ExportFormat::Paths => {
                ZoneExport::Paths(set.iter().map(|z| encode_polyline(&z.ring)).collect())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ZoneExport::Polygons(p) => p.len(),
            ZoneExport::Paths(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
