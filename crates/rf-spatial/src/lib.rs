//! `rf-spatial`: road network, spatial indexing, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`network`] | `RoadNetwork` (CSR + R-trees), `RoadNetworkBuilder`, streets |
//! | [`geojson`] | `load_geojson`, `network_from_geojson_str`                   |
//! | [`router`]  | `Router` trait, `Route`, `AStarRouter`                       |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod geojson;
pub mod network;
pub mod router;


pub use error::{SpatialError, SpatialResult};
pub use geojson::{load_geojson, network_from_geojson_str, network_from_geojson_value};
pub use network::{Bounds, RoadMatch, RoadNetwork, RoadNetworkBuilder, Street};
pub use router::{AStarRouter, Route, Router};
