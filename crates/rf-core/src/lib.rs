//! `rf-core`: foundational types for the roadfleet simulator.
//!
//! Every other `rf-*` crate depends on this one; it has no `rf-*`
//! dependencies and only `rand` + `thiserror` (plus optional `serde`).
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `AgentId`, `NodeId`, `EdgeId`, `StreetId`, `ZoneId`       |
//! | [`geo`]     | `GeoPoint`, haversine, forward azimuth, destination point |
//! | [`time`]    | `SimTime` (virtual milliseconds)                          |
//! | [`rng`]     | `AgentRng` (per-agent), `SimRng` (global)                 |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{bearing_delta, normalize_bearing, reverse_bearing, GeoPoint, EARTH_RADIUS_KM};
pub use ids::{AgentId, EdgeId, NodeId, StreetId, ZoneId};
pub use rng::{AgentRng, SimRng};
pub use time::{millis_to_hours, SimTime};
