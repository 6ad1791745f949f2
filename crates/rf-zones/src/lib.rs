//! `rf-zones`: heat zones.
//!
//! A heat zone is an irregular, smoothed polygon; agents inside any zone of
//! the active [`ZoneSet`] have their speed scaled down.  Sets are generated
//! whole and swapped whole: nothing mutates a set after [`generate`] returns
//! it.
//!
//! | Module        | Contents                                             |
//! |---------------|------------------------------------------------------|
//! | [`zone`]      | `HeatZone`, `ZoneSet`, point-in-polygon              |
//! | [`generator`] | `generate`, `ZoneParams`, `CenterStrategy`           |
//! | [`smooth`]    | closed Bézier smoothing of a vertex ring             |
//! | [`polyline`]  | 1e-5 delta/zigzag polyline encoding                  |
//! | [`export`]    | `ZoneExport` as polygon rings or encoded paths       |
//! | [`error`]     | `ZoneError`, `ZoneResult<T>`                         |

pub mod error;
pub mod export;
pub mod generator;
pub mod polyline;
pub mod smooth;
pub mod zone;


pub use error::{ZoneError, ZoneResult};
pub use export::{ExportFormat, ZoneExport, ZonePolygon};
pub use generator::{generate, CenterStrategy, ZoneParams};
pub use polyline::encode_polyline;
pub use smooth::smooth_ring;
pub use zone::{point_in_ring, HeatZone, ZoneSet};
