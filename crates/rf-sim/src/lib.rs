//! `rf-sim`: orchestration for the roadfleet simulator.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`sim`]      | `Sim`: lifecycle, task dispatch, control surface            |
//! | [`builder`]  | `SimBuilder`                                                |
//! | [`options`]  | `SimOptions`, `OptionsPatch`, validation                    |
//! | [`event`]    | `SimEvent` and its payloads                                 |
//! | [`external`] | `RosterSource`, `LocationSink`, and their stock impls       |
//! | [`service`]  | `SimService` / `SimHandle`: tokio driver on the wall clock  |
//! | [`error`]    | `SimError`, `SimResult<T>`                                  |
//!
//! # Dispatch loop
//!
//! ```text
//! advance_to(now):
//!   while a task is due at t ≤ now (earliest first):
//!     Agent(a)   → tick a with elapsed = t − last update; reschedule t + update_interval
//!     Sync       → queue a location batch;                reschedule t + sync_interval
//!     HeatZones  → regenerate the zone set;               reschedule t + heat_zone_interval
//! ```
//!
//! `stop()` clears the queue, so nothing fires afterwards until the next
//! `start()`.  Everything observable is appended to an event queue that the
//! caller drains; the service forwards it to a broadcast channel.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rf_sim::{OptionsPatch, SimBuilder};
//! use rf_spatial::{load_geojson, AStarRouter};
//!
//! let network = load_geojson("export.geojson")?;
//! let mut sim = SimBuilder::new(network, AStarRouter::new()).roster(roster).build()?;
//! sim.start(&OptionsPatch::default())?;
//! sim.advance_to(rf_core::SimTime(60_000));
//! for event in sim.drain_events() { /* … */ }
//! ```

pub mod builder;
pub mod error;
pub mod event;
pub mod external;
pub mod options;
pub mod service;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use event::{AgentSnapshot, RouteUpdate, SimEvent, SimStatus};
pub use external::{
    ExternalError, JsonFileRoster, LocationReport, LocationSink, RosterSource, SyntheticRoster,
    TracingSink,
};
pub use options::{OptionsPatch, SimOptions};
pub use service::{Collaborators, SimHandle, SimService};
pub use sim::{Nearest, OptionsApplied, Sim};
