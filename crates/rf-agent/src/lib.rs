//! `rf-agent`: Structure-of-Arrays roster storage.
//!
//! # Crate layout
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`roster`]    | `RosterEntry`, `AgentStatus`, `AgentFlags`             |
//! | [`store`]     | `AgentStore` (SoA identity data), `AgentRngs`          |
//! | [`builder`]   | `AgentStoreBuilder` (ordering, id assignment, flags)   |
//!
//! Motion state lives in `rf-mobility`; this crate only knows who the agents
//! are.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on all public types.    |

pub mod builder;
pub mod roster;
pub mod store;

#[cfg(test)]
mod tests;

pub use builder::AgentStoreBuilder;
pub use roster::{AgentFlags, AgentStatus, RosterEntry};
pub use store::{AgentRngs, AgentStore};
