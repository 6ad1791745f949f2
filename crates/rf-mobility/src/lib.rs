//! `rf-mobility`: per-agent kinematic state machine.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`state`]      | `MotionState`, `ActiveEdge`, `RouteCursor`, `MotionParams` |
//! | [`kinematics`] | next-edge choice, speed update, heat-zone check            |
//! | [`store`]      | `MobilityStore`: `Vec<MotionState>` indexed by `AgentId`   |
//! | [`engine`]     | `MobilityEngine<R>`: placement, ticks, redirection         |
//! | [`error`]      | `MobilityError`, `MobilityResult<T>`                       |
//!
//! # Movement model
//!
//! Each agent occupies one directed edge at a time with a `progress` fraction
//! along it.  A tick:
//!
//! 1. picks (or reuses) the next edge as a look-ahead,
//! 2. accelerates if the turn onto it is gentle, otherwise brakes, scales by
//!    the heat-zone factor, clamps, jitters, clamps again,
//! 3. consumes `speed × elapsed` kilometres, walking across as many edges as
//!    that covers.
//!
//! With an active [`Route`](rf_spatial::Route) the next edge is the route's
//! next edge (*Following*); without one the agent wanders, preferring edges
//! it has not taken before and U-turning at dead ends (*Wandering*).

pub mod engine;
pub mod error;
pub mod kinematics;
pub mod state;
pub mod store;


pub use engine::{MobilityEngine, TickReport};
pub use error::{MobilityError, MobilityResult};
pub use state::{ActiveEdge, MotionMode, MotionParams, MotionState, RouteCursor};
pub use store::MobilityStore;
