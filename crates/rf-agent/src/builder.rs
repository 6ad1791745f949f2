//! Build `AgentStore` + `AgentRngs` from roster entries.
//!
//! # Usage
//!
//! ```rust
//! use rf_agent::{AgentStatus, AgentStoreBuilder, RosterEntry};
//!
//! let (store, rngs) = AgentStoreBuilder::new(/*seed=*/ 42)
//!     .entry(RosterEntry::new("a", "Alpha", AgentStatus::Offline))
//!     .entry(RosterEntry::new("b", "Bravo", AgentStatus::OnDuty))
//!     .build();
//!
//! assert_eq!(store.count, 2);
//! assert_eq!(rngs.len(), 2);
//! assert_eq!(store.name[0], "Bravo"); // on-duty agents come first
//! ```

use rf_core::AgentId;

use crate::roster::{AgentFlags, RosterEntry};
use crate::{AgentRngs, AgentStore};

/// Probabilities of the random flags drawn at creation.
const P_CONNECTIVITY: f64 = 0.7;
const P_MECHANICAL_FAULT: f64 = 0.05;
const P_LOW_FUEL: f64 = 0.3;

pub struct AgentStoreBuilder {
    seed: u64,
    entries: Vec<RosterEntry>,
}

impl AgentStoreBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed, entries: Vec::new() }
    }

    pub fn entry(mut self, entry: RosterEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(mut self, entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Order by status (stable), assign ids, seed RNGs, and draw each
    /// agent's initial flags from its own RNG.
    ///
    /// Entries repeating an earlier external id are dropped.
    pub fn build(mut self) -> (AgentStore, AgentRngs) {
        self.entries.sort_by_key(|e| e.status);

        let mut store = AgentStore::empty();
        let mut dropped = 0usize;
        for e in self.entries {
            if store.contains_external(&e.id) {
                dropped += 1;
                continue;
            }
            store.push(e.id, e.name, e.status, AgentFlags::default(), e.position);
        }
        if dropped > 0 {
            tracing::warn!(dropped, "duplicate roster ids ignored");
        }

        let mut rngs = AgentRngs::new(store.count, self.seed);
        for i in 0..store.count {
            let rng = rngs.get_mut(AgentId::from_index(i));
            store.flags[i] = AgentFlags {
                connectivity: rng.gen_bool(P_CONNECTIVITY),
                mechanical_fault: rng.gen_bool(P_MECHANICAL_FAULT),
                low_fuel: rng.gen_bool(P_LOW_FUEL),
                in_heat_zone: false,
            };
        }

        (store, rngs)
    }
}
