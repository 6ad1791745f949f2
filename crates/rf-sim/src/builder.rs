//! Fluent builder for constructing a [`Sim`].

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use rf_agent::{AgentRngs, AgentStore, RosterEntry};
use rf_core::{SimRng, SimTime};
use rf_mobility::MobilityEngine;
use rf_schedule::WakeQueue;
use rf_spatial::{RoadNetwork, Router, SpatialError};
use rf_zones::generate;

use crate::external::DEFAULT_ORIGIN_TAG;
use crate::{Sim, SimOptions, SimResult};

/// Fluent builder for [`Sim<R>`].
///
/// # Required inputs
///
/// - the road network (must have at least one node)
/// - `R: Router` such as [`rf_spatial::AStarRouter`]
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                        |
/// |-------------------|--------------------------------|
/// | `.options(o)`     | `SimOptions::default()`        |
/// | `.roster(v)`      | no agents                      |
/// | `.seed(s)`        | `0`                            |
/// | `.epoch(t)`       | wall clock at `build()`        |
/// | `.origin_tag(s)`  | the default sync origin tag    |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(network, AStarRouter::new())
///     .roster(SyntheticRoster::default().fetch()?)
///     .seed(7)
///     .build()?;
/// sim.start(&OptionsPatch::default())?;
/// sim.advance_to(SimTime(60_000));
/// ```
pub struct SimBuilder<R: Router> {
    network:    Arc<RoadNetwork>,
    router:     R,
    options:    SimOptions,
    roster:     Vec<RosterEntry>,
    seed:       u64,
    epoch:      Option<DateTime<Utc>>,
    origin_tag: String,
}

impl<R: Router> SimBuilder<R> {
    pub fn new(network: impl Into<Arc<RoadNetwork>>, router: R) -> Self {
        Self {
            network:    network.into(),
            router,
            options:    SimOptions::default(),
            roster:     Vec::new(),
            seed:       0,
            epoch:      None,
            origin_tag: DEFAULT_ORIGIN_TAG.to_owned(),
        }
    }

    pub fn options(mut self, options: SimOptions) -> Self {
        self.options = options;
        self
    }

    pub fn roster(mut self, roster: Vec<RosterEntry>) -> Self {
        self.roster = roster;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Wall-clock instant of `SimTime::ZERO`, used to stamp location reports.
    pub fn epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn origin_tag(mut self, tag: impl Into<String>) -> Self {
        self.origin_tag = tag.into();
        self
    }

    /// Validate inputs, generate the first zone set, load the roster, and
    /// return a stopped [`Sim`].
    pub fn build(self) -> SimResult<Sim<R>> {
        self.options.validate()?;
        if self.network.node_count() == 0 || self.network.edge_count() == 0 {
            return Err(SpatialError::EmptyNetwork.into());
        }

        let mut rng = SimRng::new(self.seed);
        let zones = generate(&self.network, &self.options.heat_zones, &mut rng, SimTime::ZERO)?;
        tracing::info!(
            nodes = self.network.node_count(),
            edges = self.network.edge_count(),
            zones = zones.len(),
            "simulation built"
        );

        let mut sim = Sim {
            options:      self.options,
            network:      self.network,
            zones:        Arc::new(zones),
            agents:       AgentStore::empty(),
            rngs:         AgentRngs::default(),
            mobility:     MobilityEngine::new(self.router, 0),
            queue:        WakeQueue::new(),
            rng,
            roster:       Vec::new(),
            running:      false,
            now:          SimTime::ZERO,
            epoch:        self.epoch.unwrap_or_else(Utc::now),
            origin_tag:   self.origin_tag,
            events:       VecDeque::new(),
            sync_batches: Vec::new(),
        };
        sim.reset(Some(self.roster));
        Ok(sim)
    }
}
