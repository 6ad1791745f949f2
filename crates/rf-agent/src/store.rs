//! Core agent storage: `AgentStore` (SoA identity data) and `AgentRngs`.
//!
//! RNGs live outside the store so a tick can hold `&mut AgentRngs` for one
//! agent while reading shared store data.

use rustc_hash::FxHashMap;

use rf_core::{AgentId, AgentRng, CoreError, CoreResult, GeoPoint};

use crate::roster::{AgentFlags, AgentStatus};

// ── AgentRngs ─────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG state, one per `AgentId`.
pub struct AgentRngs {
    pub inner: Vec<AgentRng>,
}

impl AgentRngs {
    pub(crate) fn new(count: usize, global_seed: u64) -> Self {
        let inner = (0..count)
            .map(|i| AgentRng::new(global_seed, AgentId::from_index(i)))
            .collect();
        Self { inner }
    }

    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> &mut AgentRng {
        &mut self.inner[agent.index()]
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for AgentRngs {
    fn default() -> Self {
        Self { inner: Vec::new() }
    }
}

// ── AgentStore ────────────────────────────────────────────────────────────────

/// Structure-of-Arrays storage for agent identity.
///
/// Every `Vec` has exactly `count` elements and `AgentId` indexes all of
/// them.  Ids follow roster order (status first, then arrival).
pub struct AgentStore {
    pub count: usize,

    /// External identifier as given by the roster source.
    pub external_id: Vec<String>,
    pub name: Vec<String>,
    pub status: Vec<AgentStatus>,
    pub flags: Vec<AgentFlags>,
    /// Starting position requested by the roster, if any.
    pub initial_position: Vec<Option<GeoPoint>>,

    by_external: FxHashMap<String, AgentId>,
}

impl AgentStore {
    pub fn empty() -> Self {
        Self {
            count: 0,
            external_id: Vec::new(),
            name: Vec::new(),
            status: Vec::new(),
            flags: Vec::new(),
            initial_position: Vec::new(),
            by_external: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterator over all `AgentId`s in ascending index order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.count).map(AgentId::from_index)
    }

    /// Resolve an external identifier.
    pub fn lookup(&self, external_id: &str) -> CoreResult<AgentId> {
        self.by_external
            .get(external_id)
            .copied()
            .ok_or_else(|| CoreError::UnknownExternalId(external_id.to_owned()))
    }

    /// Bounds-checked id validation.
    pub fn check(&self, agent: AgentId) -> CoreResult<AgentId> {
        if agent.index() < self.count {
            Ok(agent)
        } else {
            Err(CoreError::AgentNotFound(agent))
        }
    }

    pub(crate) fn push(
        &mut self,
        external_id: String,
        name: String,
        status: AgentStatus,
        flags: AgentFlags,
        position: Option<GeoPoint>,
    ) -> AgentId {
        let id = AgentId::from_index(self.count);
        self.by_external.insert(external_id.clone(), id);
        self.external_id.push(external_id);
        self.name.push(name);
        self.status.push(status);
        self.flags.push(flags);
        self.initial_position.push(position);
        self.count += 1;
        id
    }

    pub(crate) fn contains_external(&self, external_id: &str) -> bool {
        self.by_external.contains_key(external_id)
    }
}

impl Default for AgentStore {
    fn default() -> Self {
        Self::empty()
    }
}
