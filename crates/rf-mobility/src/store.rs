//! The `MobilityStore`: per-agent motion state.

use rf_core::AgentId;

use crate::{MobilityError, MobilityResult, MotionState};

/// `states` is indexed by `AgentId` and has one entry per roster agent.
/// Each tick touches exactly one entry.
pub struct MobilityStore {
    pub states: Vec<MotionState>,
}

impl MobilityStore {
    /// All agents start unplaced.
    pub fn new(agent_count: usize) -> Self {
        Self { states: (0..agent_count).map(|_| MotionState::unplaced()).collect() }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, agent: AgentId) -> MobilityResult<&MotionState> {
        self.states.get(agent.index()).ok_or(MobilityError::AgentNotFound(agent))
    }

    pub fn get_mut(&mut self, agent: AgentId) -> MobilityResult<&mut MotionState> {
        self.states.get_mut(agent.index()).ok_or(MobilityError::AgentNotFound(agent))
    }

    /// Like [`get_mut`](Self::get_mut) but also requires the agent to be
    /// placed.
    pub fn placed_mut(&mut self, agent: AgentId) -> MobilityResult<&mut MotionState> {
        let s = self.get_mut(agent)?;
        if s.is_placed() { Ok(s) } else { Err(MobilityError::NotPlaced(agent)) }
    }
}
