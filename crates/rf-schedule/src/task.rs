use std::fmt;

use rf_core::AgentId;

/// One schedulable unit of work.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Task {
    /// Kinematic tick of one agent.
    Agent(AgentId),
    /// Batched location push to the external sync service.
    Sync,
    /// Heat-zone regeneration.
    HeatZones,
}

impl Task {
    #[inline]
    pub fn agent(self) -> Option<AgentId> {
        match self {
            Task::Agent(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Agent(a) => write!(f, "tick({a})"),
            Task::Sync => f.write_str("sync"),
            Task::HeatZones => f.write_str("heat-zones"),
        }
    }
}
