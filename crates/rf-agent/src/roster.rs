//! Roster records as supplied by a roster source.

use std::fmt;

use rf_core::GeoPoint;

/// Duty status.  Declaration order is roster order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentStatus {
    #[cfg_attr(feature = "serde", serde(rename = "ONSHIFT"))]
    OnDuty,
    #[cfg_attr(feature = "serde", serde(rename = "ONLINE"))]
    Online,
    #[cfg_attr(feature = "serde", serde(rename = "OFFLINE"))]
    Offline,
    #[cfg_attr(feature = "serde", serde(rename = "UNTRACKED"))]
    Untracked,
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "UNKNOWN"))]
    Unknown,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 5] = [
        AgentStatus::OnDuty,
        AgentStatus::Online,
        AgentStatus::Offline,
        AgentStatus::Untracked,
        AgentStatus::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::OnDuty    => "ONSHIFT",
            AgentStatus::Online    => "ONLINE",
            AgentStatus::Offline   => "OFFLINE",
            AgentStatus::Untracked => "UNTRACKED",
            AgentStatus::Unknown   => "UNKNOWN",
        }
    }

    /// Lenient parse of a roster label; anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().replace(['_', '-', ' '], "").as_str() {
            "ONSHIFT" | "ONDUTY" => AgentStatus::OnDuty,
            "ONLINE"             => AgentStatus::Online,
            "OFFLINE"            => AgentStatus::Offline,
            "UNTRACKED"          => AgentStatus::Untracked,
            _                    => AgentStatus::Unknown,
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Small per-agent boolean state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentFlags {
    pub connectivity: bool,
    pub mechanical_fault: bool,
    pub low_fuel: bool,
    /// Written by the mobility layer on every tick.
    pub in_heat_zone: bool,
}

/// One agent as delivered by a roster source.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterEntry {
    /// External identifier (the sync service's key).
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: AgentStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Option<GeoPoint>,
}

impl RosterEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: AgentStatus) -> Self {
        Self { id: id.into(), name: name.into(), status, position: None }
    }

    pub fn at(mut self, position: GeoPoint) -> Self {
        self.position = Some(position);
        self
    }
}
