//! Collaborator boundary: roster sources and location sinks.
//!
//! Both sides are plain blocking traits.  The async driver runs them on the
//! blocking pool under a timeout and only ever logs their failures.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rf_agent::{AgentStatus, RosterEntry};
use rf_core::{GeoPoint, SimRng};

/// Origin tag stamped on every report unless the builder overrides it.
pub const DEFAULT_ORIGIN_TAG: &str = "b13c099c-ab20-11ea-8f69-0673f8c18e22";

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("timed out after {0} ms")]
    Timeout(u64),
}

// ── Roster ────────────────────────────────────────────────────────────────────

/// Supplies the agent list on start-up and on every reset.
pub trait RosterSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<RosterEntry>, ExternalError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "roster"
    }
}

/// `count` agents with ids `"0"..` and names `V0..`, statuses drawn at
/// random from a fixed seed.
#[derive(Debug, Clone)]
pub struct SyntheticRoster {
    pub count: usize,
    pub seed: u64,
}

impl SyntheticRoster {
    pub const DEFAULT_COUNT: usize = 70;

    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, seed }
    }
}

impl Default for SyntheticRoster {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COUNT, 0)
    }
}

impl RosterSource for SyntheticRoster {
    fn fetch(&self) -> Result<Vec<RosterEntry>, ExternalError> {
        let mut rng = SimRng::new(self.seed);
        Ok((0..self.count)
            .map(|i| {
                let status = AgentStatus::ALL[rng.gen_range(0..AgentStatus::ALL.len())];
                RosterEntry::new(i.to_string(), format!("V{i}"), status)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// One roster record on disk.  `callsign` is accepted for `name`; the
/// status label is parsed leniently.
#[derive(Deserialize)]
struct RosterRecord {
    id: String,
    #[serde(alias = "callsign")]
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    position: Option<GeoPoint>,
}

/// A JSON array of roster records read from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileRoster {
    path: PathBuf,
}

impl JsonFileRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterSource for JsonFileRoster {
    fn fetch(&self) -> Result<Vec<RosterEntry>, ExternalError> {
        let text = std::fs::read_to_string(&self.path)?;
        let records: Vec<RosterRecord> = serde_json::from_str(&text)?;
        Ok(records
            .into_iter()
            .map(|r| RosterEntry {
                id: r.id,
                name: r.name,
                status: AgentStatus::from_label(&r.status),
                position: r.position,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

// ── Location sync ─────────────────────────────────────────────────────────────

/// One agent's position as pushed to the sync service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub latitude: f64,
    pub longitude: f64,
    pub id: String,
    pub position_received_at: DateTime<Utc>,
    pub position_origin_ref_id: String,
}

pub trait LocationSink: Send + Sync {
    fn push(&self, batch: &[LocationReport]) -> Result<(), ExternalError>;
}

/// Logs each batch instead of sending it anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LocationSink for TracingSink {
    fn push(&self, batch: &[LocationReport]) -> Result<(), ExternalError> {
        tracing::info!(reports = batch.len(), "location batch");
        for r in batch {
            tracing::trace!(id = %r.id, lat = r.latitude, lon = r.longitude, "location");
        }
        Ok(())
    }
}
