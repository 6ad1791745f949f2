//! Spatial-subsystem error type.

use thiserror::Error;

use rf_core::NodeId;

/// Errors produced by `rf-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The goal is unreachable from the start in the current graph.
    #[error("no route from {from} to {to}")]
    NoRouteFound { from: NodeId, to: NodeId },

    #[error("road network has no nodes")]
    EmptyNetwork,

    /// A chosen start or end node has no adjacent edges.
    #[error("node {0} has no connections")]
    NoConnections(NodeId),

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("search from {from} to {to} gave up after {expanded} expansions")]
    SearchBudgetExceeded { from: NodeId, to: NodeId, expanded: usize },

    #[error("GeoJSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpatialError {
    /// `true` for outcomes that only mean "this goal cannot be reached";
    /// callers re-routing at random treat these as a cue to try elsewhere.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            SpatialError::NoRouteFound { .. }
                | SpatialError::NoConnections(_)
                | SpatialError::SearchBudgetExceeded { .. }
        )
    }
}

pub type SpatialResult<T> = Result<T, SpatialError>;
