use rf_mobility::MobilityError;
use rf_spatial::SpatialError;
use rf_zones::ZoneError;
use thiserror::Error;

use crate::external::ExternalError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid simulation options: {0}")]
    Config(String),

    #[error("agent {0:?} not found")]
    AgentNotFound(String),

    #[error(transparent)]
    Mobility(#[from] MobilityError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error("heat zones: {0}")]
    Zones(#[from] ZoneError),

    #[error("external service: {0}")]
    External(#[from] ExternalError),
}

impl SimError {
    /// Routing could not connect the endpoints.  Callers leave the agent
    /// wandering and may retry elsewhere.
    pub fn is_unreachable(&self) -> bool {
        match self {
            SimError::Spatial(e) | SimError::Mobility(MobilityError::Routing(e)) => e.is_unreachable(),
            _ => false,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
