//! Heat-zone error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZoneError {
    /// Zones are placed relative to the road network; it has no extent.
    #[error("cannot place heat zones on an empty road network")]
    EmptyNetwork,

    #[error("invalid heat-zone parameters: {0}")]
    InvalidParams(String),
}

pub type ZoneResult<T> = Result<T, ZoneError>;
