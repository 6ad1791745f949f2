//! Base error type shared by the `rf-*` crates.

use thiserror::Error;

use crate::AgentId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("unknown agent id {0:?}")]
    UnknownExternalId(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
