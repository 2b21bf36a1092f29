// firewatch_core/src/error.rs

use thiserror::Error;

/// Errors raised while constructing core objects.
///
/// Nothing inside the per-tick path returns an error: numeric edge cases are
/// guarded with safe fallbacks instead. These only surface at set-up time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("agent index {index} is out of range for a swarm of {count}")]
    AgentOutOfRange { index: usize, count: usize },

    #[error("agent {0} has no patrol waypoints")]
    NoWaypoints(usize),
}

pub type CoreResult<T> = Result<T, CoreError>;
