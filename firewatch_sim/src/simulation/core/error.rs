// firewatch_sim/src/simulation/core/error.rs

use firewatch_core::error::CoreError;
use thiserror::Error;

use crate::simulation::bus::codec::CodecError;

/// Errors raised by the host: set-up, bus plumbing and shutdown.
///
/// The per-tick path never produces one of these; a failed publish is logged
/// and dropped instead.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("wire codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("bus closed")]
    BusClosed,

    #[error("topic '{0}' was never subscribed")]
    UnknownKey(String),

    #[error("could not resolve broker address '{0}'")]
    UnresolvedBroker(String),

    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("bus receiver task failed: {0}")]
    BusReceiver(tokio::task::JoinError),

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

pub type SimResult<T> = Result<T, SimError>;
