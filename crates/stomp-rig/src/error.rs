//! Error types for chain operations.

use stomp_config::ValidationError;
use thiserror::Error;

/// Why a preset or device operation left the chain unchanged.
#[derive(Debug, Error)]
pub enum RigError {
    /// The preset does not describe a buildable chain.
    #[error("invalid preset: {0}")]
    Preset(#[from] ValidationError),

    /// The registry could not build a model.
    #[error("cannot build effect '{0}'")]
    UnknownEffect(String),

    /// Device failure.
    #[error(transparent)]
    Device(#[from] stomp_io::Error),
}

/// Result type for rig operations.
pub type Result<T> = std::result::Result<T, RigError>;
