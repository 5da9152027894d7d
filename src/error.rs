//! Error taxonomy for the coverability engine.
//!
//! Configuration errors are raised before any search work starts. Invalid-input
//! and invalid-state errors surface at the offending call. Timeouts and
//! initial-graph coverage are not errors; see [`crate::backward::CompletionStatus`].

use thiserror::Error;

/// Error raised by graph operations, rule preparation and the backward driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoverError {
    /// A mandatory collaborator was not supplied to the driver.
    #[error("configuration error: missing {missing}")]
    Configuration { missing: &'static str },

    /// A referenced vertex/edge/rule does not exist or is structurally incompatible.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An object was used outside of its protocol (e.g. an unstarted timer).
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl CoverError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        CoverError::InvalidInput(msg.into())
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        CoverError::InvalidState(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type CoverResult<T> = Result<T, CoverError>;
