//! Error type shared by the generation core.

use thiserror::Error;

use crate::naming::PartKind;

/// Failures surfaced by seeding, naming and network growth.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A caller supplied a malformed or out-of-range value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A part table could not be resolved into a usable list of parts.
    #[error("invalid configuration for {kind} parts: {reason}")]
    InvalidConfiguration {
        /// Which of the four part tables failed.
        kind: PartKind,
        /// Human readable cause.
        reason: String,
    },

    /// An internal tag fell outside the values it can legally hold.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// The uniqueness loop gave up before finding enough distinct names.
    #[error("could not find {requested} unique station names after {rounds} rounds")]
    NameSpaceExhausted {
        /// Number of names still missing when the loop stopped.
        requested: usize,
        /// Rounds attempted.
        rounds: usize,
    },
}

impl NetworkError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = NetworkError> = std::result::Result<T, E>;
