//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum GymError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// No environment is registered with the given id.
    #[error("No environment registered with id: {0}")]
    UnknownEnvId(String),

    /// An environment is already registered with the given id.
    #[error("Environment id already registered: {0}")]
    DuplicateEnvId(String),

    /// A batch was requested from a replay buffer holding no transition.
    #[error("Replay buffer is empty")]
    EmptyReplayBuffer,

    /// A saved replay buffer has a capacity other than the one it is loaded into.
    #[error("Replay buffer capacity mismatch: expected {expected}, found {found}")]
    ReplayBufferCapacity {
        /// Capacity of the buffer loaded into.
        expected: usize,
        /// Capacity of the saved buffer.
        found: usize,
    },

    /// A step processor got a step before its first reset, or a step ending an
    /// episode without the observation after the reset.
    #[error("Step processor is missing an observation: {0}")]
    MissingObservation(String),
}
