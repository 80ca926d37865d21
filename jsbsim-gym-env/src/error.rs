//! Errors of the flight environment.
use thiserror::Error;

/// Errors of the flight environment.
#[derive(Error, Debug)]
pub enum FlightEnvError {
    /// The initial-condition solver reported failure while building the environment.
    #[error("Failed to init simulation conditions")]
    InitialConditions,

    /// An integration step reported failure.
    #[error("Simulation run failed at sub-step {sub_step} of step {step}")]
    Integration {
        /// Adapter step counter at the failure.
        step: usize,
        /// Index of the failed integration step within the adapter step.
        sub_step: usize,
    },

    /// The render mode is not implemented.
    #[error("Render mode is not implemented: {0}")]
    UnsupportedRenderMode(String),

    /// The engine could not load the aircraft model.
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An action vector has the wrong number of elements.
    #[error("Action must have 4 elements, got {0}")]
    ActionLength(usize),

    /// The environment has been closed.
    #[error("Environment is closed")]
    Closed,
}
