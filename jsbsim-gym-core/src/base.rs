//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use policy::Policy;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use std::fmt::Debug;
pub use step::{Info, Step, StepProcessor};

/// An observation of an environment.
///
/// Vectorized environments are not supported, so an object of this trait holds
/// exactly one observation.
pub trait Obs: Clone + Debug {
    /// Returns the number of scalar elements in the observation.
    fn len(&self) -> usize;
}

/// An action of an environment.
pub trait Act: Clone + Debug {
    /// Returns the number of scalar elements in the action.
    fn len(&self) -> usize;
}
