#![warn(missing_docs)]
//! Core components of `jsbsim-gym`.
//!
//! This crate has no knowledge of flight dynamics. It defines the interaction surface
//! between an environment and whatever drives it:
//!
//! * [`Env`], [`Obs`], [`Act`], [`Info`] and [`Step`] describe an episodic MDP with a
//!   `reset`/`step`/`render`/`close` surface.
//! * [`Policy`] maps an observation to an action; an [`Agent`] is a policy that learns
//!   from a replay buffer.
//! * [`Trainer`] runs the off-policy training loop: it samples transitions with the
//!   agent, pushes them into a [`generic_replay_buffer::SimpleReplayBuffer`] and
//!   optimizes the agent, evaluating and saving it at fixed intervals.
//! * [`TimeLimit`] truncates episodes after a fixed number of steps and [`Registry`]
//!   builds environments by name, in the same way environments are registered in gym.
//! * [`DefaultEvaluator`] and [`util::eval_with_recorder`] run episodes of a policy.
//! * [`record`] holds key-value records emitted at every step.
pub mod error;
pub mod generic_replay_buffer;
pub mod record;
pub mod util;

mod base;
pub use base::{
    Act, Agent, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase, Step,
    StepProcessor, TransitionBatch,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod registry;
pub use registry::{EntryPoint, EnvSpec, Registry};

mod time_limit;
pub use time_limit::{TimeLimit, TimeLimitConfig};

mod trainer;
pub use trainer::{Sampler, Trainer, TrainerConfig};

#[cfg(test)]
mod dummy;
