//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters.
    fn opt(&mut self, buffer: &mut R) -> Result<()> {
        self.opt_with_record(buffer).map(|_| ())
    }

    /// Performs an optimization step and returns some information.
    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record>;

    /// Save the parameters of the agent in the given directory.
    ///
    /// The directory is created if it does not exist. An agent typically writes one
    /// file per network, e.g. the actor and every critic of SAC.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}

/// Allows an agent chosen at runtime wherever an agent is expected.
impl<E, R, A> Agent<E, R> for Box<A>
where
    E: Env,
    R: ReplayBufferBase,
    A: Agent<E, R> + ?Sized,
{
    fn train(&mut self) {
        (**self).train()
    }

    fn eval(&mut self) {
        (**self).eval()
    }

    fn is_train(&self) -> bool {
        (**self).is_train()
    }

    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record> {
        (**self).opt_with_record(buffer)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        (**self).save_params(path)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        (**self).load_params(path)
    }
}
