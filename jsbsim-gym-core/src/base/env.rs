//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performes an environment step.
    ///
    /// An error aborts the step; the environment is not expected to recover from it.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self, seed: Option<i64>) -> Result<Self::Obs>;

    /// Performes an environment step and resets the environment if the episode ends.
    ///
    /// The observation after the reset is stored in [`Step::init_obs`].
    fn step_with_reset(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized,
    {
        let (mut step, record) = self.step(a)?;
        if step.is_done() {
            step.init_obs = Some(self.reset(None)?);
        }
        Ok((step, record))
    }

    /// Resets the environment with a given index.
    ///
    /// The index is used as a seed, which is useful for evaluation of a trained policy.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.reset(Some(ix as i64))
    }

    /// Renders the current state of the environment in the given mode.
    fn render(&mut self, _mode: &str) -> Result<()> {
        Ok(())
    }

    /// Releases resources held by the environment.
    fn close(&mut self) {}
}
