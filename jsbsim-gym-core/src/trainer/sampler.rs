//! Samples transitions and pushes them into a replay buffer.
use crate::{
    record::{Record, RecordValue::Scalar},
    Env, ExperienceBufferBase, Policy, StepProcessor,
};
use anyhow::Result;
use log::debug;
use std::time::Instant;

/// Runs an environment with a policy and pushes the transitions into a buffer.
///
/// The environment is reset on the first call and after each episode ends.
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,
    prev_obs: Option<E::Obs>,
    step_processor: P,
    episode_return: f32,
    episode_length: usize,
    n_env_steps_for_fps: usize,
    timer: Instant,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a sampler.
    pub fn new(env: E, step_processor: P) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
            episode_return: 0.0,
            episode_length: 0,
            n_env_steps_for_fps: 0,
            timer: Instant::now(),
        }
    }

    /// Takes one environment step with `policy` and pushes the transition into `buffer`.
    ///
    /// The returned record holds `episode_return` and `episode_length` when the step
    /// ends an episode, and is empty otherwise.
    pub fn sample_and_push<A, R>(&mut self, policy: &mut A, buffer: &mut R) -> Result<Record>
    where
        A: Policy<E>,
        R: ExperienceBufferBase<Item = P::Output>,
    {
        let prev_obs = match self.prev_obs.take() {
            Some(obs) => obs,
            None => {
                let obs = self.env.reset(None)?;
                self.step_processor.reset(obs.clone());
                obs
            }
        };

        let act = policy.sample(&prev_obs)?;
        let (step, _) = self.env.step_with_reset(&act)?;
        self.episode_return += step.reward;
        self.episode_length += 1;
        self.n_env_steps_for_fps += 1;

        let mut record = Record::empty();
        if step.is_done() {
            debug!(
                "Episode ended after {} steps, return = {}",
                self.episode_length, self.episode_return
            );
            record.insert("episode_return", Scalar(self.episode_return));
            record.insert("episode_length", Scalar(self.episode_length as f32));
            self.episode_return = 0.0;
            self.episode_length = 0;
            self.prev_obs = step.init_obs.clone();
        } else {
            self.prev_obs = Some(step.obs.clone());
        }

        buffer.push(self.step_processor.process(step)?)?;
        Ok(record)
    }

    /// Environment steps per second since the last call of this method or
    /// [`Sampler::reset_fps_counter`].
    pub fn fps(&mut self) -> f32 {
        let secs = self.timer.elapsed().as_secs_f32();
        let fps = if secs > 0.0 {
            self.n_env_steps_for_fps as f32 / secs
        } else {
            0.0
        };
        self.reset_fps_counter();
        fps
    }

    /// Restarts the counter of [`Sampler::fps`].
    pub fn reset_fps_counter(&mut self) {
        self.n_env_steps_for_fps = 0;
        self.timer = Instant::now();
    }

    /// Returns the environment.
    pub fn env(&self) -> &E {
        &self.env
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dummy::{CountdownBuffer, CountdownConfig, CountdownEnv, CountingAgent},
        generic_replay_buffer::{
            ArrayBatch, SimpleReplayBufferConfig, SimpleStepProcessor, SimpleStepProcessorConfig,
        },
        ReplayBufferBase,
    };

    #[test]
    fn test_records_episode_at_its_end() -> Result<()> {
        let env = CountdownEnv::build(&CountdownConfig { start: 3 }, 0)?;
        let step_proc = SimpleStepProcessor::<CountdownEnv, ArrayBatch, ArrayBatch>::build(
            &SimpleStepProcessorConfig::default(),
        );
        let mut sampler = Sampler::new(env, step_proc);
        let mut buffer = CountdownBuffer::build(&SimpleReplayBufferConfig::default());
        let mut agent = CountingAgent::default();

        let mut ends = vec![];
        for _ in 0..7 {
            let record = sampler.sample_and_push(&mut agent, &mut buffer)?;
            ends.push(!record.is_empty());
            if let Ok(length) = record.get_scalar("episode_length") {
                assert_eq!(length, 3.0);
                assert_eq!(record.get_scalar("episode_return")?, -1.0);
            }
        }

        assert_eq!(ends, vec![false, false, true, false, false, true, false]);
        assert_eq!(buffer.len(), 7);
        assert_eq!(sampler.env().n_resets, 3);
        Ok(())
    }
}
