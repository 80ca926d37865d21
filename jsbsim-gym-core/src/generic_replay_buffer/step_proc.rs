//! Conversion of steps into 1-step transitions.
use super::{BatchBase, GenericTransitionBatch};
use crate::{error::GymError, Env, Step, StepProcessor};
use anyhow::Result;
use std::marker::PhantomData;

/// Configuration of [`SimpleStepProcessor`].
#[derive(Clone, Debug, Default)]
pub struct SimpleStepProcessorConfig {}

/// Makes transitions `(o_t, a_t, o_t+1, r_t)` for 1-step TD backup.
///
/// The processor remembers the last observation. When a step ends an episode, the
/// observation after the reset, taken from [`Step::init_obs`], starts the next
/// transition.
pub struct SimpleStepProcessor<E, O, A> {
    prev_obs: Option<O>,
    phantom: PhantomData<(E, A)>,
}

impl<E, O, A> StepProcessor<E> for SimpleStepProcessor<E, O, A>
where
    E: Env,
    O: BatchBase + From<E::Obs>,
    A: BatchBase + From<E::Act>,
{
    type Config = SimpleStepProcessorConfig;
    type Output = GenericTransitionBatch<O, A>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs.into());
    }

    fn process(&mut self, step: Step<E>) -> Result<Self::Output> {
        let is_done = step.is_done();
        let next_obs = step.obs.clone().into();
        let obs = self
            .prev_obs
            .replace(step.obs.into())
            .ok_or_else(|| GymError::MissingObservation("reset was not called".to_string()))?;

        if is_done {
            let init_obs = step.init_obs.ok_or_else(|| {
                GymError::MissingObservation("init_obs of the last step".to_string())
            })?;
            self.prev_obs = Some(init_obs.into());
        }

        Ok(GenericTransitionBatch {
            obs,
            act: step.act.into(),
            next_obs,
            reward: vec![step.reward],
            is_terminated: vec![step.is_terminated as i8],
            is_truncated: vec![step.is_truncated as i8],
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dummy::{CountdownAct, CountdownConfig, CountdownEnv},
        generic_replay_buffer::ArrayBatch,
        TransitionBatch,
    };

    type Processor = SimpleStepProcessor<CountdownEnv, ArrayBatch, ArrayBatch>;

    #[test]
    fn test_transitions_chain_across_reset() -> Result<()> {
        let mut env = CountdownEnv::build(&CountdownConfig { start: 2 }, 0)?;
        let mut processor = Processor::build(&SimpleStepProcessorConfig::default());
        processor.reset(env.reset(None)?);

        let (step, _) = env.step_with_reset(&CountdownAct(1))?;
        let tr = processor.process(step)?;
        assert_eq!(tr.obs().data(), &[2.0]);
        assert_eq!(tr.next_obs.data(), &[1.0]);

        let (step, _) = env.step_with_reset(&CountdownAct(1))?;
        let tr = processor.process(step)?;
        assert_eq!(tr.obs().data(), &[1.0]);
        assert_eq!(tr.next_obs.data(), &[0.0]);
        assert_eq!(tr.is_terminated, vec![1]);
        assert_eq!(tr.reward, vec![-1.0]);

        // The next transition starts from the observation after the reset.
        let (step, _) = env.step_with_reset(&CountdownAct(1))?;
        let tr = processor.process(step)?;
        assert_eq!(tr.obs().data(), &[2.0]);
        Ok(())
    }

    #[test]
    fn test_process_before_reset() -> Result<()> {
        let mut env = CountdownEnv::build(&CountdownConfig { start: 5 }, 0)?;
        let mut processor = Processor::build(&SimpleStepProcessorConfig::default());
        let (step, _) = env.step(&CountdownAct(1))?;
        assert!(processor.process(step).is_err());
        Ok(())
    }
}
