//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use chrono::Local;
use log::info;

/// Runs a fixed number of episodes and averages their return and length.
///
/// Episode `ix` starts with [`Env::reset_with_index`]`(ix)`, so two evaluators built
/// from the same configuration see the same sequence of initial states.
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::<Env>::new(&config, 0, 5)?;
/// let record = evaluator.evaluate(&mut policy)?;
/// println!("Average return: {}", record.get_scalar("Episode return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E>,
    {
        let mut r_total = 0f32;
        let mut steps_total = 0usize;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut r_episode = 0f32;
            let mut steps = 0usize;

            loop {
                let act = policy.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act)?;
                r_episode += step.reward;
                steps += 1;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }

            info!("Episode {}, {} steps, return = {}", ix, steps, r_episode);
            r_total += r_episode;
            steps_total += steps;
        }

        let n = self.n_episodes.max(1) as f32;
        let mut record = Record::from_scalar("Episode return", r_total / n);
        record.insert("Episode length", RecordValue::Scalar(steps_total as f32 / n));
        record.insert("Evaluated at", RecordValue::DateTime(Local::now()));
        Ok(record)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Builds the environment from `config` and constructs an evaluator.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self::from_env(E::build(config, seed)?, n_episodes))
    }

    /// Constructs an evaluator over an already built environment,
    /// e.g. one returned by [`Registry::make`](crate::Registry::make).
    pub fn from_env(env: E, n_episodes: usize) -> Self {
        Self { n_episodes, env }
    }

    /// Returns the environment used for evaluation.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dummy::{CountdownAct, CountdownConfig, CountdownEnv};
    use crate::Policy;

    struct Hold;

    impl Policy<CountdownEnv> for Hold {
        fn sample(&mut self, _obs: &<CountdownEnv as Env>::Obs) -> Result<CountdownAct> {
            Ok(CountdownAct(1))
        }
    }

    #[test]
    fn test_evaluate_averages_episodes() -> Result<()> {
        let config = CountdownConfig { start: 4 };
        let mut evaluator = DefaultEvaluator::<CountdownEnv>::new(&config, 0, 3)?;
        let record = evaluator.evaluate(&mut Hold)?;

        // Every episode takes 4 steps and ends with reward -1.
        assert_eq!(record.get_scalar("Episode length")?, 4.0);
        assert_eq!(record.get_scalar("Episode return")?, -1.0);
        Ok(())
    }
}
