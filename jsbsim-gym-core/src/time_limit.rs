//! Episode step limit.
use crate::{record::Record, Env, Step};
use anyhow::Result;
use log::trace;

/// Configuration of [`TimeLimit`].
#[derive(Clone, Debug)]
pub struct TimeLimitConfig<C> {
    /// Configuration of the wrapped environment.
    pub env_config: C,

    /// Maximum number of steps in an episode. `None` means no limit.
    pub max_episode_steps: Option<usize>,
}

/// Truncates episodes of the wrapped environment after `max_episode_steps` steps.
///
/// The step reaching the limit and every later step are returned with `is_truncated`
/// set until the next reset, which restarts the counter.
pub struct TimeLimit<E: Env> {
    env: E,
    max_episode_steps: Option<usize>,
    elapsed_steps: usize,
}

impl<E: Env> TimeLimit<E> {
    /// Wraps `env`.
    pub fn new(env: E, max_episode_steps: Option<usize>) -> Self {
        Self {
            env,
            max_episode_steps,
            elapsed_steps: 0,
        }
    }

    /// Number of steps since the last reset.
    pub fn elapsed_steps(&self) -> usize {
        self.elapsed_steps
    }

    /// The step limit.
    pub fn max_episode_steps(&self) -> Option<usize> {
        self.max_episode_steps
    }

    /// Returns the wrapped environment.
    pub fn inner(&self) -> &E {
        &self.env
    }

    /// Returns the wrapped environment.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Unwraps the environment.
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Env> Env for TimeLimit<E> {
    type Config = TimeLimitConfig<E::Config>;
    type Obs = E::Obs;
    type Act = E::Act;
    type Info = E::Info;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let env = E::build(&config.env_config, seed)?;
        Ok(Self::new(env, config.max_episode_steps))
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        let (step, record) = self.env.step(a)?;
        let mut step: Step<Self> = step.rewrap();
        self.elapsed_steps += 1;

        if let Some(max_steps) = self.max_episode_steps {
            if self.elapsed_steps >= max_steps {
                trace!("TimeLimit: truncated after {} steps", self.elapsed_steps);
                step.is_truncated = true;
            }
        }

        Ok((step, record))
    }

    fn reset(&mut self, seed: Option<i64>) -> Result<Self::Obs> {
        self.elapsed_steps = 0;
        self.env.reset(seed)
    }

    fn render(&mut self, mode: &str) -> Result<()> {
        self.env.render(mode)
    }

    fn close(&mut self) {
        self.env.close()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dummy::{CountdownAct, CountdownConfig, CountdownEnv};

    fn config(start: i64, max_episode_steps: Option<usize>) -> TimeLimitConfig<CountdownConfig> {
        TimeLimitConfig {
            env_config: CountdownConfig { start },
            max_episode_steps,
        }
    }

    #[test]
    fn test_truncates_at_limit() -> Result<()> {
        let mut env = TimeLimit::<CountdownEnv>::build(&config(100, Some(3)), 0)?;
        env.reset(None)?;

        for _ in 0..2 {
            let (step, _) = env.step(&CountdownAct(1))?;
            assert!(!step.is_done());
        }
        let (step, _) = env.step(&CountdownAct(1))?;
        assert!(step.is_truncated);
        assert!(!step.is_terminated);
        assert_eq!(env.elapsed_steps(), 3);
        Ok(())
    }

    #[test]
    fn test_truncation_persists_until_reset() -> Result<()> {
        let mut env = TimeLimit::<CountdownEnv>::build(&config(100, Some(2)), 0)?;
        env.reset(None)?;
        env.step(&CountdownAct(1))?;
        env.step(&CountdownAct(1))?;

        let (step, _) = env.step(&CountdownAct(1))?;
        assert!(step.is_truncated);
        assert_eq!(env.elapsed_steps(), 3);

        env.reset(None)?;
        let (step, _) = env.step(&CountdownAct(1))?;
        assert!(!step.is_truncated);
        Ok(())
    }

    #[test]
    fn test_termination_is_kept_before_limit() -> Result<()> {
        let mut env = TimeLimit::<CountdownEnv>::build(&config(2, Some(10)), 0)?;
        env.reset(None)?;

        env.step(&CountdownAct(1))?;
        let (step, _) = env.step(&CountdownAct(1))?;
        assert!(step.is_terminated);
        assert!(!step.is_truncated);
        assert_eq!(step.reward, -1.0);
        Ok(())
    }

    #[test]
    fn test_reset_restarts_counter() -> Result<()> {
        let mut env = TimeLimit::<CountdownEnv>::build(&config(100, Some(3)), 0)?;
        env.step(&CountdownAct(1))?;
        env.step(&CountdownAct(1))?;
        env.reset(None)?;
        assert_eq!(env.elapsed_steps(), 0);

        let (step, _) = env.step(&CountdownAct(1))?;
        assert!(!step.is_truncated);
        Ok(())
    }

    #[test]
    fn test_step_with_reset_fills_init_obs() -> Result<()> {
        let mut env = TimeLimit::<CountdownEnv>::build(&config(1, None), 0)?;
        let (step, _) = env.step_with_reset(&CountdownAct(1))?;
        assert!(step.is_terminated);
        assert_eq!(step.init_obs, Some(crate::dummy::CountdownObs(1)));
        assert_eq!(env.inner().n_resets, 1);
        Ok(())
    }
}
