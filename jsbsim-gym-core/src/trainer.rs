//! Off-policy training loop.
mod config;
mod sampler;
use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
pub use sampler::Sampler;
use std::{
    path::Path,
    time::{Duration, Instant},
};

fn is_due(steps: usize, interval: usize) -> bool {
    interval > 0 && steps % interval == 0
}

/// Manages the training loop and related objects.
///
/// Every iteration takes one environment step with the agent through a [`Sampler`],
/// which pushes the transition into the replay buffer. After `warmup_period`
/// environment steps, the agent is optimized every `opt_interval` environment steps.
/// Counted in optimization steps, the trainer then
///
/// * records agent information every `record_agent_info_interval`,
/// * records environment and optimization steps per second every
///   `record_compute_cost_interval`,
/// * evaluates the agent every `eval_interval` and saves it in `model_dir/best` when
///   the evaluation return is the best so far,
/// * saves the agent in `model_dir/<opt_steps>` every `save_interval`,
/// * flushes the recorder every `flush_record_interval`,
///
/// and stops after `max_opts` optimization steps.
///
/// Records written to the recorder carry `opt_steps` and `env_steps`.
pub struct Trainer {
    config: TrainerConfig,
    env_steps: usize,
    opt_steps: usize,
    opt_steps_for_ops: usize,
    timer_for_ops: Duration,
    max_eval_reward: f32,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            config,
            env_steps: 0,
            opt_steps: 0,
            opt_steps_for_ops: 0,
            timer_for_ops: Duration::new(0, 0),
            max_eval_reward: f32::MIN,
        }
    }

    /// Number of environment steps taken.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    /// Number of optimization steps done.
    pub fn opt_steps(&self) -> usize {
        self.opt_steps
    }

    /// The best evaluation return, if the agent has been evaluated.
    pub fn max_eval_reward(&self) -> Option<f32> {
        if self.max_eval_reward == f32::MIN {
            None
        } else {
            Some(self.max_eval_reward)
        }
    }

    fn save_model<E, R, A>(agent: &A, model_dir: &Path)
    where
        E: Env,
        R: ReplayBufferBase,
        A: Agent<E, R>,
    {
        match agent.save_params(model_dir) {
            Ok(()) => info!("Saved the model in {:?}", model_dir),
            Err(e) => warn!("Failed to save the model in {:?}: {}", model_dir, e),
        }
    }

    fn opt_steps_per_sec(&mut self) -> f32 {
        let secs = self.timer_for_ops.as_secs_f32();
        let osps = if secs > 0.0 {
            self.opt_steps_for_ops as f32 / secs
        } else {
            0.0
        };
        self.opt_steps_for_ops = 0;
        self.timer_for_ops = Duration::new(0, 0);
        osps
    }

    /// Takes an environment step and, when due, an optimization step.
    ///
    /// Returns the record of the step and whether the agent was optimized.
    pub fn train_step<E, P, A, R>(
        &mut self,
        agent: &mut A,
        buffer: &mut R,
        sampler: &mut Sampler<E, P>,
    ) -> Result<(Record, bool)>
    where
        E: Env,
        P: StepProcessor<E>,
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
    {
        let record = sampler.sample_and_push(agent, buffer)?;
        self.env_steps += 1;

        if self.env_steps < self.config.warmup_period
            || !is_due(self.env_steps, self.config.opt_interval)
        {
            return Ok((record, false));
        }

        let timer = Instant::now();
        let record = if is_due(self.opt_steps + 1, self.config.record_agent_info_interval) {
            record.merge(agent.opt_with_record(buffer)?)
        } else {
            agent.opt(buffer)?;
            record
        };
        self.opt_steps += 1;
        self.timer_for_ops += timer.elapsed();
        self.opt_steps_for_ops += 1;
        Ok((record, true))
    }

    /// Trains the agent until `max_opts` optimization steps.
    pub fn train<E, P, A, R, D>(
        &mut self,
        env: E,
        step_proc: P,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        E: Env,
        P: StepProcessor<E>,
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
        D: Evaluator<E>,
    {
        if self.config.max_opts == 0 {
            warn!("max_opts is zero, nothing to train");
            return Ok(());
        }

        let mut sampler = Sampler::new(env, step_proc);
        sampler.reset_fps_counter();
        agent.train();

        loop {
            let (mut record, is_opt) = self.train_step(agent, buffer, &mut sampler)?;

            if is_opt {
                let opt_steps = self.opt_steps;

                if is_due(opt_steps, self.config.record_compute_cost_interval) {
                    record.insert("fps", Scalar(sampler.fps()));
                    record.insert("opt_steps_per_sec", Scalar(self.opt_steps_per_sec()));
                }

                if is_due(opt_steps, self.config.eval_interval) {
                    info!("Starts evaluation of the trained model");
                    agent.eval();
                    let eval_record = evaluator.evaluate(agent)?;
                    agent.train();
                    let eval_reward = eval_record.get_scalar("Episode return")?;
                    record.insert("eval_reward", Scalar(eval_reward));

                    if eval_reward > self.max_eval_reward {
                        self.max_eval_reward = eval_reward;
                        if let Some(model_dir) = &self.config.model_dir {
                            Self::save_model::<E, R, A>(agent, &model_dir.join("best"));
                        }
                    }
                }

                if is_due(opt_steps, self.config.save_interval) {
                    if let Some(model_dir) = &self.config.model_dir {
                        Self::save_model::<E, R, A>(agent, &model_dir.join(opt_steps.to_string()));
                    }
                }
            }

            if !record.is_empty() {
                record.insert("opt_steps", Scalar(self.opt_steps as f32));
                record.insert("env_steps", Scalar(self.env_steps as f32));
                recorder.write(record);
            }

            if is_opt && is_due(self.opt_steps, self.config.flush_record_interval) {
                recorder.flush();
            }

            if is_opt && self.opt_steps >= self.config.max_opts {
                break;
            }
        }
        recorder.flush();

        info!(
            "Finished training: {} environment steps, {} optimization steps",
            self.env_steps, self.opt_steps
        );
        Ok(())
    }
}
