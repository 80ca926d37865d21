//! A countdown environment used in tests of this crate.
use crate::{
    generic_replay_buffer::{ArrayBatch, SimpleReplayBuffer},
    record::Record,
    Act, Agent, Env, Obs, Policy, ReplayBufferBase, Step,
};
use anyhow::Result;
use std::{fs, path::Path};

#[derive(Clone, Debug, PartialEq)]
pub struct CountdownObs(pub i64);

impl Obs for CountdownObs {
    fn len(&self) -> usize {
        1
    }
}

/// Amount subtracted from the counter.
#[derive(Clone, Debug)]
pub struct CountdownAct(pub i64);

impl Act for CountdownAct {
    fn len(&self) -> usize {
        1
    }
}

#[derive(Clone, Debug)]
pub struct CountdownConfig {
    pub start: i64,
}

/// Terminates with reward -1 when the counter reaches zero.
pub struct CountdownEnv {
    start: i64,
    remaining: i64,
    pub n_resets: usize,
}

impl Env for CountdownEnv {
    type Config = CountdownConfig;
    type Obs = CountdownObs;
    type Act = CountdownAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            start: config.start,
            remaining: config.start,
            n_resets: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.remaining -= a.0;
        let done = self.remaining <= 0;
        let reward = if done { -1.0 } else { 0.0 };
        let step = Step::new(CountdownObs(self.remaining), a.clone(), reward, done, false, ());
        Ok((step, Record::from_scalar("remaining", self.remaining as f32)))
    }

    fn reset(&mut self, _seed: Option<i64>) -> Result<Self::Obs> {
        self.remaining = self.start;
        self.n_resets += 1;
        Ok(CountdownObs(self.remaining))
    }
}

impl From<CountdownObs> for ArrayBatch {
    fn from(obs: CountdownObs) -> Self {
        ArrayBatch::from_row(vec![obs.0 as f32])
    }
}

impl From<CountdownAct> for ArrayBatch {
    fn from(act: CountdownAct) -> Self {
        ArrayBatch::from_row(vec![act.0 as f32])
    }
}

pub type CountdownBuffer = SimpleReplayBuffer<ArrayBatch, ArrayBatch>;

/// Always counts down by one and counts its optimization steps.
#[derive(Default)]
pub struct CountingAgent {
    pub n_opts: usize,
    pub train: bool,
}

impl Policy<CountdownEnv> for CountingAgent {
    fn sample(&mut self, _obs: &CountdownObs) -> Result<CountdownAct> {
        Ok(CountdownAct(1))
    }
}

impl Agent<CountdownEnv, CountdownBuffer> for CountingAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt_with_record(&mut self, buffer: &mut CountdownBuffer) -> Result<Record> {
        let batch = buffer.batch(4)?;
        self.n_opts += 1;
        Ok(Record::from_scalar("batch_reward", batch.reward.iter().sum()))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        fs::write(path.join("n_opts.txt"), self.n_opts.to_string())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.n_opts = fs::read_to_string(path.join("n_opts.txt"))?.trim().parse()?;
        Ok(())
    }
}
