use super::{Actor, Critic, EntCoef, SacConfig};
use crate::{
    model::{SubModel1, SubModel2},
    util::{batch_to_tensor, smooth_l1_loss, track, vec_to_tensor, CriticLoss, OutDim},
};
use anyhow::{bail, Result};
use candle_core::{Device, Tensor, D};
use candle_nn::loss::mse;
use jsbsim_gym_core::{
    generic_replay_buffer::ArrayBatch,
    record::{Record, RecordValue},
    Agent, Env, Policy, ReplayBufferBase, TransitionBatch,
};
use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::TryFrom, f64::consts::PI, fs, marker::PhantomData, path::Path};

/// Log density of the standard normal distribution, summed over the last dimension.
fn normal_logp(x: &Tensor) -> Result<Tensor> {
    let tmp = ((-0.5 * (2.0 * PI).ln()) - (0.5 * x.sqr()?)?)?;
    Ok(tmp.sum(D::Minus1)?)
}

/// Soft actor critic (SAC) agent.
///
/// Actions are squashed by `tanh` into `[-1, 1]`. Observations are converted into
/// [`ArrayBatch`] rows and actions are built from the squashed values with
/// `TryFrom<Vec<f32>>`, so an environment maps `[-1, 1]` onto its own action range.
///
/// The critic target bootstraps unless the transition is terminated; truncated
/// transitions are bootstrapped.
pub struct Sac<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    R: ReplayBufferBase,
{
    qnets: Vec<Critic<Q>>,
    qnets_tgt: Vec<Critic<Q>>,
    pi: Actor<P>,
    gamma: f64,
    tau: f64,
    ent_coef: EntCoef,
    epsilon: f64,
    min_lstd: f64,
    max_lstd: f64,
    n_updates_per_opt: usize,
    batch_size: usize,
    train: bool,
    reward_scale: f32,
    n_opts: usize,
    critic_loss: CriticLoss,
    device: Device,
    phantom: PhantomData<(E, R)>,
}

impl<E, Q, P, R> Sac<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R::Batch: TransitionBatch<ObsBatch = ArrayBatch, ActBatch = ArrayBatch>,
{
    /// Constructs [`Sac`] agent.
    pub fn build(config: SacConfig<Q::Config, P::Config>) -> Result<Self> {
        if config.n_critics == 0 {
            bail!("SAC needs at least one critic");
        }
        let device = config.device.build()?;
        let pi = Actor::build(config.actor_config, &device)?;
        let mut qnets = vec![];
        let mut qnets_tgt = vec![];
        for _ in 0..config.n_critics {
            let qnet = Critic::build(config.critic_config.clone(), &device)?;
            qnets_tgt.push(qnet.build_target(config.critic_config.clone(), &device)?);
            qnets.push(qnet);
        }

        Ok(Self {
            qnets,
            qnets_tgt,
            pi,
            gamma: config.gamma,
            tau: config.tau,
            ent_coef: EntCoef::new(config.ent_coef_mode, &device)?,
            epsilon: config.epsilon,
            min_lstd: config.min_lstd,
            max_lstd: config.max_lstd,
            n_updates_per_opt: config.n_updates_per_opt,
            batch_size: config.batch_size,
            train: config.train,
            reward_scale: config.reward_scale,
            n_opts: 0,
            critic_loss: config.critic_loss,
            device,
            phantom: PhantomData,
        })
    }

    /// Number of parameter updates done.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Returns action and its log probability under the squashed Normal distribution.
    fn action_logp(&self, o: &Tensor) -> Result<(Tensor, Tensor)> {
        let (mean, lstd) = self.pi.forward(o)?;
        let lstd = lstd.clamp(self.min_lstd, self.max_lstd)?;
        let std = lstd.exp()?;
        let z = Tensor::randn(0f32, 1f32, mean.dims(), &self.device)?;
        let a = (&std * &z + &mean)?.tanh()?;
        let log_p = ((normal_logp(&z)? - lstd.sum(D::Minus1)?)?
            - ((1f64 - a.sqr()?)? + self.epsilon)?.log()?.sum(D::Minus1)?)?;

        Ok((a, log_p))
    }

    fn qvals(&self, qnets: &[Critic<Q>], obs: &Tensor, act: &Tensor) -> Result<Vec<Tensor>> {
        qnets
            .iter()
            .map(|qnet| Ok(qnet.forward(obs, act)?.squeeze(D::Minus1)?))
            .collect()
    }

    /// Returns the minimum values of q values over critics
    fn qvals_min(&self, qnets: &[Critic<Q>], obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        let qvals = self.qvals(qnets, obs, act)?;
        Ok(Tensor::stack(&qvals, 0)?.min(0)?)
    }

    fn update_critic(&mut self, batch: R::Batch) -> Result<f32> {
        let losses = {
            let (obs, act, next_obs, reward, is_terminated, _) = batch.unpack();
            let obs = batch_to_tensor(&obs, &self.device)?;
            let act = batch_to_tensor(&act, &self.device)?;
            let next_obs = batch_to_tensor(&next_obs, &self.device)?;
            let reward = vec_to_tensor(&reward, &self.device)?;
            let not_terminated = is_terminated
                .iter()
                .map(|&t| 1.0 - t as f32)
                .collect::<Vec<_>>();
            let not_terminated = vec_to_tensor(&not_terminated, &self.device)?;

            let preds = self.qvals(&self.qnets, &obs, &act)?;
            let tgt = {
                let (next_a, next_log_p) = self.action_logp(&next_obs)?;
                let next_q = self.qvals_min(&self.qnets_tgt, &next_obs, &next_a)?;
                let next_v = (next_q - self.ent_coef.alpha()?.broadcast_mul(&next_log_p)?)?;
                let discounted = ((&not_terminated * self.gamma)? * &next_v)?;
                ((&reward * self.reward_scale as f64)? + discounted)?.detach()
            };

            preds
                .iter()
                .map(|pred| match self.critic_loss {
                    CriticLoss::Mse => Ok(mse(pred, &tgt)?),
                    CriticLoss::SmoothL1 => Ok(smooth_l1_loss(pred, &tgt)?),
                })
                .collect::<Result<Vec<_>>>()?
        };

        for (qnet, loss) in self.qnets.iter_mut().zip(&losses) {
            qnet.backward_step(loss)?;
        }

        let mut total = 0f32;
        for loss in &losses {
            total += loss.to_scalar::<f32>()?;
        }
        Ok(total / self.qnets.len() as f32)
    }

    fn update_actor(&mut self, batch: &R::Batch) -> Result<f32> {
        let loss = {
            let o = batch_to_tensor(batch.obs(), &self.device)?;
            let (a, log_p) = self.action_logp(&o)?;

            // Update the entropy coefficient
            self.ent_coef.update(&log_p)?;

            let qval = self.qvals_min(&self.qnets, &o, &a)?;
            (self.ent_coef.alpha()?.broadcast_mul(&log_p)? - &qval)?.mean_all()?
        };

        self.pi.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn soft_update(&mut self) -> Result<()> {
        for (qnet_tgt, qnet) in self.qnets_tgt.iter().zip(&self.qnets) {
            track(qnet_tgt.get_varmap(), qnet.get_varmap(), self.tau)?;
        }
        Ok(())
    }

    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let mut loss_critic = 0f32;
        let mut loss_actor = 0f32;

        for _ in 0..self.n_updates_per_opt {
            trace!("batch()");
            let batch = buffer.batch(self.batch_size)?;

            trace!("update_actor()");
            loss_actor += self.update_actor(&batch)?;

            trace!("update_critic()");
            loss_critic += self.update_critic(batch)?;

            trace!("soft_update()");
            self.soft_update()?;

            self.n_opts += 1;
        }

        let n = self.n_updates_per_opt.max(1) as f32;
        Ok(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic / n)),
            ("loss_actor", RecordValue::Scalar(loss_actor / n)),
            ("ent_coef", RecordValue::Scalar(self.ent_coef.alpha_value()?)),
        ]))
    }
}

impl<E, Q, P, R> Policy<E> for Sac<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    R: ReplayBufferBase,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    E::Obs: Into<ArrayBatch>,
    E::Act: TryFrom<Vec<f32>, Error = anyhow::Error>,
{
    /// Samples an action in training mode and takes the mean in evaluation mode.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let obs = batch_to_tensor(&obs.clone().into(), &self.device)?;
        let (mean, lstd) = self.pi.forward(&obs)?;
        let act = if self.train {
            let std = lstd.clamp(self.min_lstd, self.max_lstd)?.exp()?;
            ((std * mean.randn_like(0., 1.)?)? + mean)?
        } else {
            mean
        };
        let act = act.tanh()?.squeeze(0)?.to_vec1::<f32>()?;
        <E::Act as TryFrom<Vec<f32>>>::try_from(act)
    }
}

impl<E, Q, P, R> Agent<E, R> for Sac<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R::Batch: TransitionBatch<ObsBatch = ArrayBatch, ActBatch = ArrayBatch>,
    E::Obs: Into<ArrayBatch>,
    E::Act: TryFrom<Vec<f32>, Error = anyhow::Error>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record> {
        self.opt_(buffer)
    }

    /// Writes `pi.pt`, `ent_coef.pt` and `qnet_{i}.pt`, `qnet_tgt_{i}.pt` for every critic.
    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        for (i, (qnet, qnet_tgt)) in self.qnets.iter().zip(&self.qnets_tgt).enumerate() {
            qnet.save(path.join(format!("qnet_{}.pt", i)))?;
            qnet_tgt.save(path.join(format!("qnet_tgt_{}.pt", i)))?;
        }
        self.pi.save(path.join("pi.pt"))?;
        self.ent_coef.save(path.join("ent_coef.pt"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        for (i, (qnet, qnet_tgt)) in self.qnets.iter_mut().zip(&mut self.qnets_tgt).enumerate() {
            qnet.load(path.join(format!("qnet_{}.pt", i)))?;
            qnet_tgt.load(path.join(format!("qnet_tgt_{}.pt", i)))?;
        }
        self.pi.load(path.join("pi.pt"))?;
        self.ent_coef.load(path.join("ent_coef.pt"))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mlp::{Mlp, Mlp2, MlpConfig},
        opt::OptimizerConfig,
        sac::{ActorConfig, CriticConfig, EntCoefMode},
    };
    use jsbsim_gym_core::{
        generic_replay_buffer::{GenericTransitionBatch, SimpleReplayBuffer, SimpleReplayBufferConfig},
        Act, ExperienceBufferBase, Obs, Step,
    };
    use tempdir::TempDir;

    #[derive(Clone, Debug)]
    struct PointObs(f32);

    impl Obs for PointObs {
        fn len(&self) -> usize {
            1
        }
    }

    impl From<PointObs> for ArrayBatch {
        fn from(obs: PointObs) -> Self {
            ArrayBatch::from_row(vec![obs.0])
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct PointAct(f32);

    impl Act for PointAct {
        fn len(&self) -> usize {
            1
        }
    }

    impl TryFrom<Vec<f32>> for PointAct {
        type Error = anyhow::Error;

        fn try_from(v: Vec<f32>) -> Result<Self> {
            match v.as_slice() {
                [a] => Ok(Self(*a)),
                _ => bail!("expected one element, got {}", v.len()),
            }
        }
    }

    /// One-step episodes rewarding actions close to 0.5.
    struct PointEnv;

    impl Env for PointEnv {
        type Config = ();
        type Obs = PointObs;
        type Act = PointAct;
        type Info = ();

        fn build(_config: &(), _seed: i64) -> Result<Self> {
            Ok(Self)
        }

        fn step(&mut self, a: &PointAct) -> Result<(Step<Self>, Record)> {
            let reward = -(a.0 - 0.5).powi(2);
            let step = Step::new(PointObs(0.5), a.clone(), reward, true, false, ());
            Ok((step, Record::empty()))
        }

        fn reset(&mut self, _seed: Option<i64>) -> Result<PointObs> {
            Ok(PointObs(0.5))
        }
    }

    type Buffer = SimpleReplayBuffer<ArrayBatch, ArrayBatch>;
    type PointSac = Sac<PointEnv, Mlp, Mlp2, Buffer>;

    fn config() -> SacConfig<MlpConfig, MlpConfig> {
        let actor_config = ActorConfig::default()
            .opt_config(OptimizerConfig::default().learning_rate(3e-3))
            .pi_config(MlpConfig::new(1, vec![16], 1, false));
        let critic_config = CriticConfig::default()
            .opt_config(OptimizerConfig::default().learning_rate(3e-3))
            .q_config(MlpConfig::new(2, vec![16], 1, false));
        SacConfig::default()
            .batch_size(8)
            .n_updates_per_opt(2)
            .ent_coef_mode(EntCoefMode::Auto(-1.0, 3e-4))
            .actor_config(actor_config)
            .critic_config(critic_config)
    }

    fn filled_buffer() -> Result<Buffer> {
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default().capacity(32));
        for i in 0..16 {
            let a = i as f32 / 8.0 - 1.0;
            buffer.push(GenericTransitionBatch {
                obs: ArrayBatch::from_row(vec![0.5]),
                act: ArrayBatch::from_row(vec![a]),
                next_obs: ArrayBatch::from_row(vec![0.5]),
                reward: vec![-(a - 0.5).powi(2)],
                is_terminated: vec![1],
                is_truncated: vec![0],
            })?;
        }
        Ok(buffer)
    }

    #[test]
    fn test_opt_records_losses() -> Result<()> {
        let mut agent = PointSac::build(config())?;
        let mut buffer = filled_buffer()?;
        agent.train();

        let record = agent.opt_with_record(&mut buffer)?;
        assert_eq!(agent.n_opts(), 2);
        assert!(record.get_scalar("loss_critic")?.is_finite());
        assert!(record.get_scalar("loss_actor")?.is_finite());
        assert!(record.get_scalar("ent_coef")? > 0.0);
        Ok(())
    }

    #[test]
    fn test_opt_on_empty_buffer_fails() -> Result<()> {
        let mut agent = PointSac::build(config())?;
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default());
        assert!(agent.opt(&mut buffer).is_err());
        Ok(())
    }

    #[test]
    fn test_eval_mode_takes_the_mean() -> Result<()> {
        let mut agent = PointSac::build(config())?;
        agent.eval();
        let a1 = agent.sample(&PointObs(0.5))?;
        let a2 = agent.sample(&PointObs(0.5))?;
        assert_eq!(a1, a2);
        assert!(a1.0.abs() <= 1.0);

        agent.train();
        for _ in 0..10 {
            assert!(agent.sample(&PointObs(0.5))?.0.abs() <= 1.0);
        }
        Ok(())
    }

    #[test]
    fn test_target_critics_start_from_critics() -> Result<()> {
        let agent = PointSac::build(config())?;
        let obs = Tensor::from_slice(&[0.1f32, -0.3], (2, 1), &Device::Cpu)?;
        let act = Tensor::from_slice(&[0.7f32, 0.2], (2, 1), &Device::Cpu)?;

        let q = agent.qvals(&agent.qnets, &obs, &act)?;
        let q_tgt = agent.qvals(&agent.qnets_tgt, &obs, &act)?;
        for (q, q_tgt) in q.iter().zip(&q_tgt) {
            assert_eq!(q.to_vec1::<f32>()?, q_tgt.to_vec1::<f32>()?);
        }
        Ok(())
    }

    #[test]
    fn test_save_and_load_params() -> Result<()> {
        let dir = TempDir::new("sac")?;
        let mut agent = PointSac::build(config())?;
        let mut buffer = filled_buffer()?;
        agent.opt(&mut buffer)?;
        agent.save_params(dir.path())?;

        for file in ["pi.pt", "ent_coef.pt", "qnet_0.pt", "qnet_tgt_1.pt"] {
            assert!(dir.path().join(file).exists(), "{} is missing", file);
        }

        let mut loaded = PointSac::build(config())?;
        loaded.load_params(dir.path())?;
        agent.eval();
        loaded.eval();
        assert_eq!(
            agent.sample(&PointObs(0.2))?,
            loaded.sample(&PointObs(0.2))?
        );
        Ok(())
    }

    #[test]
    fn test_build_needs_a_critic() {
        assert!(PointSac::build(config().n_critics(0)).is_err());
    }
}
