//! Configuration of SAC agent.
use super::{ActorConfig, CriticConfig, EntCoefMode};
use crate::{util::CriticLoss, Device};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`Sac`](super::Sac).
///
/// `Q` and `P` are the configurations of the critic and the policy networks.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SacConfig<Q, P> {
    /// Configuration of the actor model.
    pub actor_config: ActorConfig<P>,

    /// Configuration of the critic model.
    pub critic_config: CriticConfig<Q>,

    /// Discont factor.
    pub gamma: f64,

    /// Soft update coefficient of the target critics.
    pub tau: f64,

    /// How to update entropy coefficient.
    pub ent_coef_mode: EntCoefMode,

    /// Added inside the log of the tanh correction of action probabilities.
    pub epsilon: f64,

    /// Lower bound of the log standard deviation of the policy.
    pub min_lstd: f64,

    /// Upper bound of the log standard deviation of the policy.
    pub max_lstd: f64,

    /// Number of parameter updates per optimization step.
    pub n_updates_per_opt: usize,

    /// Batch size for training.
    pub batch_size: usize,

    /// If `true`, actions are sampled from the policy; otherwise the mean is taken.
    pub train: bool,

    /// Multiplier of rewards in the critic target.
    pub reward_scale: f32,

    /// Type of critic loss function.
    pub critic_loss: CriticLoss,

    /// Number of critics. Targets use their minimum.
    pub n_critics: usize,

    /// Device for actor/critic models.
    pub device: Device,
}

impl<Q, P> Default for SacConfig<Q, P> {
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            gamma: 0.99,
            tau: 0.005,
            ent_coef_mode: EntCoefMode::Fix(1.0),
            epsilon: 1e-4,
            min_lstd: -20.0,
            max_lstd: 2.0,
            n_updates_per_opt: 1,
            batch_size: 256,
            train: false,
            reward_scale: 1.0,
            critic_loss: CriticLoss::Mse,
            n_critics: 2,
            device: Device::Cpu,
        }
    }
}

impl<Q, P> SacConfig<Q, P>
where
    Q: serde::de::DeserializeOwned + Serialize,
    P: serde::de::DeserializeOwned + Serialize,
{
    /// Sets the numper of parameter update steps per optimization step.
    pub fn n_updates_per_opt(mut self, v: usize) -> Self {
        self.n_updates_per_opt = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// SAC-alpha.
    pub fn ent_coef_mode(mut self, v: EntCoefMode) -> Self {
        self.ent_coef_mode = v;
        self
    }

    /// Reward scale.
    pub fn reward_scale(mut self, v: f32) -> Self {
        self.reward_scale = v;
        self
    }

    /// Critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// The number of critics.
    pub fn n_critics(mut self, v: usize) -> Self {
        self.n_critics = v;
        self
    }

    /// Configuration of actor.
    pub fn actor_config(mut self, actor_config: ActorConfig<P>) -> Self {
        self.actor_config = actor_config;
        self
    }

    /// Configuration of critic.
    pub fn critic_config(mut self, critic_config: CriticConfig<Q>) -> Self {
        self.critic_config = critic_config;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Constructs [`SacConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = jsbsim_gym_core::util::load_yaml(&path)?;
        info!("Load config of SAC agent from {:?}", path.as_ref());
        Ok(config)
    }

    /// Saves [`SacConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        jsbsim_gym_core::util::save_yaml(self, &path)?;
        info!("Save config of SAC agent into {:?}", path.as_ref());
        Ok(())
    }
}
