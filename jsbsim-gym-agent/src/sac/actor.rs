//! Actor of SAC agent.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Actor`].
pub struct ActorConfig<P> {
    /// Configuration of the policy network.
    pub pi_config: Option<P>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<P> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<P> ActorConfig<P> {
    /// Sets configurations for the policy network.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }
}

/// Stochastic policy for SAC agents.
///
/// Outputs the mean and the log standard deviation of a Gaussian over pre-squashed
/// actions.
pub struct Actor<P>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
{
    varmap: VarMap,
    out_dim: usize,
    pi: P,
    opt: Optimizer,
}

impl<P> Actor<P>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`Actor`].
    pub fn build(config: ActorConfig<P::Config>, device: &Device) -> Result<Self> {
        let pi_config = config.pi_config.context("pi_config is not set.")?;
        let out_dim = pi_config.get_out_dim();
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            P::build(vb, pi_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            out_dim,
            pi,
            opt,
        })
    }

    /// Outputs the parameters of Gaussian distribution given an observation.
    pub fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let (mean, lstd) = self.pi.forward(x)?;
        debug_assert_eq!(mean.dims()[1], self.out_dim);
        debug_assert_eq!(lstd.dims()[1], self.out_dim);
        Ok((mean, lstd))
    }

    /// Dimension of the action.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Does an optimization step given a loss.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Saves the parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save actor to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters written by [`Actor::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load actor from {:?}", path.as_ref());
        Ok(())
    }
}
