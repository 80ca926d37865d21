//! Entropy coefficient of SAC.
use crate::opt::{Optimizer, OptimizerConfig};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{init::Init, VarBuilder, VarMap};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mode of the entropy coefficient of SAC.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum EntCoefMode {
    /// Use a constant as alpha.
    Fix(f64),
    /// Automatic tuning given `(target_entropy, learning_rate)`.
    Auto(f64, f64),
}

/// The entropy coefficient of SAC.
pub struct EntCoef {
    varmap: VarMap,
    log_alpha: Tensor,
    target_entropy: Option<f64>,
    opt: Option<Optimizer>,
}

impl EntCoef {
    /// Constructs an instance of `EntCoef`.
    pub fn new(mode: EntCoefMode, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let (log_alpha, target_entropy, opt) = match mode {
            EntCoefMode::Fix(alpha) => {
                let log_alpha = vb.get_with_hints(1, "log_alpha", Init::Const(alpha.ln()))?;
                (log_alpha, None, None)
            }
            EntCoefMode::Auto(target_entropy, learning_rate) => {
                let log_alpha = vb.get_with_hints(1, "log_alpha", Init::Const(0.0))?;
                let opt = OptimizerConfig::Adam { lr: learning_rate }.build(varmap.all_vars())?;
                (log_alpha, Some(target_entropy), Some(opt))
            }
        };

        Ok(Self {
            varmap,
            log_alpha,
            target_entropy,
            opt,
        })
    }

    /// Returns the entropy coefficient, a tensor of shape `(1,)`.
    pub fn alpha(&self) -> Result<Tensor> {
        Ok(self.log_alpha.detach().exp()?)
    }

    /// Returns the entropy coefficient as a number.
    pub fn alpha_value(&self) -> Result<f32> {
        Ok(self.alpha()?.to_vec1::<f32>()?[0])
    }

    /// Updates the parameter given log probabilities of sampled actions.
    ///
    /// Does nothing with [`EntCoefMode::Fix`].
    pub fn update(&mut self, logp: &Tensor) -> Result<()> {
        if let (Some(target_entropy), Some(opt)) = (self.target_entropy, &mut self.opt) {
            let loss = (self
                .log_alpha
                .broadcast_mul(&(logp + target_entropy)?.detach())?
                * -1f64)?
                .mean_all()?;
            opt.backward_step(&loss)?;
        }
        Ok(())
    }

    /// Save the parameter into a file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save entropy coefficient to {:?}", path.as_ref());
        Ok(())
    }

    /// Load the parameter from a file.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load entropy coefficient from {:?}", path.as_ref());
        Ok(())
    }
}
