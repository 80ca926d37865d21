//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Learning rate of SAC in stable-baselines3.
const DEFAULT_LR: f64 = 3e-4;

/// Optimizer of a network in [`Sac`](crate::sac::Sac).
///
/// Moment decays and epsilon are the defaults of the underlying optimizers.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Weight decay.
        #[serde(default)]
        weight_decay: f64,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: DEFAULT_LR }
    }
}

impl OptimizerConfig {
    /// Constructs an optimizer of `vars`.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        let opt = match *self {
            Self::Adam { lr } => Optimizer::Adam(Adam::new(
                vars,
                ParamsAdam {
                    lr,
                    ..ParamsAdam::default()
                },
            )?),
            Self::AdamW { lr, weight_decay } => Optimizer::AdamW(AdamW::new(
                vars,
                ParamsAdamW {
                    lr,
                    weight_decay,
                    ..ParamsAdamW::default()
                },
            )?),
        };
        Ok(opt)
    }

    /// Replaces the learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam { .. } => Self::Adam { lr },
            Self::AdamW { weight_decay, .. } => Self::AdamW { lr, weight_decay },
        }
    }
}

/// Built optimizer.
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Adam),

    /// AdamW optimizer.
    AdamW(AdamW),
}

impl Optimizer {
    /// Backpropagates `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.backward_step(loss)?,
            Self::AdamW(opt) => opt.backward_step(loss)?,
        }
        Ok(())
    }
}
