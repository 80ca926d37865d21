#![warn(missing_docs)]
//! Reinforcement learning agents for `jsbsim-gym`, implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! [`sac::Sac`] is a soft actor-critic agent for continuous actions. It learns from
//! replay buffers whose batches are [`ArrayBatch`](jsbsim_gym_core::generic_replay_buffer::ArrayBatch)es,
//! and its networks are built from [`mlp`] modules. [`TensorboardRecorder`] writes the
//! records of a training run as TFRecord.
pub mod mlp;
pub mod model;
pub mod opt;
pub mod sac;
mod tensorboard;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};
pub use tensorboard::TensorboardRecorder;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Default)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Device {
    /// Creates the candle device.
    pub fn build(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
