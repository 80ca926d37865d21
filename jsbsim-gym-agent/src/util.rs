//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarMap;
use jsbsim_gym_core::generic_replay_buffer::ArrayBatch;
use serde::{Deserialize, Serialize};

/// Critic loss type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

/// Configurations of networks with a known output dimension.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("poisoned lock of target variables"))?;
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("poisoned lock of source variables"))?;

    for (k, v_dest) in dest.iter() {
        let v_src = src
            .get(k)
            .ok_or_else(|| anyhow!("variable {} not found in the source", k))?;
        let t = ((tau * v_src.as_tensor())? + ((1.0 - tau) * v_dest.as_tensor())?)?;
        v_dest.set(&t)?;
    }

    Ok(())
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> candle_core::Result<Tensor> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?;
    let m2 = (1.0 - &m1)?;
    let quadratic = ((&m1 * d.sqr()?)? * 0.5)?;
    let linear = (m2 * (&d - 0.5)?)?;
    (quadratic + linear)?.mean_all()
}

/// Converts rows of an [`ArrayBatch`] into a tensor of shape `(rows, dim)`.
pub fn batch_to_tensor(batch: &ArrayBatch, device: &Device) -> candle_core::Result<Tensor> {
    Tensor::from_slice(batch.data(), (batch.len(), batch.dim()), device)
}

/// Converts a vector into a tensor of shape `(n,)`.
pub fn vec_to_tensor(v: &[f32], device: &Device) -> candle_core::Result<Tensor> {
    Tensor::from_slice(v, (v.len(),), device)
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_nn::Init;

    fn varmap_with(t: &Tensor) -> Result<VarMap> {
        let mut vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((3,), "var1", init, DType::F32, &Device::Cpu)?;
        vm.set_one("var1", t)?;
        Ok(vm)
    }

    #[test]
    fn test_track() -> Result<()> {
        let tau = 0.7;
        let t_src = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, 6.0], (3,), &Device::Cpu)?;
        let vm_src = varmap_with(&t_src)?;
        let vm_dest = varmap_with(&t_dest)?;

        track(&vm_dest, &vm_src, tau)?;

        let t = vm_dest.data().lock().unwrap().get("var1").unwrap().as_tensor().to_vec1::<f32>()?;
        for (v, expected) in t.iter().zip([1.9f32, 2.9, 3.9]) {
            assert!((v - expected).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_smooth_l1_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0.0f32, 0.0], (2,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[0.5f32, 3.0], (2,), &Device::Cpu)?;
        // (0.5 * 0.25 + (3.0 - 0.5)) / 2
        let loss = smooth_l1_loss(&x, &y)?.to_scalar::<f32>()?;
        assert!((loss - 1.3125).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_batch_to_tensor() -> Result<()> {
        let batch = ArrayBatch::from_data(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        let t = batch_to_tensor(&batch, &Device::Cpu)?;
        assert_eq!(t.dims(), [2, 3]);
        assert_eq!(t.to_vec2::<f32>()?, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        Ok(())
    }
}
