use super::{hidden_layers, relu_forward, MlpConfig};
use crate::model::SubModel1;
use candle_core::{Device, Module, Result, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Multilayer perceptron that outputs two tensors of the same size.
///
/// Used as a Gaussian policy: the heads give the mean and the log standard deviation.
pub struct Mlp2 {
    device: Device,
    head1: Linear,
    head2: Linear,
    layers: Vec<Linear>,
}

impl SubModel1 for Mlp2 {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = (Tensor, Tensor);

    fn forward(&self, xs: &Self::Input) -> Result<Self::Output> {
        let xs = xs.to_device(&self.device)?;
        let xs = relu_forward(&xs, &self.layers)?;
        let mean = self.head1.forward(&xs)?;
        let lstd = self.head2.forward(&xs)?;
        Ok((mean, lstd))
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let layers = hidden_layers("mlp", &vb, &config)?;
        let in_dim = config.units.last().copied().unwrap_or(config.in_dim);
        let head1 = linear(in_dim, config.out_dim, vb.pp("mean"))?;
        let head2 = linear(in_dim, config.out_dim, vb.pp("lstd"))?;

        Ok(Self {
            device,
            head1,
            head2,
            layers,
        })
    }
}
