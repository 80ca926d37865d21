use super::{hidden_layers, relu_forward, MlpConfig};
use crate::model::{SubModel1, SubModel2};
use candle_core::{Device, Module, Result, Tensor, D};
use candle_nn::{linear, Linear, VarBuilder};

/// Multilayer perceptron with ReLU activation function.
///
/// As a [`SubModel2`], the two inputs are concatenated along the last dimension, so
/// `in_dim` is the sum of their widths.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
    head: Linear,
}

impl Mlp {
    fn build_(vb: VarBuilder, config: MlpConfig) -> Result<Self> {
        let device = vb.device().clone();
        let layers = hidden_layers("mlp", &vb, &config)?;
        let in_dim = config.units.last().copied().unwrap_or(config.in_dim);
        let head = linear(in_dim, config.out_dim, vb.pp("mlp").pp("out"))?;

        Ok(Self {
            config,
            device,
            layers,
            head,
        })
    }

    fn forward_(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = relu_forward(xs, &self.layers)?;
        let xs = self.head.forward(&xs)?;

        match self.config.activation_out {
            false => Ok(xs),
            true => xs.relu(),
        }
    }
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        self.forward_(&xs.to_device(&self.device)?)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        Self::build_(vb, config)
    }
}

impl SubModel2 for Mlp {
    type Config = MlpConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Tensor> {
        let input1 = input1.to_device(&self.device)?;
        let input2 = input2.to_device(&self.device)?;
        let input = Tensor::cat(&[input1, input2], D::Minus1)?;
        self.forward_(&input)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        Self::build_(vb, config)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_critic_input_is_concatenated() -> anyhow::Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = <Mlp as SubModel2>::build(vb, MlpConfig::new(5, vec![8, 8], 1, false))?;

        let obs = Tensor::zeros((3, 3), DType::F32, &Device::Cpu)?;
        let act = Tensor::zeros((3, 2), DType::F32, &Device::Cpu)?;
        let q = SubModel2::forward(&mlp, &obs, &act)?;
        assert_eq!(q.dims(), [3, 1]);

        // Three linear layers, each with a weight and a bias.
        assert_eq!(varmap.all_vars().len(), 6);
        Ok(())
    }
}
