//! Multilayer perceptron.
mod base;
mod config;
mod mlp2;
pub use base::Mlp;
use candle_core::{Result, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};
pub use config::MlpConfig;
pub use mlp2::Mlp2;

/// Linear layers `in_dim -> units[0] -> ... -> units[n-1]`, named `{prefix}.ln{i}`.
fn hidden_layers(prefix: &str, vb: &VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let vb = vb.pp(prefix);
    let mut in_dim = config.in_dim;
    let mut layers = Vec::with_capacity(config.units.len());
    for (i, &out_dim) in config.units.iter().enumerate() {
        layers.push(linear(in_dim, out_dim, vb.pp(format!("ln{}", i)))?);
        in_dim = out_dim;
    }
    Ok(layers)
}

/// Applies the layers, each followed by ReLU.
fn relu_forward(xs: &Tensor, layers: &[Linear]) -> Result<Tensor> {
    let mut xs = xs.clone();
    for layer in layers {
        xs = layer.forward(&xs)?.relu()?;
    }
    Ok(xs)
}
