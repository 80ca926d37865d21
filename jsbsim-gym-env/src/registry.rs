//! Registered flight environments.
use crate::{Fdm, ShapedFlightEnv};
use anyhow::Result;
use jsbsim_gym_core::{Env, Registry};

/// Id of the shaped flight environment.
pub const JSBSIM_V1: &str = "JSBSim-v1";

/// Step limit of [`JSBSIM_V1`].
pub const JSBSIM_V1_MAX_EPISODE_STEPS: usize = 1200;

/// Returns a registry with [`JSBSIM_V1`] over the engine `F`.
pub fn registry<F: Fdm>() -> Result<Registry<ShapedFlightEnv<F>>> {
    let mut registry = Registry::new();
    registry.register(
        JSBSIM_V1,
        ShapedFlightEnv::<F>::build,
        Some(JSBSIM_V1_MAX_EPISODE_STEPS),
    )?;
    Ok(registry)
}
