//! Policies without learned parameters.
use crate::{FlightAct, FlightObs};
use anyhow::Result;
use jsbsim_gym_core::{Env, Policy};

/// Returns the same action whatever the observation.
#[derive(Clone, Debug, Default)]
pub struct ConstantPolicy(pub FlightAct);

impl<E: Env<Obs = FlightObs, Act = FlightAct>> Policy<E> for ConstantPolicy {
    fn sample(&mut self, _: &FlightObs) -> Result<FlightAct> {
        Ok(self.0)
    }
}

/// Samples actions uniformly within [`FlightAct::LOW`] and [`FlightAct::HIGH`].
pub struct RandomPolicy {
    rng: fastrand::Rng,
}

impl RandomPolicy {
    /// Constructs the policy with a seeded generator.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl<E: Env<Obs = FlightObs, Act = FlightAct>> Policy<E> for RandomPolicy {
    fn sample(&mut self, _: &FlightObs) -> Result<FlightAct> {
        let mut a = [0.0; 4];
        for (v, (lo, hi)) in a
            .iter_mut()
            .zip(FlightAct::LOW.iter().zip(FlightAct::HIGH.iter()))
        {
            *v = lo + (hi - lo) * self.rng.f64();
        }
        Ok(a.into())
    }
}
