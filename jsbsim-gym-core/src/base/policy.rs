//! Policy.
use super::Env;
use anyhow::Result;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy<E: Env> {
    /// Sample an action given an observation.
    ///
    /// Fails when the policy cannot compute an action, e.g. on a backend error of a
    /// neural network.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act>;
}

/// Allows a policy chosen at runtime, e.g. `Box<dyn Policy<E>>`, wherever a policy is expected.
impl<E: Env, P: Policy<E> + ?Sized> Policy<E> for Box<P> {
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        (**self).sample(obs)
    }
}
