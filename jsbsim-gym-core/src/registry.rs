//! Lookup of environment constructors by name.
use crate::{error::GymError, Env, TimeLimit};
use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeMap;

/// A function building an environment from its configuration and a seed.
pub type EntryPoint<E> = fn(&<E as Env>::Config, i64) -> Result<E>;

/// A registered environment.
pub struct EnvSpec<E: Env> {
    /// Identifier, e.g. `"JSBSim-v1"`.
    pub id: String,

    /// Constructor of the environment.
    pub entry_point: EntryPoint<E>,

    /// Step limit applied by [`Registry::make`].
    pub max_episode_steps: Option<usize>,
}

/// Environments of type `E` registered under string ids.
pub struct Registry<E: Env> {
    specs: BTreeMap<String, EnvSpec<E>>,
}

impl<E: Env> Default for Registry<E> {
    fn default() -> Self {
        Self {
            specs: BTreeMap::new(),
        }
    }
}

impl<E: Env> Registry<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry point under `id`.
    ///
    /// Fails if `id` is already taken.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        entry_point: EntryPoint<E>,
        max_episode_steps: Option<usize>,
    ) -> Result<()> {
        let id = id.into();
        if self.specs.contains_key(&id) {
            return Err(GymError::DuplicateEnvId(id).into());
        }
        debug!("Register {} (max_episode_steps = {:?})", id, max_episode_steps);
        self.specs.insert(
            id.clone(),
            EnvSpec {
                id,
                entry_point,
                max_episode_steps,
            },
        );
        Ok(())
    }

    /// Returns the spec registered under `id`.
    pub fn spec(&self, id: &str) -> Option<&EnvSpec<E>> {
        self.specs.get(id)
    }

    /// Returns registered ids in lexicographic order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// Builds the environment registered under `id`, wrapped in its step limit.
    pub fn make(&self, id: &str, config: &E::Config, seed: i64) -> Result<TimeLimit<E>> {
        let spec = self
            .specs
            .get(id)
            .ok_or_else(|| GymError::UnknownEnvId(id.to_string()))?;
        info!("Make {}", id);
        let env = (spec.entry_point)(config, seed)?;
        Ok(TimeLimit::new(env, spec.max_episode_steps))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dummy::{CountdownAct, CountdownConfig, CountdownEnv};

    fn registry() -> Result<Registry<CountdownEnv>> {
        let mut registry = Registry::new();
        registry.register("Countdown-v0", CountdownEnv::build, Some(2))?;
        Ok(registry)
    }

    #[test]
    fn test_make_applies_step_limit() -> Result<()> {
        let registry = registry()?;
        let mut env = registry.make("Countdown-v0", &CountdownConfig { start: 10 }, 0)?;
        assert_eq!(env.max_episode_steps(), Some(2));

        env.step(&CountdownAct(1))?;
        let (step, _) = env.step(&CountdownAct(1))?;
        assert!(step.is_truncated);
        Ok(())
    }

    #[test]
    fn test_unknown_id() -> Result<()> {
        let registry = registry()?;
        let err = match registry.make("Countdown-v1", &CountdownConfig { start: 1 }, 0) {
            Ok(_) => panic!("Countdown-v1 is not registered"),
            Err(err) => err,
        };
        assert!(matches!(
            err.downcast_ref::<GymError>(),
            Some(GymError::UnknownEnvId(_))
        ));
        Ok(())
    }

    #[test]
    fn test_duplicate_id() -> Result<()> {
        let mut registry = registry()?;
        let err = registry
            .register("Countdown-v0", CountdownEnv::build, None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GymError>(),
            Some(GymError::DuplicateEnvId(_))
        ));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["Countdown-v0"]);
        Ok(())
    }
}
