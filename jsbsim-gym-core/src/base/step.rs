//! Environment step.
use super::Env;

/// Additional information to `Obs` and `Act`.
pub trait Info {}

impl Info for () {}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with some additional information.
///
/// An environment emits [`Step`] object at every interaction steps.
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Observation.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated.
    pub is_truncated: bool,

    /// Information defined by user.
    pub info: E::Info,

    /// Observation after the reset done by [`Env::step_with_reset`].
    pub init_obs: Option<E::Obs>,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
            init_obs: None,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }

    /// Moves the fields into a [`Step`] of an environment wrapping `E`.
    ///
    /// Wrappers share observation, action and information types with the wrapped
    /// environment, only the `E` parameter differs.
    pub fn rewrap<W>(self) -> Step<W>
    where
        W: Env<Obs = E::Obs, Act = E::Act, Info = E::Info>,
    {
        Step {
            act: self.act,
            obs: self.obs,
            reward: self.reward,
            is_terminated: self.is_terminated,
            is_truncated: self.is_truncated,
            info: self.info,
            init_obs: self.init_obs,
        }
    }
}

/// Process [`Step`] and output an item [`Self::Output`].
///
/// This trait is used in [`Trainer`](crate::Trainer). [`Step`] object is transformed to
/// [`Self::Output`], which will be pushed into a replay buffer implementing
/// [`ExperienceBufferBase`](crate::ExperienceBufferBase).
pub trait StepProcessor<E: Env> {
    /// Configuration.
    type Config: Clone;

    /// The type of transitions produced by this trait.
    type Output;

    /// Build a producer.
    fn build(config: &Self::Config) -> Self;

    /// Resets the object with the first observation of an episode.
    fn reset(&mut self, init_obs: E::Obs);

    /// Processes a [`Step`] object.
    ///
    /// Fails if [`StepProcessor::reset`] has not been called, or if a step ending an
    /// episode lacks [`Step::init_obs`].
    fn process(&mut self, step: Step<E>) -> anyhow::Result<Self::Output>;
}
