//! Replay buffer.
use anyhow::Result;

/// Interface of buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes an experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// The number of experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no experience.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface of replay buffers generating batches used to train agents.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated from the buffer.
    type Batch: TransitionBatch;

    /// Builds a replay buffer from the configuration.
    fn build(config: &Self::Config) -> Self;

    /// Constructs a batch of `size` transitions.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}

/// A batch of transitions used to train agents.
pub trait TransitionBatch {
    /// A set of observations in a batch.
    type ObsBatch;

    /// A set of actions in a batch.
    type ActBatch;

    /// Unpacks the data `(o_t, a_t, o_t+1, r_t, is_terminated_t, is_truncated_t)`.
    #[allow(clippy::type_complexity)]
    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
    );

    /// Returns the number of transitions in the batch.
    fn len(&self) -> usize;

    /// Returns `true` if the batch is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the observations `o_t`.
    fn obs(&self) -> &Self::ObsBatch;

    /// Returns the actions `a_t`.
    fn act(&self) -> &Self::ActBatch;
}
