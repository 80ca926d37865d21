//! Generic implementation of replay buffers.
//!
//! [`SimpleReplayBuffer`] stores transitions of observation and action batches
//! implementing [`BatchBase`] in ring buffers and samples them uniformly.
//! [`SimpleStepProcessor`] turns the [`Step`](crate::Step) objects of a single
//! environment into 1-step transitions to be pushed into the buffer.
//!
//! ```ignore
//! let config = SimpleReplayBufferConfig::default().capacity(1_000_000).seed(42);
//! let mut buffer = SimpleReplayBuffer::<ArrayBatch, ArrayBatch>::build(&config);
//! let mut processor = SimpleStepProcessor::<Env, ArrayBatch, ArrayBatch>::build(
//!     &SimpleStepProcessorConfig::default(),
//! );
//! ```
mod base;
mod batch;
mod config;
mod step_proc;
pub use base::SimpleReplayBuffer;
pub use batch::{ArrayBatch, BatchBase, GenericTransitionBatch};
pub use config::SimpleReplayBufferConfig;
pub use step_proc::{SimpleStepProcessor, SimpleStepProcessorConfig};
