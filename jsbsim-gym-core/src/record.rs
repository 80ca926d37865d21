//! Records emitted while interacting with environments.
//!
//! A [`Record`] is a set of key-value pairs. Environments return one at every step
//! and a [`Recorder`] decides where it goes: [`BufferedRecorder`] keeps records in
//! memory, [`NullRecorder`] drops them.
//!
//! ```rust
//! use jsbsim_gym_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("step", RecordValue::Scalar(1.0));
//! record.insert("reward", RecordValue::Scalar(-10.0));
//! record.insert("obs", RecordValue::Array1(vec![1.0, 2.0, 3.0]));
//!
//! assert_eq!(record.get_scalar("reward").unwrap(), -10.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
