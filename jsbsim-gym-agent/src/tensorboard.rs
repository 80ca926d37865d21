//! Records written as TFRecord for tensorboard.
use jsbsim_gym_core::record::{Record, RecordValue, Recorder};
use log::warn;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Write records to TFRecord.
///
/// Every record is written at the step given by its `opt_steps` value.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    step_key: String,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            step_key: "opt_steps".to_string(),
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Write a given [`Record`] into a TFRecord.
    ///
    /// Only [`RecordValue::Scalar`] values are written. A record without a scalar
    /// step is skipped.
    fn write(&mut self, record: Record) {
        let step = match record.get(&self.step_key) {
            Some(RecordValue::Scalar(v)) => *v as usize,
            _ => {
                warn!("Record without {} is not written", self.step_key);
                return;
            }
        };

        for (k, v) in record.iter() {
            if *k != self.step_key {
                if let RecordValue::Scalar(v) = v {
                    self.writer.add_scalar(k, *v, step);
                }
            }
        }
    }

    fn flush(&mut self) {
        self.writer.flush();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn test_writes_event_file() -> Result<()> {
        let dir = TempDir::new("tensorboard")?;
        let mut recorder = TensorboardRecorder::new(dir.path());

        let mut record = Record::from_scalar("opt_steps", 10.0);
        record.insert("loss_critic", RecordValue::Scalar(0.5));
        recorder.write(record);
        recorder.write(Record::from_scalar("loss_actor", 1.0));
        recorder.flush();

        let n_files = fs::read_dir(dir.path())?.count();
        assert!(n_files > 0);
        Ok(())
    }
}
