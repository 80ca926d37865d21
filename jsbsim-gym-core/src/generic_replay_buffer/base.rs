//! Replay buffer with uniform sampling.
use super::{BatchBase, GenericTransitionBatch, SimpleReplayBufferConfig};
use crate::{error::GymError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// A ring buffer of transitions sampled uniformly at random.
pub struct SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,
    i: usize,
    size: usize,
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
    rng: fastrand::Rng,
}

/// Contents of a buffer written by [`SimpleReplayBuffer::save`].
#[derive(Serialize)]
struct SnapshotRef<'a, O, A> {
    capacity: usize,
    i: usize,
    size: usize,
    obs: &'a O,
    act: &'a A,
    next_obs: &'a O,
    reward: &'a [f32],
    is_terminated: &'a [i8],
    is_truncated: &'a [i8],
}

#[derive(Deserialize)]
struct Snapshot<O, A> {
    capacity: usize,
    i: usize,
    size: usize,
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    fn push_flags<T: Copy>(buf: &mut [T], i: usize, values: &[T]) {
        let capacity = buf.len();
        for (k, v) in values.iter().enumerate() {
            buf[(i + k) % capacity] = *v;
        }
    }

    fn sample_flags<T: Copy>(buf: &[T], ixs: &[usize]) -> Vec<T> {
        ixs.iter().map(|&ix| buf[ix]).collect()
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of terminated episodes in the buffer.
    pub fn num_terminated_flags(&self) -> usize {
        self.is_terminated[..self.size]
            .iter()
            .map(|&f| f as usize)
            .sum()
    }

    /// Returns the number of truncated episodes in the buffer.
    pub fn num_truncated_flags(&self) -> usize {
        self.is_truncated[..self.size]
            .iter()
            .map(|&f| f as usize)
            .sum()
    }

    /// Returns the sum of all rewards in the buffer.
    pub fn sum_rewards(&self) -> f32 {
        self.reward[..self.size].iter().sum()
    }
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase + Serialize + DeserializeOwned,
    A: BatchBase + Serialize + DeserializeOwned,
{
    /// Writes the stored transitions to `path` in bincode.
    ///
    /// The state of the sampling generator is not saved.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = SnapshotRef {
            capacity: self.capacity,
            i: self.i,
            size: self.size,
            obs: &self.obs,
            act: &self.act,
            next_obs: &self.next_obs,
            reward: &self.reward,
            is_terminated: &self.is_terminated,
            is_truncated: &self.is_truncated,
        };
        let wtr = BufWriter::new(File::create(&path)?);
        bincode::serialize_into(wtr, &snapshot)?;
        info!(
            "Saved {} transitions to {:?}",
            self.size,
            path.as_ref()
        );
        Ok(())
    }

    /// Reads transitions written by [`SimpleReplayBuffer::save`].
    ///
    /// Fails with [`GymError::ReplayBufferCapacity`] if the saved buffer has another
    /// capacity.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let rdr = BufReader::new(File::open(&path)?);
        let snapshot: Snapshot<O, A> = bincode::deserialize_from(rdr)?;
        if snapshot.capacity != self.capacity {
            return Err(GymError::ReplayBufferCapacity {
                expected: self.capacity,
                found: snapshot.capacity,
            }
            .into());
        }

        self.i = snapshot.i;
        self.size = snapshot.size;
        self.obs = snapshot.obs;
        self.act = snapshot.act;
        self.next_obs = snapshot.next_obs;
        self.reward = snapshot.reward;
        self.is_terminated = snapshot.is_terminated;
        self.is_truncated = snapshot.is_truncated;
        info!(
            "Loaded {} transitions from {:?}",
            self.size,
            path.as_ref()
        );
        Ok(())
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len();
        let (obs, act, next_obs, reward, is_terminated, is_truncated) = tr.unpack();
        self.obs.push(self.i, obs);
        self.act.push(self.i, act);
        self.next_obs.push(self.i, next_obs);
        Self::push_flags(&mut self.reward, self.i, &reward);
        Self::push_flags(&mut self.is_terminated, self.i, &is_terminated);
        Self::push_flags(&mut self.is_truncated, self.i, &is_truncated);

        self.i = (self.i + len) % self.capacity;
        self.size = (self.size + len).min(self.capacity);
        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;
        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
            rng: fastrand::Rng::with_seed(config.seed),
        }
    }

    /// Samples `size` transitions with replacement.
    ///
    /// Fails with [`GymError::EmptyReplayBuffer`] if nothing has been pushed.
    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size == 0 {
            return Err(GymError::EmptyReplayBuffer.into());
        }
        let ixs = (0..size)
            .map(|_| self.rng.usize(..self.size))
            .collect::<Vec<_>>();

        Ok(Self::Batch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: Self::sample_flags(&self.reward, &ixs),
            is_terminated: Self::sample_flags(&self.is_terminated, &ixs),
            is_truncated: Self::sample_flags(&self.is_truncated, &ixs),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::generic_replay_buffer::ArrayBatch;
    use tempdir::TempDir;

    type Buffer = SimpleReplayBuffer<ArrayBatch, ArrayBatch>;

    fn transition(v: f32, is_terminated: i8) -> GenericTransitionBatch<ArrayBatch, ArrayBatch> {
        GenericTransitionBatch {
            obs: ArrayBatch::from_row(vec![v, v]),
            act: ArrayBatch::from_row(vec![-v]),
            next_obs: ArrayBatch::from_row(vec![v + 1.0, v + 1.0]),
            reward: vec![v],
            is_terminated: vec![is_terminated],
            is_truncated: vec![0],
        }
    }

    #[test]
    fn test_overwrites_oldest_when_full() -> Result<()> {
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default().capacity(3));
        for v in 0..5 {
            buffer.push(transition(v as f32, (v == 4) as i8))?;
        }
        assert_eq!(buffer.len(), 3);
        // Holds rewards 2, 3 and 4.
        assert_eq!(buffer.sum_rewards(), 9.0);
        assert_eq!(buffer.num_terminated_flags(), 1);
        Ok(())
    }

    #[test]
    fn test_batch_keeps_transitions_aligned() -> Result<()> {
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default().capacity(10));
        for v in 0..4 {
            buffer.push(transition(v as f32, 0))?;
        }

        let batch = buffer.batch(16)?;
        assert_eq!(batch.len(), 16);
        let (obs, act, next_obs, reward, _, _) = batch.unpack();
        for k in 0..16 {
            let r = reward[k];
            assert_eq!(obs.row(k), &[r, r]);
            assert_eq!(act.row(k), &[-r]);
            assert_eq!(next_obs.row(k), &[r + 1.0, r + 1.0]);
        }
        Ok(())
    }

    #[test]
    fn test_batch_from_empty_buffer() {
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default());
        let err = match buffer.batch(1) {
            Ok(_) => panic!("batch should fail"),
            Err(err) => err,
        };
        assert!(matches!(
            err.downcast_ref::<GymError>(),
            Some(GymError::EmptyReplayBuffer)
        ));
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new("replay_buffer")?;
        let path = dir.path().join("buffer.bin");
        let config = SimpleReplayBufferConfig::default().capacity(4);

        let mut buffer = Buffer::build(&config);
        for v in 0..6 {
            buffer.push(transition(v as f32, (v % 2) as i8))?;
        }
        buffer.save(&path)?;

        let mut loaded = Buffer::build(&config);
        loaded.load(&path)?;
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.sum_rewards(), buffer.sum_rewards());
        assert_eq!(loaded.num_terminated_flags(), 2);

        // The next push overwrites the same slot in both buffers.
        buffer.push(transition(10.0, 0))?;
        loaded.push(transition(10.0, 0))?;
        assert_eq!(loaded.sum_rewards(), buffer.sum_rewards());

        let mut other = Buffer::build(&config.clone().capacity(8));
        assert!(other.load(&path).is_err());
        Ok(())
    }
}
