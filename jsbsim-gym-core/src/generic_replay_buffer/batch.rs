//! Batches of observations, actions and transitions.
use crate::TransitionBatch;
use serde::{Deserialize, Serialize};

/// Basic operations of batches of observations or actions stored in
/// [`SimpleReplayBuffer`](super::SimpleReplayBuffer).
pub trait BatchBase {
    /// Creates a batch able to hold `capacity` items.
    fn new(capacity: usize) -> Self;

    /// Writes the items of `data` from index `ix`, wrapping around at the capacity.
    fn push(&mut self, ix: usize, data: Self);

    /// Returns a batch of the items at `ixs`.
    fn sample(&self, ixs: &[usize]) -> Self;
}

/// Rows of `f32` values of a fixed width, stored contiguously.
///
/// The width is taken from the first pushed batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayBatch {
    capacity: usize,
    dim: usize,
    data: Vec<f32>,
}

impl ArrayBatch {
    /// A batch holding one row.
    pub fn from_row(row: Vec<f32>) -> Self {
        Self {
            capacity: 1,
            dim: row.len(),
            data: row,
        }
    }

    /// A batch of `data.len() / dim` rows.
    pub fn from_data(data: Vec<f32>, dim: usize) -> Self {
        let capacity = if dim == 0 { 0 } else { data.len() / dim };
        Self {
            capacity,
            dim,
            data,
        }
    }

    /// Width of a row.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows held.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    /// Returns `true` if no row is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the `i`-th row.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Row-major values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl BatchBase for ArrayBatch {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            dim: 0,
            data: Vec::new(),
        }
    }

    fn push(&mut self, ix: usize, data: Self) {
        if data.is_empty() {
            return;
        }
        if self.data.is_empty() {
            self.dim = data.dim;
            self.data = vec![0.0; self.capacity * self.dim];
        }
        debug_assert_eq!(self.dim, data.dim);

        let dim = self.dim;
        for (k, row) in data.data.chunks(dim).enumerate() {
            let j = (ix + k) % self.capacity;
            self.data[j * dim..(j + 1) * dim].copy_from_slice(row);
        }
    }

    fn sample(&self, ixs: &[usize]) -> Self {
        let mut data = Vec::with_capacity(ixs.len() * self.dim);
        for &ix in ixs {
            data.extend_from_slice(self.row(ix));
        }
        Self {
            capacity: ixs.len(),
            dim: self.dim,
            data,
        }
    }
}

/// Transitions `(o_t, a_t, o_t+1, r_t, is_terminated_t, is_truncated_t)`.
#[derive(Clone, Debug)]
pub struct GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Observations.
    pub obs: O,

    /// Actions.
    pub act: A,

    /// Next observations.
    pub next_obs: O,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Termination flags.
    pub is_terminated: Vec<i8>,

    /// Truncation flags.
    pub is_truncated: Vec<i8>,
}

impl<O, A> TransitionBatch for GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(self) -> (O, A, O, Vec<f32>, Vec<i8>, Vec<i8>) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
            self.is_truncated,
        )
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &O {
        &self.obs
    }

    fn act(&self) -> &A {
        &self.act
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_wraps_around() {
        let mut batch = ArrayBatch::new(3);
        batch.push(0, ArrayBatch::from_data(vec![1.0, 1.5, 2.0, 2.5], 2));
        batch.push(2, ArrayBatch::from_data(vec![3.0, 3.5, 4.0, 4.5], 2));

        assert_eq!(batch.dim(), 2);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.row(0), &[4.0, 4.5]);
        assert_eq!(batch.row(1), &[2.0, 2.5]);
        assert_eq!(batch.row(2), &[3.0, 3.5]);
    }

    #[test]
    fn test_sample_rows() {
        let mut batch = ArrayBatch::new(4);
        batch.push(0, ArrayBatch::from_data(vec![0.0, 1.0, 2.0, 3.0], 1));
        let sampled = batch.sample(&[3, 3, 0]);
        assert_eq!(sampled.data(), &[3.0, 3.0, 0.0]);
        assert_eq!(sampled.len(), 3);
    }
}
