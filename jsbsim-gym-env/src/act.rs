//! Action of the flight environment.
use crate::FlightEnvError;
use jsbsim_gym_core::{generic_replay_buffer::ArrayBatch, Act};
use std::convert::TryFrom;

/// Control inputs written to the engine at every step.
///
/// Values are passed to the engine as they are; no clamping is done here.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlightAct {
    /// Roll command, written to the aileron, in [-1, 1].
    pub roll: f64,

    /// Pitch command, written to the elevator, in [-1, 1].
    pub pitch: f64,

    /// Yaw command, written to the rudder, in [-1, 1].
    pub yaw: f64,

    /// Throttle command in [0, 1].
    pub throttle: f64,
}

impl FlightAct {
    /// Lower bounds of `[roll, pitch, yaw, throttle]`.
    pub const LOW: [f64; 4] = [-1.0, -1.0, -1.0, 0.0];

    /// Upper bounds of `[roll, pitch, yaw, throttle]`.
    pub const HIGH: [f64; 4] = [1.0, 1.0, 1.0, 1.0];

    /// Constructs an action.
    pub fn new(roll: f64, pitch: f64, yaw: f64, throttle: f64) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            throttle,
        }
    }

    /// Returns `[roll, pitch, yaw, throttle]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.roll, self.pitch, self.yaw, self.throttle]
    }

    /// Returns `true` if every element is within [`FlightAct::LOW`] and [`FlightAct::HIGH`].
    pub fn is_in_range(&self) -> bool {
        self.to_array()
            .iter()
            .zip(Self::LOW.iter().zip(Self::HIGH.iter()))
            .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}

impl From<[f64; 4]> for FlightAct {
    fn from(a: [f64; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }
}

/// Maps `v` in [-1, 1] linearly onto [lo, hi].
fn unsquash(v: f32, lo: f64, hi: f64) -> f64 {
    lo + (v as f64 + 1.0) * 0.5 * (hi - lo)
}

/// Maps `v` in [lo, hi] linearly onto [-1, 1].
fn squash(v: f64, lo: f64, hi: f64) -> f32 {
    (2.0 * (v - lo) / (hi - lo) - 1.0) as f32
}

/// Builds an action from values in [-1, 1], rescaled onto [`FlightAct::LOW`] and
/// [`FlightAct::HIGH`]. Throttle -1 is idle and 1 is full.
impl TryFrom<Vec<f32>> for FlightAct {
    type Error = anyhow::Error;

    fn try_from(v: Vec<f32>) -> anyhow::Result<Self> {
        if v.len() != 4 {
            return Err(FlightEnvError::ActionLength(v.len()).into());
        }
        let mut a = [0f64; 4];
        for (i, x) in v.iter().enumerate() {
            a[i] = unsquash(*x, Self::LOW[i], Self::HIGH[i]);
        }
        Ok(a.into())
    }
}

/// Stores the action rescaled onto [-1, 1], the inverse of the conversion from `Vec<f32>`.
impl From<FlightAct> for ArrayBatch {
    fn from(act: FlightAct) -> Self {
        let row = act
            .to_array()
            .iter()
            .enumerate()
            .map(|(i, v)| squash(*v, FlightAct::LOW[i], FlightAct::HIGH[i]))
            .collect();
        ArrayBatch::from_row(row)
    }
}

impl Act for FlightAct {
    fn len(&self) -> usize {
        4
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unit_vector_rescaled_onto_ranges() -> anyhow::Result<()> {
        let act = FlightAct::try_from(vec![-1.0, 0.0, 1.0, -1.0])?;
        assert_eq!(act, FlightAct::new(-1.0, 0.0, 1.0, 0.0));

        let act = FlightAct::try_from(vec![0.5, 0.5, 0.5, 0.0])?;
        assert_eq!(act.throttle, 0.5);
        assert!(act.is_in_range());

        let row = ArrayBatch::from(act);
        assert_eq!(row.data(), &[0.5, 0.5, 0.5, 0.0]);
        Ok(())
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = FlightAct::try_from(vec![0.0; 3]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FlightEnvError>(),
            Some(FlightEnvError::ActionLength(3))
        ));
    }
}
