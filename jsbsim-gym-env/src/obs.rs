//! Observation of the flight environment.
use crate::state::{FlightState, StateVar, STATE_DIM};
use jsbsim_gym_core::{generic_replay_buffer::ArrayBatch, Obs};
use std::f64::consts::PI;

const INF: f64 = f64::INFINITY;

/// Number of elements of the goal vector.
pub const GOAL_DIM: usize = 3;

/// Number of elements of a flattened observation.
pub const OBS_DIM: usize = STATE_DIM + GOAL_DIM;

/// State vector followed by the goal vector.
///
/// The goal is always zero. It is kept so that goal-conditioned variants of the
/// environment share the observation layout.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlightObs {
    /// State read from the engine.
    pub state: FlightState,

    /// Goal, currently unused.
    pub goal: [f64; GOAL_DIM],
}

impl FlightObs {
    /// Lower bounds of the flattened observation.
    ///
    /// Angles are bounded by [-π, π]. [`FlightEnv`](crate::FlightEnv) reports the
    /// heading in [0, 2π) as the engine gives it; observations stepped through
    /// [`ShapedFlightEnv`](crate::ShapedFlightEnv) carry it normalized into the bounds.
    pub const LOW: [f64; OBS_DIM] = [
        -INF, -INF, 0.0, 0.0, -PI, -PI, -INF, -INF, -INF, -PI, -PI, -PI,
        -INF, -INF, 0.0,
    ];

    /// Upper bounds of the flattened observation.
    pub const HIGH: [f64; OBS_DIM] = [
        INF, INF, INF, INF, PI, PI, INF, INF, INF, PI, PI, PI,
        INF, INF, INF,
    ];

    /// Constructs an observation with a zero goal.
    pub fn new(state: FlightState) -> Self {
        Self {
            state,
            goal: [0.0; GOAL_DIM],
        }
    }

    /// Returns an element of the state part.
    pub fn get(&self, var: StateVar) -> f64 {
        self.state[var]
    }

    /// Returns `true` if every element is within [`FlightObs::LOW`] and [`FlightObs::HIGH`].
    pub fn is_in_bounds(&self) -> bool {
        self.to_vec()
            .iter()
            .zip(Self::LOW.iter().zip(Self::HIGH.iter()))
            .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }

    /// Flattens the observation into `state ‖ goal`.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut v = Vec::with_capacity(OBS_DIM);
        v.extend_from_slice(self.state.as_array());
        v.extend_from_slice(&self.goal);
        v
    }
}

impl Obs for FlightObs {
    fn len(&self) -> usize {
        OBS_DIM
    }
}

impl From<&FlightObs> for Vec<f32> {
    fn from(obs: &FlightObs) -> Self {
        obs.to_vec().into_iter().map(|v| v as f32).collect()
    }
}

impl From<FlightObs> for ArrayBatch {
    fn from(obs: FlightObs) -> Self {
        ArrayBatch::from_row(Vec::<f32>::from(&obs))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flatten_appends_zero_goal() {
        let mut state = FlightState::default();
        state[StateVar::Longitude] = 120.0;
        state[StateVar::Heading] = 1.5;
        let obs = FlightObs::new(state);

        let v = obs.to_vec();
        assert_eq!(v.len(), obs.len());
        assert_eq!(v[0], 120.0);
        assert_eq!(v[StateVar::Heading.index()], 1.5);
        assert_eq!(&v[STATE_DIM..], &[0.0; GOAL_DIM]);

        let row = ArrayBatch::from(obs);
        assert_eq!(row.dim(), OBS_DIM);
        assert_eq!(row.row(0)[0], 120.0);
    }
}
