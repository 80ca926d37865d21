//! Reward shaping on top of [`FlightEnv`].
use crate::{state::StateVar, Fdm, FlightAct, FlightEnv, FlightEnvConfig, FlightInfo, FlightObs};
use anyhow::Result;
use jsbsim_gym_core::{
    record::{Record, RecordValue},
    Env, Step,
};
use std::f64::consts::PI;

/// Width of the heading term. Applied to radians.
pub const HEADING_ERROR_SCALE: f64 = 5.0;

/// Width of the roll term in radians.
pub const ROLL_ERROR_SCALE: f64 = 0.35;

/// Subtracts 2π from angles above π. Angles below -π are returned as they are.
pub fn normalize_angle(x: f64) -> f64 {
    if x > PI {
        x - 2.0 * PI
    } else {
        x
    }
}

/// Rewards flying wings level on the initial heading.
///
/// The bonus is `gain * sqrt(exp(-(heading / 5)^2) * exp(-(roll / 0.35)^2))`, which is
/// `gain` when both angles are zero.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadingRollShaping {
    /// Multiplier of the bonus.
    pub gain: f64,
}

impl Default for HeadingRollShaping {
    fn default() -> Self {
        Self { gain: 1.0 }
    }
}

impl HeadingRollShaping {
    /// Constructs the shaping with the given gain.
    pub fn new(gain: f64) -> Self {
        Self { gain }
    }

    /// Bonus for normalized heading and roll angles in radians.
    pub fn reward(&self, heading: f64, roll: f64) -> f64 {
        let heading_r = (-(heading / HEADING_ERROR_SCALE).powi(2)).exp();
        let roll_r = (-(roll / ROLL_ERROR_SCALE).powi(2)).exp();
        self.gain * (heading_r * roll_r).sqrt()
    }

    /// Normalizes roll and heading of `obs` in place and returns the bonus.
    pub fn apply(&self, obs: &mut FlightObs) -> f64 {
        let roll = normalize_angle(obs.state[StateVar::Roll]);
        let heading = normalize_angle(obs.state[StateVar::Heading]);
        obs.state[StateVar::Roll] = roll;
        obs.state[StateVar::Heading] = heading;
        self.reward(heading, roll)
    }
}

/// [`FlightEnv`] with [`HeadingRollShaping`] added to its reward.
///
/// Observations returned by [`Env::step`] carry the normalized roll and heading;
/// reset, render and close are those of the inner environment.
pub struct ShapedFlightEnv<F: Fdm> {
    env: FlightEnv<F>,
    shaping: HeadingRollShaping,
}

impl<F: Fdm> ShapedFlightEnv<F> {
    /// Wraps `env`.
    pub fn new(env: FlightEnv<F>, shaping: HeadingRollShaping) -> Self {
        Self { env, shaping }
    }

    /// Returns the shaping.
    pub fn shaping(&self) -> &HeadingRollShaping {
        &self.shaping
    }

    /// Returns the wrapped environment.
    pub fn inner(&self) -> &FlightEnv<F> {
        &self.env
    }

    /// Returns the wrapped environment.
    pub fn inner_mut(&mut self) -> &mut FlightEnv<F> {
        &mut self.env
    }
}

impl<F: Fdm> Env for ShapedFlightEnv<F> {
    type Config = FlightEnvConfig<F::Config>;
    type Obs = FlightObs;
    type Act = FlightAct;
    type Info = FlightInfo;

    /// Builds [`FlightEnv`] and applies the shaping with unit gain.
    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let env = FlightEnv::<F>::build(config, seed)?;
        Ok(Self::new(env, HeadingRollShaping::default()))
    }

    fn step(&mut self, a: &FlightAct) -> Result<(Step<Self>, Record)> {
        let (step, mut record) = self.env.step(a)?;
        let mut step: Step<Self> = step.rewrap();

        let bonus = self.shaping.apply(&mut step.obs);
        step.reward += bonus as f32;
        record.insert("shaping_reward", RecordValue::Scalar(bonus as f32));

        Ok((step, record))
    }

    fn reset(&mut self, seed: Option<i64>) -> Result<FlightObs> {
        self.env.reset(seed)
    }

    fn render(&mut self, mode: &str) -> Result<()> {
        self.env.render(mode)
    }

    fn close(&mut self) {
        self.env.close()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{FlightState, MockFdm, MockFdmConfig};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_level_flight_gives_gain() {
        assert_eq!(HeadingRollShaping::default().reward(0.0, 0.0), 1.0);
        assert_eq!(HeadingRollShaping::new(0.5).reward(0.0, 0.0), 0.5);
    }

    #[test]
    fn test_normalize_angle_is_one_sided() {
        assert!((normalize_angle(3.0 * FRAC_PI_2) + FRAC_PI_2).abs() < 1e-12);
        assert_eq!(normalize_angle(-3.0 * FRAC_PI_2), -3.0 * FRAC_PI_2);
        assert_eq!(normalize_angle(PI), PI);
    }

    #[test]
    fn test_apply_writes_back_normalized_angles() {
        let mut state = FlightState::default();
        state[StateVar::Heading] = 3.0 * FRAC_PI_2;
        state[StateVar::Roll] = 0.35;
        let mut obs = FlightObs::new(state);

        let bonus = HeadingRollShaping::default().apply(&mut obs);
        assert!((obs.get(StateVar::Heading) + FRAC_PI_2).abs() < 1e-12);
        assert_eq!(obs.get(StateVar::Roll), 0.35);

        let expected = ((-(FRAC_PI_2 / 5.0).powi(2)).exp() * (-1.0f64).exp()).sqrt();
        assert!((bonus - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bonus_added_to_termination_reward() -> Result<()> {
        let config = FlightEnvConfig::<MockFdmConfig>::default().initial_altitude_ft(300.0);
        let mut env = ShapedFlightEnv::<MockFdm>::build(&config, 0)?;
        let (step, record) = env.step(&FlightAct::default())?;

        assert!(step.is_terminated);
        assert_eq!(step.reward, -9.0);
        assert_eq!(record.get_scalar("shaping_reward")?, 1.0);
        Ok(())
    }

    #[test]
    fn test_step_without_termination_gets_bonus_only() -> Result<()> {
        let config = FlightEnvConfig::<MockFdmConfig>::default();
        let mut env = ShapedFlightEnv::<MockFdm>::build(&config, 0)?;
        let (step, _) = env.step(&FlightAct::default())?;

        assert!(!step.is_done());
        assert_eq!(step.reward, 1.0);
        Ok(())
    }

    #[test]
    fn test_step_returns_normalized_heading() -> Result<()> {
        let config = FlightEnvConfig::<MockFdmConfig>::default();
        let mut env = ShapedFlightEnv::<MockFdm>::build(&config, 0)?;
        env.inner_mut().fdm_mut().set_attitude(0.0, 0.0, 3.0 * FRAC_PI_2);

        let (step, record) = env.step(&FlightAct::default())?;
        assert!((step.obs.get(StateVar::Heading) + FRAC_PI_2).abs() < 1e-9);
        let expected = (-(FRAC_PI_2 / 5.0).powi(2)).exp().sqrt();
        assert!((record.get_scalar("shaping_reward")? as f64 - expected).abs() < 1e-6);

        // The inner environment keeps the raw angle.
        assert!((env.inner().state()[StateVar::Heading] - 3.0 * FRAC_PI_2).abs() < 1e-9);
        Ok(())
    }
}
