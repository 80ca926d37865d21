//! Flight environment over a flight dynamics model.
use crate::{
    acmi::{AcmiFrame, TacviewRecorder},
    config::{FlightEnvConfig, InitialConditions},
    fdm::property,
    state::{FlightState, StateVar},
    Fdm, FlightAct, FlightEnvError, FlightObs, RenderMode,
};
use anyhow::Result;
use jsbsim_gym_core::{
    record::{Record, RecordValue},
    Env, Info, Step,
};
use log::{info, trace, warn};
use std::time::Duration;

/// Altitude in meters under which an episode terminates.
pub const MIN_ALTITUDE_M: f64 = 100.0;

/// Reward given on the step that terminates an episode.
pub const TERMINATION_REWARD: f32 = -10.0;

/// Information given at every step of the interaction with the environment.
///
/// Currently, it is empty and used to match the type signature.
#[derive(Clone, Debug, Default)]
pub struct FlightInfo {}

impl Info for FlightInfo {}

/// An environment flying one aircraft of the engine `F`.
///
/// Every [`Env::step`] writes the action to the flight controls and advances the
/// engine `down_sample` integration steps, pinning fuel and retracting the gear before
/// each of them. The episode terminates when the aircraft descends below
/// [`MIN_ALTITUDE_M`]; that step is rewarded with [`TERMINATION_REWARD`], every other
/// step with zero.
pub struct FlightEnv<F: Fdm> {
    fdm: F,
    dt: f64,
    down_sample: usize,
    initial_conditions: InitialConditions,
    fuel_contents_lbs: f64,
    state: FlightState,
    step_cnt: usize,
    tacview: TacviewRecorder,
    closed: bool,
}

impl<F: Fdm> FlightEnv<F> {
    /// Returns the engine.
    pub fn fdm(&self) -> &F {
        &self.fdm
    }

    /// Returns the engine.
    pub fn fdm_mut(&mut self) -> &mut F {
        &mut self.fdm
    }

    /// Simulation time in seconds.
    pub fn sim_time(&self) -> f64 {
        self.fdm.get_sim_time()
    }

    /// Number of steps since the last reset.
    pub fn step_cnt(&self) -> usize {
        self.step_cnt
    }

    /// State read at the end of the last step or reset.
    pub fn state(&self) -> &FlightState {
        &self.state
    }

    /// Returns `true` after [`Env::close`].
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current observation.
    ///
    /// Heading is reported as the engine gives it, in `[0, 2π)`, and so may exceed
    /// [`FlightObs::HIGH`]. [`ShapedFlightEnv`](crate::ShapedFlightEnv) normalizes it.
    pub fn observation(&self) -> FlightObs {
        FlightObs::new(self.state)
    }

    /// Renders in a mode chosen by type rather than by name.
    pub fn render_as(&mut self, mode: RenderMode) -> Result<()> {
        if self.closed {
            return Err(FlightEnvError::Closed.into());
        }
        match mode {
            RenderMode::Txt => {
                let timestamp = (self.step_cnt * self.down_sample) as f64 * self.dt;
                let frame = AcmiFrame {
                    lon: self.state[StateVar::Longitude],
                    lat: self.state[StateVar::Latitude],
                    alt_m: self.state.altitude_m(),
                    roll_deg: self.state[StateVar::Roll].to_degrees(),
                    pitch_deg: self.state[StateVar::Pitch].to_degrees(),
                    yaw_deg: self.state[StateVar::Heading].to_degrees(),
                };
                self.tacview.write_frame(timestamp, &frame)
            }
            RenderMode::FlightGear => {
                std::thread::sleep(Duration::from_secs_f64(self.down_sample as f64 * self.dt));
                Ok(())
            }
        }
    }

    fn set_initial_conditions(&mut self) {
        let ic = &self.initial_conditions;
        let values = [
            (property::IC_LONG_GC_DEG, ic.long_gc_deg),
            (property::IC_LAT_GEOD_DEG, ic.lat_geod_deg),
            (property::IC_H_SL_FT, ic.h_sl_ft),
            (property::IC_PSI_TRUE_DEG, ic.psi_true_deg),
            (property::IC_U_FPS, ic.u_fps),
            (property::IC_V_FPS, ic.v_fps),
            (property::IC_W_FPS, ic.w_fps),
            (property::IC_P_RAD_SEC, ic.p_rad_sec),
            (property::IC_Q_RAD_SEC, ic.q_rad_sec),
            (property::IC_R_RAD_SEC, ic.r_rad_sec),
            (property::IC_ROC_FPM, ic.roc_fpm),
            (property::IC_TERRAIN_ELEVATION_FT, ic.terrain_elevation_ft),
        ];
        for (name, value) in values {
            self.fdm.set_property_value(name, value);
        }

        for ix in 0..self.fdm.num_engines() {
            self.fdm.init_running(ix);
        }
        self.fdm.get_steady_state();
        self.fdm.set_property_value(property::SET_RUNNING, -1.0);
    }

    fn set_controls(&mut self, a: &FlightAct) {
        self.fdm.set_property_value(property::AILERON_CMD, a.roll);
        self.fdm.set_property_value(property::ELEVATOR_CMD, a.pitch);
        self.fdm.set_property_value(property::THROTTLE_CMD, a.throttle);
        self.fdm.set_property_value(property::RUDDER_CMD, a.yaw);
    }

    /// Pins fuel in both tanks and holds the gear retracted.
    fn hold_overrides(&mut self) {
        self.fdm
            .set_property_value(property::TANK0_CONTENTS, self.fuel_contents_lbs);
        self.fdm
            .set_property_value(property::TANK1_CONTENTS, self.fuel_contents_lbs);
        self.fdm.set_property_value(property::GEAR_CMD, 0.0);
        self.fdm.set_property_value(property::GEAR_POS, 0.0);
    }
}

impl<F: Fdm> Env for FlightEnv<F> {
    type Config = FlightEnvConfig<F::Config>;
    type Obs = FlightObs;
    type Act = FlightAct;
    type Info = FlightInfo;

    /// Builds the engine, loads the model and solves the initial conditions.
    ///
    /// Fails with [`FlightEnvError::InvalidConfig`] unless `dt` is finite and positive and
    /// `down_sample` is nonzero, and with [`FlightEnvError::InitialConditions`] if the
    /// solver does not converge.
    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        info!(
            "Build FlightEnv: model = {}, dt = {}, down_sample = {}",
            config.model, config.dt, config.down_sample
        );
        if !(config.dt.is_finite() && config.dt > 0.0) {
            return Err(FlightEnvError::InvalidConfig(format!("dt = {}", config.dt)).into());
        }
        if config.down_sample == 0 {
            return Err(FlightEnvError::InvalidConfig("down_sample = 0".to_string()).into());
        }
        let mut fdm = F::build(&config.fdm)?;
        if config.render_mode == RenderMode::FlightGear {
            fdm.set_output_directive(&config.flightgear_output)?;
        }
        fdm.load_model(&config.model)
            .map_err(|e| FlightEnvError::ModelLoad(format!("{}: {}", config.model, e)))?;
        fdm.set_dt(config.dt);

        let mut env = Self {
            fdm,
            dt: config.dt,
            down_sample: config.down_sample,
            initial_conditions: config.initial_conditions.clone(),
            fuel_contents_lbs: config.fuel_contents_lbs,
            state: FlightState::default(),
            step_cnt: 0,
            tacview: TacviewRecorder::new(config.tacview.clone(), &config.model),
            closed: false,
        };

        env.set_initial_conditions();
        if !env.fdm.run_ic() {
            return Err(FlightEnvError::InitialConditions.into());
        }
        env.state = FlightState::read(&env.fdm);

        Ok(env)
    }

    fn step(&mut self, a: &FlightAct) -> Result<(Step<Self>, Record)> {
        trace!("FlightEnv::step({:?})", a);
        if self.closed {
            return Err(FlightEnvError::Closed.into());
        }

        self.set_controls(a);
        for sub_step in 0..self.down_sample {
            self.hold_overrides();
            if !self.fdm.run() {
                return Err(FlightEnvError::Integration {
                    step: self.step_cnt,
                    sub_step,
                }
                .into());
            }
        }
        self.state = FlightState::read(&self.fdm);

        let altitude_m = self.state.altitude_m();
        let done = altitude_m < MIN_ALTITUDE_M;
        let reward = if done { TERMINATION_REWARD } else { 0.0 };
        self.step_cnt += 1;

        let obs = self.observation();
        let mut record = Record::empty();
        record.insert("altitude_m", RecordValue::Scalar(altitude_m as f32));
        record.insert("sim_time", RecordValue::Scalar(self.sim_time() as f32));
        record.insert("step_cnt", RecordValue::Scalar(self.step_cnt as f32));
        record.insert("obs", RecordValue::Array1((&obs).into()));

        let step = Step::new(obs, *a, reward, done, false, FlightInfo {});
        Ok((step, record))
    }

    /// Solves the initial conditions again and starts a new episode.
    ///
    /// A solver failure is logged and otherwise ignored. The goal is not regenerated.
    /// Fails with [`FlightEnvError::Closed`] after [`Env::close`].
    fn reset(&mut self, seed: Option<i64>) -> Result<FlightObs> {
        trace!("FlightEnv::reset(seed = {:?})", seed);
        if self.closed {
            return Err(FlightEnvError::Closed.into());
        }
        self.set_initial_conditions();
        if !self.fdm.run_ic() {
            warn!("Initial-condition solver failed on reset, continuing");
        }
        self.step_cnt = 0;
        self.state = FlightState::read(&self.fdm);
        Ok(self.observation())
    }

    /// Renders the current state.
    ///
    /// * `"txt"` appends a frame to the Tacview recording, creating it on the first call.
    /// * `"flightgear"` sleeps for the duration of one step.
    ///
    /// Any other mode fails with [`FlightEnvError::UnsupportedRenderMode`], and every mode
    /// fails with [`FlightEnvError::Closed`] after [`Env::close`].
    fn render(&mut self, mode: &str) -> Result<()> {
        let mode: RenderMode = mode.parse()?;
        self.render_as(mode)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
