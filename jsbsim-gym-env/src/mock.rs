//! A kinematic stand-in for the flight dynamics model.
//!
//! [`MockFdm`] answers the same properties as the real engine so that the environment,
//! its tests and the demo binary run without a native flight dynamics library. It is
//! not an aerodynamic model: control commands map directly onto body rates, and
//! altitude follows the pitch angle plus a sink rate that vanishes at full throttle.
use crate::{fdm::property, state::StateVar, Fdm};
use anyhow::{bail, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    f64::consts::{FRAC_PI_2, PI},
};

const G_FPS2: f64 = 32.174;
const SPEED_OF_SOUND_FPS: f64 = 1116.45;
const FT_PER_DEG_LAT: f64 = 364_000.0;

/// Configuration of [`MockFdm`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MockFdmConfig {
    /// Number of engines reported by the propulsion subsystem.
    pub n_engines: usize,

    /// Sink rate in ft/s at zero throttle.
    pub sink_rate_fps: f64,

    /// Roll rate in rad/s at full aileron.
    pub roll_rate_gain: f64,

    /// Pitch rate in rad/s at full elevator. Negative elevator pitches the nose up.
    pub pitch_rate_gain: f64,

    /// Yaw rate in rad/s at full rudder.
    pub yaw_rate_gain: f64,

    /// The initial-condition solver fails from this call on (0-based), if set.
    pub fail_run_ic_from: Option<usize>,

    /// Integration fails from this step on (0-based), if set.
    pub fail_run_from: Option<usize>,
}

impl Default for MockFdmConfig {
    fn default() -> Self {
        Self {
            n_engines: 1,
            sink_rate_fps: 100.0,
            roll_rate_gain: 1.0,
            pitch_rate_gain: 0.3,
            yaw_rate_gain: 0.2,
            fail_run_ic_from: None,
            fail_run_from: None,
        }
    }
}

/// Kinematic stand-in for the flight dynamics model.
pub struct MockFdm {
    config: MockFdmConfig,
    model: Option<String>,
    output_directive: Option<String>,
    dt: f64,
    sim_time: f64,
    props: HashMap<String, f64>,
    running: Vec<bool>,

    lon: f64,
    lat: f64,
    h_ft: f64,
    u_fps: f64,
    phi: f64,
    theta: f64,
    psi: f64,
    p: f64,
    q: f64,
    r: f64,

    run_count: usize,
    run_ic_count: usize,
}

/// Wraps into (-π, π].
fn wrap_pi(x: f64) -> f64 {
    let y = (x + PI).rem_euclid(2.0 * PI) - PI;
    if y == -PI {
        PI
    } else {
        y
    }
}

impl MockFdm {
    /// Number of successful and failed calls of [`Fdm::run`].
    pub fn run_count(&self) -> usize {
        self.run_count
    }

    /// Number of calls of [`Fdm::run_ic`].
    pub fn run_ic_count(&self) -> usize {
        self.run_ic_count
    }

    /// Loaded model, if any.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Output directive, if any.
    pub fn output_directive(&self) -> Option<&str> {
        self.output_directive.as_deref()
    }

    /// Returns `true` if engine `ix` has been started.
    pub fn is_running(&self, ix: usize) -> bool {
        self.running.get(ix).copied().unwrap_or(false)
    }

    /// Overrides the attitude angles, in radians.
    pub fn set_attitude(&mut self, roll: f64, pitch: f64, heading: f64) {
        self.phi = roll;
        self.theta = pitch;
        self.psi = heading;
    }

    fn prop(&self, name: &str) -> f64 {
        self.props.get(name).copied().unwrap_or(0.0)
    }
}

impl Fdm for MockFdm {
    type Config = MockFdmConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            model: None,
            output_directive: None,
            dt: 1.0 / 120.0,
            sim_time: 0.0,
            props: HashMap::new(),
            running: vec![false; config.n_engines],
            lon: 0.0,
            lat: 0.0,
            h_ft: 0.0,
            u_fps: 0.0,
            phi: 0.0,
            theta: 0.0,
            psi: 0.0,
            p: 0.0,
            q: 0.0,
            r: 0.0,
            run_count: 0,
            run_ic_count: 0,
        })
    }

    fn set_output_directive(&mut self, path: &str) -> Result<()> {
        self.output_directive = Some(path.to_string());
        Ok(())
    }

    fn load_model(&mut self, model: &str) -> Result<()> {
        if model.is_empty() {
            bail!("empty model name");
        }
        debug!("MockFdm: load model {}", model);
        self.model = Some(model.to_string());
        Ok(())
    }

    fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    fn get_property_value(&self, name: &str) -> f64 {
        match name {
            n if n == StateVar::Longitude.property() => self.lon,
            n if n == StateVar::Latitude.property() => self.lat,
            n if n == StateVar::AltitudeFt.property() => self.h_ft,
            n if n == StateVar::Mach.property() => self.u_fps / SPEED_OF_SOUND_FPS,
            n if n == StateVar::Alpha.property() => 0.0,
            n if n == StateVar::Beta.property() => 0.0,
            n if n == StateVar::P.property() => self.p,
            n if n == StateVar::Q.property() => self.q,
            n if n == StateVar::R.property() => self.r,
            n if n == StateVar::Roll.property() => self.phi,
            n if n == StateVar::Pitch.property() => self.theta,
            n if n == StateVar::Heading.property() => self.psi,
            "simulation/sim-time-sec" => self.sim_time,
            _ => self.prop(name),
        }
    }

    fn set_property_value(&mut self, name: &str, value: f64) {
        self.props.insert(name.to_string(), value);
    }

    fn run_ic(&mut self) -> bool {
        let call = self.run_ic_count;
        self.run_ic_count += 1;
        if matches!(self.config.fail_run_ic_from, Some(n) if call >= n) {
            return false;
        }

        self.lon = self.prop(property::IC_LONG_GC_DEG);
        self.lat = self.prop(property::IC_LAT_GEOD_DEG);
        self.h_ft = self.prop(property::IC_H_SL_FT);
        self.psi = self.prop(property::IC_PSI_TRUE_DEG).to_radians().rem_euclid(2.0 * PI);
        self.u_fps = self.prop(property::IC_U_FPS);
        self.p = self.prop(property::IC_P_RAD_SEC);
        self.q = self.prop(property::IC_Q_RAD_SEC);
        self.r = self.prop(property::IC_R_RAD_SEC);
        self.phi = 0.0;
        self.theta = if self.u_fps > 0.0 {
            (self.prop(property::IC_ROC_FPM) / 60.0 / self.u_fps)
                .clamp(-1.0, 1.0)
                .asin()
        } else {
            0.0
        };
        self.sim_time = 0.0;
        true
    }

    fn run(&mut self) -> bool {
        let step = self.run_count;
        self.run_count += 1;
        if matches!(self.config.fail_run_from, Some(n) if step >= n) {
            return false;
        }

        let dt = self.dt;
        let throttle = self.prop(property::THROTTLE_CMD).clamp(0.0, 1.0);
        self.p = self.config.roll_rate_gain * self.prop(property::AILERON_CMD);
        self.q = -self.config.pitch_rate_gain * self.prop(property::ELEVATOR_CMD);
        self.r = self.config.yaw_rate_gain * self.prop(property::RUDDER_CMD);

        self.phi = wrap_pi(self.phi + self.p * dt);
        self.theta = (self.theta + self.q * dt).clamp(-FRAC_PI_2, FRAC_PI_2);
        let turn_rate = if self.u_fps > 0.0 {
            G_FPS2 / self.u_fps * self.phi.tan().clamp(-10.0, 10.0)
        } else {
            0.0
        };
        self.psi = (self.psi + (self.r + turn_rate) * dt).rem_euclid(2.0 * PI);

        let climb_fps =
            self.u_fps * self.theta.sin() - (1.0 - throttle) * self.config.sink_rate_fps;
        let terrain = self.prop(property::IC_TERRAIN_ELEVATION_FT);
        self.h_ft = (self.h_ft + climb_fps * dt).max(terrain);

        let ground_fps = self.u_fps * self.theta.cos();
        self.lat += ground_fps * self.psi.cos() * dt / FT_PER_DEG_LAT;
        let cos_lat = self.lat.to_radians().cos().max(1e-6);
        self.lon += ground_fps * self.psi.sin() * dt / (FT_PER_DEG_LAT * cos_lat);

        self.sim_time += dt;
        true
    }

    fn get_sim_time(&self) -> f64 {
        self.sim_time
    }

    fn num_engines(&self) -> usize {
        self.running.len()
    }

    fn init_running(&mut self, ix: usize) {
        if let Some(running) = self.running.get_mut(ix) {
            *running = true;
        }
    }

    fn get_steady_state(&mut self) -> bool {
        self.running.iter().all(|r| *r)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fdm() -> Result<MockFdm> {
        let mut fdm = MockFdm::build(&MockFdmConfig::default())?;
        fdm.load_model("f16")?;
        fdm.set_dt(0.5);
        fdm.set_property_value(property::IC_H_SL_FT, 1000.0);
        fdm.set_property_value(property::IC_U_FPS, 800.0);
        fdm.set_property_value(property::IC_PSI_TRUE_DEG, 90.0);
        assert!(fdm.run_ic());
        Ok(fdm)
    }

    #[test]
    fn test_run_ic_reads_initial_conditions() -> Result<()> {
        let fdm = fdm()?;
        assert_eq!(fdm.get_property_value("position/h-sl-ft"), 1000.0);
        assert!((fdm.get_property_value("attitude/heading-true-rad") - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(fdm.get_sim_time(), 0.0);
        Ok(())
    }

    #[test]
    fn test_sink_rate_depends_on_throttle() -> Result<()> {
        let mut fdm = fdm()?;
        assert!(fdm.run());
        assert!((fdm.get_property_value("position/h-sl-ft") - 950.0).abs() < 1e-9);

        fdm.set_property_value(property::THROTTLE_CMD, 1.0);
        assert!(fdm.run());
        assert!((fdm.get_property_value("position/h-sl-ft") - 950.0).abs() < 1e-9);
        assert!((fdm.get_sim_time() - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_configured_failures() -> Result<()> {
        let config = MockFdmConfig {
            fail_run_ic_from: Some(1),
            fail_run_from: Some(2),
            ..MockFdmConfig::default()
        };
        let mut fdm = MockFdm::build(&config)?;
        assert!(fdm.run_ic());
        assert!(!fdm.run_ic());
        assert!(fdm.run());
        assert!(fdm.run());
        assert!(!fdm.run());
        assert_eq!(fdm.run_count(), 3);
        Ok(())
    }

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(3.0 * FRAC_PI_2) + FRAC_PI_2).abs() < 1e-12);
        assert_eq!(wrap_pi(PI), PI);
        assert!((wrap_pi(0.25) - 0.25).abs() < 1e-12);
    }
}
