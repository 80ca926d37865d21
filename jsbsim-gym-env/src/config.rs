//! Configuration of [`FlightEnv`](crate::FlightEnv).
use crate::{acmi::TacviewConfig, RenderMode};
use anyhow::Result;
use jsbsim_gym_core::util::{load_yaml, save_yaml};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initial conditions written to the `ic/*` properties before the solver runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Geocentric longitude in degrees.
    pub long_gc_deg: f64,
    /// Geodetic latitude in degrees.
    pub lat_geod_deg: f64,
    /// Altitude above sea level in feet.
    pub h_sl_ft: f64,
    /// True heading in degrees.
    pub psi_true_deg: f64,
    /// Body x velocity in ft/s.
    pub u_fps: f64,
    /// Body y velocity in ft/s.
    pub v_fps: f64,
    /// Body z velocity in ft/s.
    pub w_fps: f64,
    /// Roll rate in rad/s.
    pub p_rad_sec: f64,
    /// Pitch rate in rad/s.
    pub q_rad_sec: f64,
    /// Yaw rate in rad/s.
    pub r_rad_sec: f64,
    /// Rate of climb in ft/min.
    pub roc_fpm: f64,
    /// Terrain elevation in feet.
    pub terrain_elevation_ft: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            long_gc_deg: 120.0,
            lat_geod_deg: 60.0,
            h_sl_ft: 20000.0,
            psi_true_deg: 0.0,
            u_fps: 800.0,
            v_fps: 0.0,
            w_fps: 0.0,
            p_rad_sec: 0.0,
            q_rad_sec: 0.0,
            r_rad_sec: 0.0,
            roc_fpm: 0.0,
            terrain_elevation_ft: 0.0,
        }
    }
}

/// Configuration of [`FlightEnv`](crate::FlightEnv).
///
/// `C` is the configuration of the engine, [`Fdm::Config`](crate::Fdm::Config).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlightEnvConfig<C> {
    /// Integration time step in seconds.
    pub dt: f64,

    /// Number of integration steps per environment step.
    pub down_sample: usize,

    /// Aircraft model loaded into the engine.
    pub model: String,

    /// Initial conditions applied on build and on every reset.
    pub initial_conditions: InitialConditions,

    /// Fuel content in lbs pinned in both tanks before every integration step.
    pub fuel_contents_lbs: f64,

    /// Render mode used by callers that render without choosing a mode.
    pub render_mode: RenderMode,

    /// Output directive set on the engine when rendering for FlightGear.
    pub flightgear_output: String,

    /// Tacview recording.
    pub tacview: TacviewConfig,

    /// Engine configuration.
    pub fdm: C,
}

impl<C: Default> Default for FlightEnvConfig<C> {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            down_sample: 3,
            model: "f16".to_string(),
            initial_conditions: InitialConditions::default(),
            fuel_contents_lbs: 1000.0,
            render_mode: RenderMode::default(),
            flightgear_output: "data_output/flightgear1.xml".to_string(),
            tacview: TacviewConfig::default(),
            fdm: C::default(),
        }
    }
}

impl<C> FlightEnvConfig<C>
where
    C: Serialize + for<'de> Deserialize<'de>,
{
    /// Sets the integration time step in seconds.
    pub fn dt(mut self, v: f64) -> Self {
        self.dt = v;
        self
    }

    /// Sets the number of integration steps per environment step.
    pub fn down_sample(mut self, v: usize) -> Self {
        self.down_sample = v;
        self
    }

    /// Sets the aircraft model.
    pub fn model(mut self, v: impl Into<String>) -> Self {
        self.model = v.into();
        self
    }

    /// Sets the initial conditions.
    pub fn initial_conditions(mut self, v: InitialConditions) -> Self {
        self.initial_conditions = v;
        self
    }

    /// Sets the initial altitude above sea level in feet.
    pub fn initial_altitude_ft(mut self, v: f64) -> Self {
        self.initial_conditions.h_sl_ft = v;
        self
    }

    /// Sets the render mode.
    pub fn render_mode(mut self, v: RenderMode) -> Self {
        self.render_mode = v;
        self
    }

    /// Sets the Tacview recording configuration.
    pub fn tacview(mut self, v: TacviewConfig) -> Self {
        self.tacview = v;
        self
    }

    /// Sets the engine configuration.
    pub fn fdm(mut self, v: C) -> Self {
        self.fdm = v;
        self
    }

    /// Duration of one environment step in seconds.
    pub fn step_duration(&self) -> f64 {
        self.down_sample as f64 * self.dt
    }

    /// Constructs [`FlightEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path)
    }

    /// Saves [`FlightEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_yaml(self, path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MockFdmConfig;
    use tempdir::TempDir;

    #[test]
    fn test_serde_flight_env_config() -> Result<()> {
        let config = FlightEnvConfig::<MockFdmConfig>::default()
            .down_sample(12)
            .dt(1.0 / 720.0)
            .initial_altitude_ft(15000.0)
            .render_mode(RenderMode::FlightGear);

        let dir = TempDir::new("flight_env_config")?;
        let path = dir.path().join("flight_env_config.yaml");
        config.save(&path)?;
        let config_ = FlightEnvConfig::<MockFdmConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_step_duration() {
        let config = FlightEnvConfig::<MockFdmConfig>::default();
        assert!((config.step_duration() - 0.05).abs() < 1e-12);
    }
}
