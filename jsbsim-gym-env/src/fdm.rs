//! Interface to the flight dynamics model.
//!
//! The engine is an opaque collaborator. Everything the environment needs from it
//! goes through string-keyed property reads and writes plus a handful of lifecycle
//! calls, mirroring the API of JSBSim's `FGFDMExec`. Property names used by the
//! environment are collected in [`property`].
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// A flight dynamics model driven through its property tree.
///
/// Methods returning `bool` report success the way the engine does; the environment
/// decides which failures are fatal.
pub trait Fdm {
    /// Configuration of the engine itself, e.g. the root directory of aircraft data.
    type Config: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned;

    /// Builds an engine instance.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Sets the output directive used for external live visualization.
    ///
    /// Must be called before [`Fdm::load_model`].
    fn set_output_directive(&mut self, _path: &str) -> Result<()> {
        Ok(())
    }

    /// Loads an aircraft model by name, e.g. `"f16"`.
    fn load_model(&mut self, model: &str) -> Result<()>;

    /// Sets the integration time step in seconds.
    fn set_dt(&mut self, dt: f64);

    /// Reads a property.
    fn get_property_value(&self, name: &str) -> f64;

    /// Writes a property.
    fn set_property_value(&mut self, name: &str, value: f64);

    /// Runs the initial-condition solver on the `ic/*` properties.
    fn run_ic(&mut self) -> bool;

    /// Advances the model by one integration step.
    fn run(&mut self) -> bool;

    /// Simulation time in seconds.
    fn get_sim_time(&self) -> f64;

    /// Number of engines of the loaded model.
    fn num_engines(&self) -> usize;

    /// Starts engine `ix` in a running state.
    fn init_running(&mut self, ix: usize);

    /// Brings the propulsion subsystem to a steady state.
    fn get_steady_state(&mut self) -> bool;
}

/// Property names of the engine's property tree.
pub mod property {
    /// Aileron command, normalized to [-1, 1].
    pub const AILERON_CMD: &str = "fcs/aileron-cmd-norm";
    /// Elevator command, normalized to [-1, 1].
    pub const ELEVATOR_CMD: &str = "fcs/elevator-cmd-norm";
    /// Rudder command, normalized to [-1, 1].
    pub const RUDDER_CMD: &str = "fcs/rudder-cmd-norm";
    /// Throttle command, normalized to [0, 1].
    pub const THROTTLE_CMD: &str = "fcs/throttle-cmd-norm";

    /// Fuel content of the first tank.
    pub const TANK0_CONTENTS: &str = "propulsion/tank/contents-lbs";
    /// Fuel content of the second tank.
    pub const TANK1_CONTENTS: &str = "propulsion/tank[1]/contents-lbs";
    /// Landing gear command.
    pub const GEAR_CMD: &str = "gear/gear-cmd-norm";
    /// Landing gear position.
    pub const GEAR_POS: &str = "gear/gear-pos-norm";
    /// Starts all engines when set to -1.
    pub const SET_RUNNING: &str = "propulsion/set-running";

    /// Initial geocentric longitude in degrees.
    pub const IC_LONG_GC_DEG: &str = "ic/long-gc-deg";
    /// Initial geodetic latitude in degrees.
    pub const IC_LAT_GEOD_DEG: &str = "ic/lat-geod-deg";
    /// Initial altitude above sea level in feet.
    pub const IC_H_SL_FT: &str = "ic/h-sl-ft";
    /// Initial true heading in degrees.
    pub const IC_PSI_TRUE_DEG: &str = "ic/psi-true-deg";
    /// Initial body x velocity in ft/s.
    pub const IC_U_FPS: &str = "ic/u-fps";
    /// Initial body y velocity in ft/s.
    pub const IC_V_FPS: &str = "ic/v-fps";
    /// Initial body z velocity in ft/s.
    pub const IC_W_FPS: &str = "ic/w-fps";
    /// Initial roll rate.
    pub const IC_P_RAD_SEC: &str = "ic/p-rad_sec";
    /// Initial pitch rate.
    pub const IC_Q_RAD_SEC: &str = "ic/q-rad_sec";
    /// Initial yaw rate.
    pub const IC_R_RAD_SEC: &str = "ic/r-rad_sec";
    /// Initial rate of climb in ft/min.
    pub const IC_ROC_FPM: &str = "ic/roc-fpm";
    /// Terrain elevation in feet.
    pub const IC_TERRAIN_ELEVATION_FT: &str = "ic/terrain-elevation-ft";
}
