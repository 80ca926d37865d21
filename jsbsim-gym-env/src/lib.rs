#![warn(missing_docs)]
//! A flight environment over a JSBSim-style flight dynamics model.
//!
//! [`FlightEnv`] drives an engine implementing [`Fdm`] through its property tree:
//! every step writes the flight controls, integrates `down_sample` times and reads a
//! 12-element state vector. [`ShapedFlightEnv`] adds a bonus for level flight on the
//! initial heading, and [`registry()`] registers it as `"JSBSim-v1"` with a 1200-step
//! limit.
//!
//! No native engine binding ships with this crate. [`MockFdm`] is a kinematic stand-in
//! answering the same properties.
//!
//! ```no_run
//! use anyhow::Result;
//! use jsbsim_gym_core::Env as _;
//! use jsbsim_gym_env::{registry, FlightAct, FlightEnvConfig, MockFdm, JSBSIM_V1};
//!
//! fn main() -> Result<()> {
//!     let config = FlightEnvConfig::default();
//!     let mut env = registry::<MockFdm>()?.make(JSBSIM_V1, &config, 0)?;
//!     env.reset(None)?;
//!
//!     let act = FlightAct::new(0.05, -0.2, 0.0, 0.5);
//!     for _ in 0..1200 {
//!         let (step, _) = env.step(&act)?;
//!         env.render("txt")?;
//!         if step.is_done() {
//!             break;
//!         }
//!     }
//!     env.close();
//!     Ok(())
//! }
//! ```
pub mod acmi;
mod act;
mod config;
mod env;
mod error;
pub mod fdm;
mod mock;
mod obs;
mod policy;
mod registry;
mod render;
mod shaping;
pub mod state;

pub use acmi::{TacviewConfig, TacviewRecorder};
pub use act::FlightAct;
pub use config::{FlightEnvConfig, InitialConditions};
pub use env::{FlightEnv, FlightInfo, MIN_ALTITUDE_M, TERMINATION_REWARD};
pub use error::FlightEnvError;
pub use fdm::{property, Fdm};
pub use mock::{MockFdm, MockFdmConfig};
pub use obs::{FlightObs, GOAL_DIM, OBS_DIM};
pub use policy::{ConstantPolicy, RandomPolicy};
pub use registry::{registry, JSBSIM_V1, JSBSIM_V1_MAX_EPISODE_STEPS};
pub use render::RenderMode;
pub use shaping::{
    normalize_angle, HeadingRollShaping, ShapedFlightEnv, HEADING_ERROR_SCALE,
    ROLL_ERROR_SCALE,
};
pub use state::{FlightState, StateVar};
