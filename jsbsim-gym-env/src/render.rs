//! Render modes.
use crate::FlightEnvError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// How [`FlightEnv::render`](crate::FlightEnv) presents the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Appends a frame to a Tacview ACMI text recording.
    #[serde(rename = "txt")]
    Txt,

    /// Paces wall-clock time to the step duration for an external live viewer.
    #[serde(rename = "flightgear")]
    FlightGear,
}

impl Default for RenderMode {
    fn default() -> Self {
        RenderMode::Txt
    }
}

impl RenderMode {
    /// Name of the mode, as accepted by [`RenderMode::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Txt => "txt",
            RenderMode::FlightGear => "flightgear",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = FlightEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "txt" => Ok(RenderMode::Txt),
            "flightgear" => Ok(RenderMode::FlightGear),
            _ => Err(FlightEnvError::UnsupportedRenderMode(s.to_string())),
        }
    }
}
