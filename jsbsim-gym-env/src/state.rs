//! State vector read from the engine.
use crate::Fdm;
use std::ops::{Index, IndexMut};

/// Number of elements of the state vector.
pub const STATE_DIM: usize = 12;

/// Elements of the state vector, in the order they appear in observations.
///
/// The discriminant is the position in the vector; [`StateVar::property`] is the
/// engine property it is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateVar {
    /// Geocentric longitude in degrees.
    Longitude = 0,
    /// Geodetic latitude in degrees.
    Latitude = 1,
    /// Altitude above sea level in feet.
    AltitudeFt = 2,
    /// Mach number.
    Mach = 3,
    /// Angle of attack in radians.
    Alpha = 4,
    /// Sideslip angle in radians.
    Beta = 5,
    /// Body roll rate in rad/s.
    P = 6,
    /// Body pitch rate in rad/s.
    Q = 7,
    /// Body yaw rate in rad/s.
    R = 8,
    /// Roll angle in radians.
    Roll = 9,
    /// Pitch angle in radians.
    Pitch = 10,
    /// True heading in radians.
    Heading = 11,
}

impl StateVar {
    /// All elements in vector order.
    pub const ALL: [StateVar; STATE_DIM] = [
        StateVar::Longitude,
        StateVar::Latitude,
        StateVar::AltitudeFt,
        StateVar::Mach,
        StateVar::Alpha,
        StateVar::Beta,
        StateVar::P,
        StateVar::Q,
        StateVar::R,
        StateVar::Roll,
        StateVar::Pitch,
        StateVar::Heading,
    ];

    /// Position in the state vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Engine property holding this element.
    pub fn property(self) -> &'static str {
        match self {
            StateVar::Longitude => "position/long-gc-deg",
            StateVar::Latitude => "position/lat-geod-deg",
            StateVar::AltitudeFt => "position/h-sl-ft",
            StateVar::Mach => "velocities/mach",
            StateVar::Alpha => "aero/alpha-rad",
            StateVar::Beta => "aero/beta-rad",
            StateVar::P => "velocities/p-rad_sec",
            StateVar::Q => "velocities/q-rad_sec",
            StateVar::R => "velocities/r-rad_sec",
            StateVar::Roll => "attitude/roll-rad",
            StateVar::Pitch => "attitude/pitch-rad",
            StateVar::Heading => "attitude/heading-true-rad",
        }
    }
}

/// Feet to meters.
pub const FT_TO_M: f64 = 0.3048;

/// Snapshot of the state properties.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlightState([f64; STATE_DIM]);

impl FlightState {
    /// Reads every element from the engine.
    pub fn read<F: Fdm>(fdm: &F) -> Self {
        let mut state = Self::default();
        for var in StateVar::ALL {
            state[var] = fdm.get_property_value(var.property());
        }
        state
    }

    /// Altitude above sea level in meters.
    pub fn altitude_m(&self) -> f64 {
        self[StateVar::AltitudeFt] * FT_TO_M
    }

    /// Elements in vector order.
    pub fn as_array(&self) -> &[f64; STATE_DIM] {
        &self.0
    }
}

impl From<[f64; STATE_DIM]> for FlightState {
    fn from(values: [f64; STATE_DIM]) -> Self {
        Self(values)
    }
}

impl Index<StateVar> for FlightState {
    type Output = f64;

    fn index(&self, var: StateVar) -> &f64 {
        &self.0[var.index()]
    }
}

impl IndexMut<StateVar> for FlightState {
    fn index_mut(&mut self, var: StateVar) -> &mut f64 {
        &mut self.0[var.index()]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_schema_order_matches_discriminants() {
        for (i, var) in StateVar::ALL.iter().enumerate() {
            assert_eq!(var.index(), i);
        }
        assert_eq!(StateVar::Roll.property(), "attitude/roll-rad");
        assert_eq!(StateVar::Heading.property(), "attitude/heading-true-rad");
    }

    #[test]
    fn test_altitude_conversion() {
        let mut state = FlightState::default();
        state[StateVar::AltitudeFt] = 1000.0;
        assert!((state.altitude_m() - 304.8).abs() < 1e-9);
    }
}
