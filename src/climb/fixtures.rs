//! Constant models for hand-checkable climb arithmetic.

use super::{BoundaryConditions, ClimbProblem};
use crate::physics::{AeroCoefficients, AeroModel, Atmo, Atmosphere, ThrustModel};
use crate::vehicle::AircraftBuilder;

pub struct Uniform;

impl Atmosphere for Uniform {
    fn properties(&self, _altitude: f64) -> Atmo {
        Atmo { density: 1.0, pressure: 1.0e5, temperature: 300.0, sound_speed: 300.0 }
    }
}

pub struct FixedThrust(pub f64);

impl ThrustModel for FixedThrust {
    fn thrust_derivative(&self, _mach: f64, _altitude: f64, d_mach: usize, d_alt: usize) -> f64 {
        if d_mach == 0 && d_alt == 0 { self.0 } else { 0.0 }
    }
}

pub struct FixedAero;

impl AeroModel for FixedAero {
    fn coefficients(&self, _mach: f64) -> AeroCoefficients {
        AeroCoefficients { lift_slope: 3.0, zero_lift_drag: 0.02, induced_drag: 0.5 }
    }
}

/// 1000 kg, 10 m^2, no thrust-line offset, c = 1000 s, 2 kN.
pub fn toy() -> ClimbProblem<Uniform, FixedThrust, FixedAero> {
    let aircraft = AircraftBuilder::new("Toy")
        .initial_mass(1000.0)
        .wing_area(10.0)
        .zero_lift_angle(0.0)
        .fuel_time_constant(1000.0)
        .build();
    ClimbProblem::new(aircraft, Uniform, FixedThrust(2000.0), FixedAero)
}

pub fn level(v0: f64, vf: f64, z: f64) -> BoundaryConditions {
    BoundaryConditions {
        initial_altitude: z,
        final_altitude: z,
        initial_velocity: v0,
        final_velocity: vf,
        initial_path_angle: 0.0,
        final_path_angle: 0.0,
    }
}
