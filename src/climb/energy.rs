use nalgebra::DMatrix;

use super::residual::{angle_of_attack, FlightCondition};
use super::ClimbProblem;
use crate::physics::{AeroModel, Atmosphere, ThrustModel};

// ---------------------------------------------------------------------------
// Energy-state approximation
// ---------------------------------------------------------------------------

/// Mechanical energy per unit mass, `v^2 / 2 + g z`, J/kg.
pub fn specific_energy(speed: f64, altitude: f64, gravity: f64) -> f64 {
    0.5 * speed * speed + gravity * altitude
}

/// Rate of change of total energy `d/dt (m v^2 / 2 + m g z) = (T - D) v`
/// in steady level flight at constant `mass`, W.
pub fn energy_rate<A: Atmosphere, T: ThrustModel, D: AeroModel>(
    problem: &ClimbProblem<A, T, D>,
    speed: f64,
    altitude: f64,
    mass: f64,
) -> f64 {
    let aircraft = problem.aircraft();
    let air = problem.atmosphere().properties(altitude);
    let mach = speed / air.sound_speed;
    let thrust = problem.thrust().thrust(mach, altitude);
    let coeffs = problem.aero().coefficients(mach);
    let q = aircraft.dynamic_pressure_force(air.density, speed);

    let alpha = angle_of_attack(
        &FlightCondition {
            mass,
            speed,
            path_angle: 0.0,
            path_angle_rate: 0.0,
            thrust,
            lift_slope: coeffs.lift_slope,
            dynamic_force: q,
        },
        aircraft,
    );
    (thrust - coeffs.drag_coefficient(alpha) * q) * speed
}

/// [`energy_rate`] on the grid `speeds x altitudes`; rows follow `speeds`.
pub fn energy_rate_grid<A: Atmosphere, T: ThrustModel, D: AeroModel>(
    problem: &ClimbProblem<A, T, D>,
    speeds: &[f64],
    altitudes: &[f64],
    mass: f64,
) -> DMatrix<f64> {
    DMatrix::from_fn(speeds.len(), altitudes.len(), |i, j| {
        energy_rate(problem, speeds[i], altitudes[j], mass)
    })
}
