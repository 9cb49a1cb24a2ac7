use super::residual::{angle_of_attack, FlightCondition};
use super::{BoundaryConditions, ClimbProblem, TrajectorySample};
use crate::error::ClimbError;
use crate::numeric::{cumulative_trapezoid_x, gradient, linspace};
use crate::physics::{AeroModel, Atmosphere, ThrustModel};

// ---------------------------------------------------------------------------
// Physical trajectory from a parameter vector
// ---------------------------------------------------------------------------

/// Node histories of a climb, all of length N.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub time: Vec<f64>,            // s
    pub altitude: Vec<f64>,        // m
    pub velocity: Vec<f64>,        // m/s
    pub path_angle: Vec<f64>,      // rad
    pub angle_of_attack: Vec<f64>, // rad
    pub distance: Vec<f64>,        // m
    pub mass: Vec<f64>,            // kg
    pub mach: Vec<f64>,
    pub thrust: Vec<f64>, // N
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn sample(&self, i: usize) -> Option<TrajectorySample> {
        if i >= self.len() {
            return None;
        }
        Some(TrajectorySample {
            time: self.time[i],
            altitude: self.altitude[i],
            velocity: self.velocity[i],
            path_angle: self.path_angle[i],
            angle_of_attack: self.angle_of_attack[i],
            distance: self.distance[i],
            mass: self.mass[i],
        })
    }

    pub fn samples(&self) -> Vec<TrajectorySample> {
        (0..self.len()).filter_map(|i| self.sample(i)).collect()
    }
}

/// Rebuild every physical quantity on the mesh from the scaled parameter
/// vector. Mesh points are `linspace(0, tf, N)`; integrals use the
/// trapezoid rule and the path-angle rate second-order differences.
///
/// The vector must have the odd length `2N - 3` of some mesh with `N >= 2`.
pub fn reconstruct<A: Atmosphere, T: ThrustModel, D: AeroModel>(
    problem: &ClimbProblem<A, T, D>,
    boundary: &BoundaryConditions,
    parameters: &[f64],
) -> Result<Trajectory, ClimbError> {
    if parameters.len() % 2 == 0 {
        return Err(ClimbError::InvalidConfig(format!(
            "parameter vector of length {} does not match any mesh",
            parameters.len()
        )));
    }

    let units = problem.units();
    let aircraft = problem.aircraft();
    let n = (parameters.len() + 3) / 2;
    let interior = n - 2;

    let time = linspace(0.0, parameters[0] * units.time, n);

    let mut velocity = Vec::with_capacity(n);
    velocity.push(boundary.initial_velocity);
    velocity.extend(parameters[1..1 + interior].iter().map(|v| v * units.velocity));
    velocity.push(boundary.final_velocity);

    let mut path_angle = Vec::with_capacity(n);
    path_angle.push(boundary.initial_path_angle);
    path_angle.extend_from_slice(&parameters[1 + interior..]);
    path_angle.push(boundary.final_path_angle);

    let climb_rate: Vec<f64> = velocity.iter().zip(&path_angle).map(|(v, g)| v * g.sin()).collect();
    let ground_speed: Vec<f64> = velocity.iter().zip(&path_angle).map(|(v, g)| v * g.cos()).collect();
    let altitude: Vec<f64> = cumulative_trapezoid_x(&climb_rate, &time)
        .into_iter()
        .map(|z| z + boundary.initial_altitude)
        .collect();
    let distance = cumulative_trapezoid_x(&ground_speed, &time);

    let air: Vec<_> = altitude.iter().map(|&z| problem.atmosphere().properties(z)).collect();
    let mach: Vec<f64> = velocity.iter().zip(&air).map(|(v, a)| v / a.sound_speed).collect();
    let thrust: Vec<f64> = mach
        .iter()
        .zip(&altitude)
        .map(|(&m, &z)| problem.thrust().thrust(m, z))
        .collect();

    let fuel_flow: Vec<f64> = thrust.iter().map(|&t| aircraft.fuel_flow(t)).collect();
    let mass: Vec<f64> = cumulative_trapezoid_x(&fuel_flow, &time)
        .into_iter()
        .map(|burned| aircraft.initial_mass - burned)
        .collect();

    let path_angle_rate = gradient(&path_angle, &time);
    let angle: Vec<f64> = (0..n)
        .map(|i| {
            let condition = FlightCondition {
                mass: mass[i],
                speed: velocity[i],
                path_angle: path_angle[i],
                path_angle_rate: path_angle_rate[i],
                thrust: thrust[i],
                lift_slope: problem.aero().coefficients(mach[i]).lift_slope,
                dynamic_force: aircraft.dynamic_pressure_force(air[i].density, velocity[i]),
            };
            angle_of_attack(&condition, aircraft)
        })
        .collect();

    Ok(Trajectory {
        time,
        altitude,
        velocity,
        path_angle,
        angle_of_attack: angle,
        distance,
        mass,
        mach,
        thrust,
    })
}
