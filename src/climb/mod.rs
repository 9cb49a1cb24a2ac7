pub mod energy;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod guess;
pub mod reconstruct;
pub mod residual;
pub mod solve;

use serde::Deserialize;

pub use energy::{energy_rate, energy_rate_grid, specific_energy};
pub use guess::{GuessProfile, InitialGuess};
pub use reconstruct::{reconstruct, Trajectory};
pub use residual::{angle_of_attack, ClimbNlp, FlightCondition};
pub use solve::{solve_min_time_climb, ClimbSolution, ClimbSummary, SolveWarning};

use crate::error::{ClimbError, FitError};
use crate::optim::{SolverOptions, Verbosity};
use crate::physics::{AeroModel, AeroTable, Atmosphere, EngineDeck, StandardAtmosphere, ThrustModel, DEGREE};
use crate::vehicle::{presets, Aircraft, ScalingUnits};

// ---------------------------------------------------------------------------
// Problem definition
// ---------------------------------------------------------------------------

/// Vehicle plus the three injected models, with scaling units derived once.
#[derive(Debug, Clone)]
pub struct ClimbProblem<A = StandardAtmosphere, T = EngineDeck, D = AeroTable> {
    aircraft: Aircraft,
    atmosphere: A,
    thrust: T,
    aero: D,
    units: ScalingUnits,
}

impl<A: Atmosphere, T: ThrustModel, D: AeroModel> ClimbProblem<A, T, D> {
    pub fn new(aircraft: Aircraft, atmosphere: A, thrust: T, aero: D) -> Self {
        let units = ScalingUnits::new(&aircraft, atmosphere.density(0.0));
        Self { aircraft, atmosphere, thrust, aero, units }
    }

    pub fn aircraft(&self) -> &Aircraft {
        &self.aircraft
    }

    pub fn atmosphere(&self) -> &A {
        &self.atmosphere
    }

    pub fn thrust(&self) -> &T {
        &self.thrust
    }

    pub fn aero(&self) -> &D {
        &self.aero
    }

    pub fn units(&self) -> &ScalingUnits {
        &self.units
    }
}

impl ClimbProblem {
    /// F4 with the standard atmosphere, fitted engine deck and aero tables.
    pub fn f4() -> Result<Self, FitError> {
        Ok(Self::new(presets::f4(), StandardAtmosphere, EngineDeck::f4()?, AeroTable::f4()?))
    }
}

/// Endpoint states. Path angles are zero for a climb between level-flight
/// conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryConditions {
    pub initial_altitude: f64,   // m
    pub final_altitude: f64,     // m
    pub initial_velocity: f64,   // m/s
    pub final_velocity: f64,     // m/s
    pub initial_path_angle: f64, // rad
    pub final_path_angle: f64,   // rad
}

/// One point of a reconstructed trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    pub time: f64,            // s
    pub altitude: f64,        // m
    pub velocity: f64,        // m/s
    pub path_angle: f64,      // rad
    pub angle_of_attack: f64, // rad
    pub distance: f64,        // m, horizontal
    pub mass: f64,            // kg
}

// ---------------------------------------------------------------------------
// Solve configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClimbConfig {
    pub initial_altitude: f64, // m
    /// Number of mesh points N, ignored when the guess carries a history.
    pub mesh_size: usize,
    pub verbosity: Verbosity,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// |alpha| above which the small-angle model is flagged, rad.
    pub alpha_warning: f64,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            initial_altitude: 0.0,
            mesh_size: 128,
            verbosity: Verbosity::Summary,
            max_iterations: 200,
            tolerance: 1e-6,
            alpha_warning: 15.0 * DEGREE,
        }
    }
}

impl ClimbConfig {
    /// Parse from TOML; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ClimbError> {
        let config: Self = toml::from_str(s).map_err(|e| ClimbError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClimbError> {
        if !self.initial_altitude.is_finite() {
            return Err(ClimbError::InvalidConfig("initial altitude must be finite".into()));
        }
        if self.mesh_size < 2 {
            return Err(ClimbError::InvalidConfig(format!(
                "mesh size must be at least 2, got {}",
                self.mesh_size
            )));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(ClimbError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(ClimbError::InvalidConfig("max_iterations must be at least 1".into()));
        }
        if !(self.alpha_warning > 0.0) {
            return Err(ClimbError::InvalidConfig("alpha_warning must be positive".into()));
        }
        Ok(())
    }

    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            verbosity: self.verbosity,
            ..Default::default()
        }
    }
}
