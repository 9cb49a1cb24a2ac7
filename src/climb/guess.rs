use super::solve::ClimbSolution;
use super::BoundaryConditions;
use crate::error::ClimbError;
use crate::numeric::linspace;

// ---------------------------------------------------------------------------
// Initial guess
// ---------------------------------------------------------------------------

/// Shape of the starting trajectory.
#[derive(Debug, Clone, PartialEq)]
pub enum GuessProfile {
    /// Velocity varies linearly between the endpoints, level flight.
    Boundary { initial_velocity: f64, final_velocity: f64 },
    /// Explicit histories on the mesh; their length sets N. The path-angle
    /// endpoints are ignored because the boundary pins them to zero.
    History { velocity: Vec<f64>, path_angle: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitialGuess {
    /// Final time, s. Defaults to the climb height over the mean endpoint speed.
    pub time: Option<f64>,
    pub profile: GuessProfile,
}

impl InitialGuess {
    pub fn boundary(initial_velocity: f64, final_velocity: f64) -> Self {
        Self {
            time: None,
            profile: GuessProfile::Boundary { initial_velocity, final_velocity },
        }
    }

    pub fn history(velocity: Vec<f64>, path_angle: Vec<f64>) -> Self {
        Self {
            time: None,
            profile: GuessProfile::History { velocity, path_angle },
        }
    }

    pub fn with_time(mut self, final_time: f64) -> Self {
        self.time = Some(final_time);
        self
    }

    /// Warm start from a previous solution on the same mesh.
    pub fn from_solution(solution: &ClimbSolution) -> Self {
        let t = &solution.trajectory;
        Self::history(t.velocity.clone(), t.path_angle.clone()).with_time(solution.final_time())
    }

    /// Resolve the guess into boundary conditions, mesh size and the
    /// physical parameter vector `[tf, v_1..v_{N-2}, gamma_1..gamma_{N-2}]`.
    pub fn discretize(
        &self,
        initial_altitude: f64,
        final_altitude: f64,
        mesh_size: usize,
    ) -> Result<Discretization, ClimbError> {
        let (velocity, path_angle) = match &self.profile {
            GuessProfile::Boundary { initial_velocity, final_velocity } => {
                if mesh_size < 2 {
                    return Err(ClimbError::InvalidInitialGuess(format!(
                        "mesh size must be at least 2, got {}",
                        mesh_size
                    )));
                }
                (
                    linspace(*initial_velocity, *final_velocity, mesh_size),
                    vec![0.0; mesh_size],
                )
            }
            GuessProfile::History { velocity, path_angle } => {
                if velocity.len() != path_angle.len() {
                    return Err(ClimbError::InvalidInitialGuess(format!(
                        "velocity has {} samples but path angle has {}",
                        velocity.len(),
                        path_angle.len()
                    )));
                }
                if velocity.len() < 2 {
                    return Err(ClimbError::InvalidInitialGuess(format!(
                        "history needs at least 2 samples, got {}",
                        velocity.len()
                    )));
                }
                (velocity.clone(), path_angle.clone())
            }
        };

        if velocity.iter().chain(&path_angle).any(|v| !v.is_finite()) {
            return Err(ClimbError::InvalidInitialGuess("non-finite guess values".into()));
        }

        let n = velocity.len();
        let boundary = BoundaryConditions {
            initial_altitude,
            final_altitude,
            initial_velocity: velocity[0],
            final_velocity: velocity[n - 1],
            initial_path_angle: 0.0,
            final_path_angle: 0.0,
        };

        let final_time = match self.time {
            Some(tf) => tf,
            None => {
                2.0 * (final_altitude - initial_altitude)
                    / (boundary.initial_velocity + boundary.final_velocity)
            }
        };
        if !(final_time > 0.0 && final_time.is_finite()) {
            return Err(ClimbError::InvalidInitialGuess(format!(
                "final time guess must be positive, got {}",
                final_time
            )));
        }

        let mut parameters = Vec::with_capacity(2 * n - 3);
        parameters.push(final_time);
        parameters.extend_from_slice(&velocity[1..n - 1]);
        parameters.extend_from_slice(&path_angle[1..n - 1]);

        Ok(Discretization { boundary, mesh_size: n, parameters })
    }
}

/// A guess laid out on the mesh, in physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct Discretization {
    pub boundary: BoundaryConditions,
    pub mesh_size: usize,
    pub parameters: Vec<f64>,
}
