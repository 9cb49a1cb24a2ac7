use std::fmt;

use log::{info, warn};

use super::guess::InitialGuess;
use super::reconstruct::{reconstruct, Trajectory};
use super::residual::ClimbNlp;
use super::{BoundaryConditions, ClimbConfig, ClimbProblem, TrajectorySample};
use crate::error::ClimbError;
use crate::optim::{minimize, SolveReport, SolveStatus, Verbosity};
use crate::physics::{AeroModel, Atmosphere, ThrustModel};

// ---------------------------------------------------------------------------
// Post-solve diagnostics
// ---------------------------------------------------------------------------

/// Non-fatal findings about a solved trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveWarning {
    /// The thrust or aero model was queried outside its fitted data.
    Extrapolation { index: usize, mach: f64, altitude: f64 },
    /// |alpha| beyond the configured small-angle limit.
    LargeAngleOfAttack { index: usize, alpha: f64 },
}

impl fmt::Display for SolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveWarning::Extrapolation { index, mach, altitude } => write!(
                f,
                "sample {}: Mach {:.3} at {:.0} m is outside the fitted model data",
                index, mach, altitude
            ),
            SolveWarning::LargeAngleOfAttack { index, alpha } => write!(
                f,
                "sample {}: angle of attack {:.2} deg exceeds the small-angle limit",
                index,
                alpha.to_degrees()
            ),
        }
    }
}

fn diagnose<A: Atmosphere, T: ThrustModel, D: AeroModel>(
    problem: &ClimbProblem<A, T, D>,
    trajectory: &Trajectory,
    alpha_limit: f64,
) -> Vec<SolveWarning> {
    let mut warnings = vec![];
    for i in 0..trajectory.len() {
        let (mach, altitude) = (trajectory.mach[i], trajectory.altitude[i]);
        if !problem.thrust().in_envelope(mach, altitude) || !problem.aero().in_envelope(mach) {
            warnings.push(SolveWarning::Extrapolation { index: i, mach, altitude });
        }
    }
    for (i, &alpha) in trajectory.angle_of_attack.iter().enumerate() {
        if alpha.abs() > alpha_limit {
            warnings.push(SolveWarning::LargeAngleOfAttack { index: i, alpha });
        }
    }
    for w in &warnings {
        warn!("{}", w);
    }
    warnings
}

// ---------------------------------------------------------------------------
// Solution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClimbSolution {
    pub trajectory: Trajectory,
    pub boundary: BoundaryConditions,
    /// Scaled `[tf, v_1..v_{N-2}, gamma_1..gamma_{N-2}]` at the final iterate.
    pub parameters: Vec<f64>,
    pub report: SolveReport,
    pub warnings: Vec<SolveWarning>,
}

/// Headline numbers of a climb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimbSummary {
    pub minimum_time: f64,  // s
    pub peak_mach: f64,
    pub peak_altitude: f64, // m
    pub fuel_burned: f64,   // kg
    pub range: f64,         // m
}

impl ClimbSolution {
    pub fn converged(&self) -> bool {
        self.report.converged()
    }

    pub fn status(&self) -> SolveStatus {
        self.report.status
    }

    pub fn final_time(&self) -> f64 {
        self.trajectory.time.last().copied().unwrap_or(0.0)
    }

    pub fn samples(&self) -> Vec<TrajectorySample> {
        self.trajectory.samples()
    }

    /// Turn a non-converged result into an error.
    pub fn require_converged(self) -> Result<Self, ClimbError> {
        if self.converged() {
            Ok(self)
        } else {
            Err(ClimbError::NotConverged {
                status: self.report.status,
                iterations: self.report.iterations,
                final_time: self.final_time(),
            })
        }
    }

    pub fn summary(&self) -> ClimbSummary {
        let t = &self.trajectory;
        let peak = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        ClimbSummary {
            minimum_time: self.final_time(),
            peak_mach: peak(&t.mach),
            peak_altitude: peak(&t.altitude),
            fuel_burned: match (t.mass.first(), t.mass.last()) {
                (Some(m0), Some(mf)) => m0 - mf,
                _ => 0.0,
            },
            range: t.distance.last().copied().unwrap_or(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Minimum-time climb from `config.initial_altitude` to `final_altitude`.
///
/// Configuration and guess errors are returned before any solver work.
/// A solver that stops without converging still yields `Ok`, carrying the
/// last iterate; see [`ClimbSolution::require_converged`].
pub fn solve_min_time_climb<A: Atmosphere, T: ThrustModel, D: AeroModel>(
    problem: &ClimbProblem<A, T, D>,
    guess: &InitialGuess,
    final_altitude: f64,
    config: &ClimbConfig,
) -> Result<ClimbSolution, ClimbError> {
    config.validate()?;
    if !final_altitude.is_finite() {
        return Err(ClimbError::InvalidConfig("final altitude must be finite".into()));
    }

    let start = guess.discretize(config.initial_altitude, final_altitude, config.mesh_size)?;
    let nlp = ClimbNlp::new(problem, start.boundary, start.mesh_size)?;
    let x0 = problem.units().to_scaled(&start.parameters);

    if config.verbosity != Verbosity::Silent {
        info!(
            "{}: climb {:.0} m -> {:.0} m, {:.1} -> {:.1} m/s, N = {}, tf guess {:.1} s",
            problem.aircraft().name,
            start.boundary.initial_altitude,
            start.boundary.final_altitude,
            start.boundary.initial_velocity,
            start.boundary.final_velocity,
            start.mesh_size,
            start.parameters[0]
        );
    }

    let report = minimize(&nlp, &x0, &config.solver_options());
    if !report.converged() {
        warn!(
            "climb solve stopped: {} after {} iterations (violation {:.3e})",
            report.status, report.iterations, report.constraint_violation
        );
    }

    let trajectory = reconstruct(problem, &start.boundary, &report.x)?;
    let warnings = diagnose(problem, &trajectory, config.alpha_warning);

    Ok(ClimbSolution {
        trajectory,
        boundary: start.boundary,
        parameters: report.x.clone(),
        report,
        warnings,
    })
}
