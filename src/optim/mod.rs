pub mod jacobian;
pub mod qp;
pub mod sqp;

use std::fmt;

pub use jacobian::forward_jacobian;
pub use qp::{solve_qp, QpError, QpProblem, QpSolution};
pub use sqp::minimize;

// ---------------------------------------------------------------------------
// Nonlinear program interface
// ---------------------------------------------------------------------------

/// A smooth nonlinear program
///
/// ```text
/// min f(x)   s.t.   c_eq(x) = 0,   c_in(x) >= 0
/// ```
///
/// Residuals must be deterministic: Jacobians are estimated by repeated
/// evaluation around the current iterate.
pub trait NlpProblem {
    /// Number of decision variables.
    fn dimension(&self) -> usize;

    fn objective(&self, x: &[f64]) -> f64;

    /// Equality residuals, driven to zero.
    fn equality(&self, x: &[f64]) -> Vec<f64>;

    /// Inequality residuals, kept non-negative.
    fn inequality(&self, x: &[f64]) -> Vec<f64>;

    /// Objective gradient. Forward differences unless overridden.
    fn objective_gradient(&self, x: &[f64]) -> Vec<f64> {
        let f0 = [self.objective(x)];
        let jac = forward_jacobian(|p| vec![self.objective(p)], x, &f0);
        jac.row(0).iter().copied().collect()
    }
}

// ---------------------------------------------------------------------------
// Solver options and report
// ---------------------------------------------------------------------------

/// How much solver progress reaches the log at `info` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Silent,
    Summary,
    Iterations,
}

#[derive(Debug, Clone)]
pub struct SolverOptions {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub verbosity: Verbosity,
    pub max_qp_iterations: usize,
    pub max_line_search_steps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-6,
            verbosity: Verbosity::Silent,
            max_qp_iterations: 100,
            max_line_search_steps: 20,
        }
    }
}

/// Why the SQP iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Converged,
    IterationLimit,
    /// The QP subproblem could not be factored, even from an identity Hessian.
    QpFailure,
    /// No acceptable step along the search direction after a Hessian reset.
    LineSearchFailure,
    /// Objective or constraints evaluated to NaN or infinity at the start point.
    NonFinite,
}

impl SolveStatus {
    pub fn is_converged(self) -> bool {
        self == SolveStatus::Converged
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Converged => "converged",
            SolveStatus::IterationLimit => "iteration limit reached",
            SolveStatus::QpFailure => "QP subproblem failed",
            SolveStatus::LineSearchFailure => "line search failed",
            SolveStatus::NonFinite => "non-finite residuals",
        };
        f.write_str(s)
    }
}

/// Outcome of [`minimize`]: the best iterate and how the solve ended.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub x: Vec<f64>,
    pub status: SolveStatus,
    pub iterations: usize,
    pub objective: f64,
    /// L1 norm of equality residuals plus inequality shortfall.
    pub constraint_violation: f64,
    /// Constraint evaluations, Jacobian columns included.
    pub evaluations: usize,
}

impl SolveReport {
    pub fn converged(&self) -> bool {
        self.status.is_converged()
    }
}

/// Sum of |c_eq| plus the negative part of c_in.
pub fn constraint_violation(eq: &[f64], ineq: &[f64]) -> f64 {
    eq.iter().map(|c| c.abs()).sum::<f64>() + ineq.iter().map(|c| (-c).max(0.0)).sum::<f64>()
}
