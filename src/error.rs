use thiserror::Error;

use crate::optim::SolveStatus;

/// Errors raised while building a lookup model from tabulated data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("sample lengths differ: {x} abscissae vs {y} values")]
    LengthMismatch { x: usize, y: usize },
    #[error("need at least {needed} samples, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("abscissae must be strictly increasing")]
    NotIncreasing,
    #[error("samples contain non-finite values")]
    NonFinite,
    #[error("least-squares solve failed: {0}")]
    Solve(String),
}

/// Errors surfaced by a climb solve.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClimbError {
    #[error("invalid initial guess: {0}")]
    InvalidInitialGuess(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("solver stopped without converging ({status}) after {iterations} iterations, best final time {final_time:.3} s")]
    NotConverged {
        status: SolveStatus,
        iterations: usize,
        final_time: f64,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error(transparent)]
    Fit(#[from] FitError),
}
