pub mod climb;
pub mod error;
pub mod numeric;
pub mod optim;
pub mod physics;
pub mod vehicle;

pub use climb::{
    solve_min_time_climb, BoundaryConditions, ClimbConfig, ClimbProblem, ClimbSolution,
    InitialGuess, TrajectorySample,
};
pub use error::{ClimbError, FitError};
pub use optim::{SolveStatus, Verbosity};
