use log::{log, Level};
use nalgebra::{DMatrix, DVector};

use super::{
    constraint_violation, forward_jacobian, solve_qp, NlpProblem, QpProblem, QpSolution,
    SolveReport, SolveStatus, SolverOptions, Verbosity,
};

const ARMIJO: f64 = 1e-4;
const QP_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Iterates and linearizations
// ---------------------------------------------------------------------------

struct Point {
    x: DVector<f64>,
    objective: f64,
    eq: DVector<f64>,
    ineq: DVector<f64>,
}

impl Point {
    fn is_finite(&self) -> bool {
        self.objective.is_finite()
            && self.eq.iter().all(|c| c.is_finite())
            && self.ineq.iter().all(|c| c.is_finite())
    }

    fn violation(&self) -> f64 {
        constraint_violation(self.eq.as_slice(), self.ineq.as_slice())
    }
}

struct Linearization {
    gradient: DVector<f64>,
    eq_jacobian: DMatrix<f64>,
    ineq_jacobian: DMatrix<f64>,
}

impl Linearization {
    /// Gradient of the Lagrangian `f - y'c_eq - z'c_in`.
    fn lagrangian_gradient(&self, qp: &QpSolution) -> DVector<f64> {
        &self.gradient
            - self.eq_jacobian.tr_mul(&qp.eq_multipliers)
            - self.ineq_jacobian.tr_mul(&qp.ineq_multipliers)
    }
}

/// Counts every residual evaluation made on behalf of the solver.
struct Evaluator<'a, P: ?Sized> {
    problem: &'a P,
    evaluations: usize,
}

impl<P: NlpProblem + ?Sized> Evaluator<'_, P> {
    fn point(&mut self, x: DVector<f64>) -> Point {
        self.evaluations += 1;
        let objective = self.problem.objective(x.as_slice());
        let eq = DVector::from_vec(self.problem.equality(x.as_slice()));
        let ineq = DVector::from_vec(self.problem.inequality(x.as_slice()));
        Point { x, objective, eq, ineq }
    }

    fn linearize(&mut self, at: &Point) -> Linearization {
        let problem = self.problem;
        let x = at.x.as_slice();
        let count = &mut self.evaluations;

        let gradient = DVector::from_vec(problem.objective_gradient(x));
        let eq_jacobian = forward_jacobian(
            |p| {
                *count += 1;
                problem.equality(p)
            },
            x,
            at.eq.as_slice(),
        );
        let ineq_jacobian = forward_jacobian(
            |p| {
                *count += 1;
                problem.inequality(p)
            },
            x,
            at.ineq.as_slice(),
        );
        Linearization { gradient, eq_jacobian, ineq_jacobian }
    }
}

// ---------------------------------------------------------------------------
// L1 exact-penalty merit
// ---------------------------------------------------------------------------

struct Penalty {
    eq: DVector<f64>,
    ineq: DVector<f64>,
}

impl Penalty {
    fn new(n_eq: usize, n_ineq: usize) -> Self {
        Self { eq: DVector::zeros(n_eq), ineq: DVector::zeros(n_ineq) }
    }

    /// Weights track the multiplier magnitudes, decaying slowly when they drop.
    fn update(&mut self, qp: &QpSolution) {
        let blend = |w: &mut f64, lambda: f64| *w = lambda.abs().max(0.5 * (*w + lambda.abs()));
        for (w, &l) in self.eq.iter_mut().zip(qp.eq_multipliers.iter()) {
            blend(w, l);
        }
        for (w, &l) in self.ineq.iter_mut().zip(qp.ineq_multipliers.iter()) {
            blend(w, l);
        }
    }

    fn value(&self, p: &Point) -> f64 {
        let eq: f64 = self.eq.iter().zip(p.eq.iter()).map(|(w, c)| w * c.abs()).sum();
        let ineq: f64 = self.ineq.iter().zip(p.ineq.iter()).map(|(w, c)| w * (-c).max(0.0)).sum();
        eq + ineq
    }

    fn merit(&self, p: &Point) -> f64 {
        p.objective + self.value(p)
    }
}

// ---------------------------------------------------------------------------
// SQP driver
// ---------------------------------------------------------------------------

/// Minimize `problem` from `x0` by sequential quadratic programming.
///
/// Never fails outright: the returned report carries the last accepted
/// iterate together with the reason the iteration stopped.
pub fn minimize<P: NlpProblem + ?Sized>(
    problem: &P,
    x0: &[f64],
    options: &SolverOptions,
) -> SolveReport {
    debug_assert_eq!(x0.len(), problem.dimension());

    let iteration_level = match options.verbosity {
        Verbosity::Iterations => Level::Info,
        _ => Level::Debug,
    };
    let summary_level = match options.verbosity {
        Verbosity::Silent => Level::Debug,
        _ => Level::Info,
    };

    let n = x0.len();
    let tol = options.tolerance;
    let mut eval = Evaluator { problem, evaluations: 0 };

    let mut current = eval.point(DVector::from_column_slice(x0));
    if !current.is_finite() {
        log!(summary_level, "SQP: non-finite residuals at the initial point");
        return report(current, SolveStatus::NonFinite, 0, eval.evaluations);
    }

    let mut lin = eval.linearize(&current);
    let mut hessian = DMatrix::identity(n, n);
    let mut fresh_hessian = true;
    let mut penalty = Penalty::new(current.eq.len(), current.ineq.len());
    let mut status = SolveStatus::IterationLimit;
    let mut iterations = 0;

    while iterations < options.max_iterations {
        iterations += 1;

        let eq_rhs = -&current.eq;
        let ineq_rhs = -&current.ineq;
        let qp = QpProblem {
            hessian: &hessian,
            gradient: &lin.gradient,
            eq_matrix: &lin.eq_jacobian,
            eq_rhs: &eq_rhs,
            ineq_matrix: &lin.ineq_jacobian,
            ineq_rhs: &ineq_rhs,
        };
        let sub = match solve_qp(&qp, options.max_qp_iterations, QP_TOLERANCE) {
            Ok(sub) => sub,
            Err(e) if fresh_hessian => {
                log!(summary_level, "SQP: QP subproblem failed: {}", e);
                status = SolveStatus::QpFailure;
                break;
            }
            Err(e) => {
                log!(iteration_level, "iter {:4}  QP failed ({}), resetting Hessian", iterations, e);
                hessian = DMatrix::identity(n, n);
                fresh_hessian = true;
                continue;
            }
        };

        if current.violation() <= tol && sub.step.amax() <= tol {
            status = SolveStatus::Converged;
            break;
        }

        penalty.update(&sub);
        let merit0 = penalty.merit(&current);
        let slope = lin.gradient.dot(&sub.step) - penalty.value(&current);

        let Some((trial, alpha)) = line_search(
            &mut eval,
            &current,
            &sub.step,
            &penalty,
            merit0,
            slope,
            options.max_line_search_steps,
        ) else {
            if fresh_hessian {
                status = SolveStatus::LineSearchFailure;
                break;
            }
            log!(iteration_level, "iter {:4}  line search failed, resetting Hessian", iterations);
            hessian = DMatrix::identity(n, n);
            fresh_hessian = true;
            continue;
        };

        let trial_lin = eval.linearize(&trial);
        let s = &trial.x - &current.x;
        let y = trial_lin.lagrangian_gradient(&sub) - lin.lagrangian_gradient(&sub);
        if damped_bfgs(&mut hessian, &s, &y) {
            fresh_hessian = false;
        }

        let merit_change = (penalty.merit(&trial) - merit0).abs();
        let step_taken = s.amax();
        current = trial;
        lin = trial_lin;

        let violation = current.violation();
        log!(
            iteration_level,
            "iter {:4}  f {:.8e}  viol {:.3e}  step {:.3e}  alpha {:.3}  qp {}{}",
            iterations,
            current.objective,
            violation,
            step_taken,
            alpha,
            sub.iterations,
            if sub.converged { "" } else { "*" }
        );

        if violation <= tol && (merit_change <= tol || step_taken <= tol) {
            status = SolveStatus::Converged;
            break;
        }
    }

    log!(
        summary_level,
        "SQP {} after {} iterations: f = {:.8e}, violation = {:.3e}, {} evaluations",
        status,
        iterations,
        current.objective,
        current.violation(),
        eval.evaluations
    );
    report(current, status, iterations, eval.evaluations)
}

/// Backtracking on the merit function: Armijo sufficient decrease, step
/// reduced by safeguarded quadratic interpolation.
fn line_search<P: NlpProblem + ?Sized>(
    eval: &mut Evaluator<'_, P>,
    from: &Point,
    direction: &DVector<f64>,
    penalty: &Penalty,
    merit0: f64,
    slope: f64,
    max_steps: usize,
) -> Option<(Point, f64)> {
    let mut alpha = 1.0;
    for _ in 0..max_steps {
        let trial = eval.point(&from.x + direction * alpha);
        let merit = penalty.merit(&trial);
        if !merit.is_finite() {
            alpha *= 0.5;
            continue;
        }
        if merit <= merit0 + ARMIJO * alpha * slope {
            return Some((trial, alpha));
        }
        let curvature = 2.0 * (merit - merit0 - alpha * slope);
        let quadratic = -slope * alpha * alpha / curvature;
        alpha = if curvature > 0.0 && quadratic.is_finite() {
            quadratic.clamp(0.1 * alpha, 0.5 * alpha)
        } else {
            0.5 * alpha
        };
    }
    None
}

/// Powell-damped BFGS update of `b` with step `s` and gradient change `y`.
///
/// Returns false, leaving `b` untouched, when the step carries no curvature
/// information.
fn damped_bfgs(b: &mut DMatrix<f64>, s: &DVector<f64>, y: &DVector<f64>) -> bool {
    let bs = &*b * s;
    let sbs = s.dot(&bs);
    if !(sbs > f64::MIN_POSITIVE) {
        return false;
    }

    let sy = s.dot(y);
    let r = if sy >= 0.2 * sbs {
        y.clone()
    } else {
        let theta = 0.8 * sbs / (sbs - sy);
        y * theta + &bs * (1.0 - theta)
    };
    let sr = s.dot(&r);
    if !(sr > 0.0) || !r.iter().all(|v| v.is_finite()) {
        return false;
    }

    b.ger(1.0 / sr, &r, &r, 1.0);
    b.ger(-1.0 / sbs, &bs, &bs, 1.0);
    true
}

fn report(point: Point, status: SolveStatus, iterations: usize, evaluations: usize) -> SolveReport {
    let constraint_violation = point.violation();
    SolveReport {
        x: point.x.iter().copied().collect(),
        status,
        iterations,
        objective: point.objective,
        constraint_violation,
        evaluations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// min x0^2 + x1^2  s.t.  x0 + x1 = 1
    struct Projection;

    impl NlpProblem for Projection {
        fn dimension(&self) -> usize { 2 }
        fn objective(&self, x: &[f64]) -> f64 { x[0] * x[0] + x[1] * x[1] }
        fn equality(&self, x: &[f64]) -> Vec<f64> { vec![x[0] + x[1] - 1.0] }
        fn inequality(&self, _x: &[f64]) -> Vec<f64> { vec![] }
    }

    /// min (x0 - 2)^2 + (x1 - 1)^2
    /// s.t. x0 - 2 x1 + 1 = 0,  1 - x0^2 / 4 - x1^2 >= 0
    struct Ellipse;

    impl NlpProblem for Ellipse {
        fn dimension(&self) -> usize { 2 }
        fn objective(&self, x: &[f64]) -> f64 { (x[0] - 2.0).powi(2) + (x[1] - 1.0).powi(2) }
        fn equality(&self, x: &[f64]) -> Vec<f64> { vec![x[0] - 2.0 * x[1] + 1.0] }
        fn inequality(&self, x: &[f64]) -> Vec<f64> { vec![1.0 - 0.25 * x[0] * x[0] - x[1] * x[1]] }
    }

    /// The same equality twice: the KKT matrix is rank deficient.
    struct Duplicated;

    impl NlpProblem for Duplicated {
        fn dimension(&self) -> usize { 2 }
        fn objective(&self, x: &[f64]) -> f64 { x[0] * x[0] + x[1] * x[1] }
        fn equality(&self, x: &[f64]) -> Vec<f64> {
            let c = x[0] + x[1] - 1.0;
            vec![c, c]
        }
        fn inequality(&self, _x: &[f64]) -> Vec<f64> { vec![] }
    }

    /// min x0, but the reported gradient points uphill.
    struct WrongGradient;

    impl NlpProblem for WrongGradient {
        fn dimension(&self) -> usize { 1 }
        fn objective(&self, x: &[f64]) -> f64 { x[0] }
        fn equality(&self, _x: &[f64]) -> Vec<f64> { vec![] }
        fn inequality(&self, _x: &[f64]) -> Vec<f64> { vec![] }
        fn objective_gradient(&self, _x: &[f64]) -> Vec<f64> { vec![-1.0] }
    }

    #[test]
    fn singular_subproblem_is_reported() {
        let r = minimize(&Duplicated, &[3.0, -1.0], &SolverOptions::default());
        assert_eq!(r.status, SolveStatus::QpFailure);
        assert_eq!(r.iterations, 1);
        // Best iterate is the start point
        assert_eq!(r.x, vec![3.0, -1.0]);
        assert!((r.constraint_violation - 2.0).abs() < 1e-12);
    }

    #[test]
    fn ascent_direction_fails_line_search() {
        let r = minimize(&WrongGradient, &[0.5], &SolverOptions::default());
        assert_eq!(r.status, SolveStatus::LineSearchFailure);
        assert_eq!(r.iterations, 1);
        assert_eq!(r.x, vec![0.5]);
        // One start point plus every rejected trial
        assert_eq!(r.evaluations, 1 + 20);
    }

    #[test]
    fn equality_constrained_quadratic() {
        let r = minimize(&Projection, &[3.0, -1.0], &SolverOptions::default());
        assert!(r.converged(), "status {}", r.status);
        assert!((r.x[0] - 0.5).abs() < 1e-5);
        assert!((r.x[1] - 0.5).abs() < 1e-5);
        assert!(r.evaluations > r.iterations);
    }

    #[test]
    fn active_nonlinear_inequality() {
        let r = minimize(&Ellipse, &[2.0, 2.0], &SolverOptions::default());
        assert!(r.converged(), "status {}", r.status);
        let x1 = (1.0 + 7.0_f64.sqrt()) / 4.0;
        let x0 = 2.0 * x1 - 1.0;
        assert!((r.x[0] - x0).abs() < 1e-4, "x0 = {}", r.x[0]);
        assert!((r.x[1] - x1).abs() < 1e-4, "x1 = {}", r.x[1]);
        assert!((r.objective - 1.393_465).abs() < 1e-4);
        assert!(r.constraint_violation < 1e-6);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let options = SolverOptions { max_iterations: 1, ..Default::default() };
        let r = minimize(&Ellipse, &[2.0, 2.0], &options);
        assert_eq!(r.status, SolveStatus::IterationLimit);
        assert_eq!(r.iterations, 1);
    }

    #[test]
    fn non_finite_start_is_rejected() {
        let r = minimize(&Ellipse, &[f64::NAN, 0.0], &SolverOptions::default());
        assert_eq!(r.status, SolveStatus::NonFinite);
        assert_eq!(r.iterations, 0);
    }

    #[test]
    fn bfgs_keeps_secant_condition() {
        let mut b = DMatrix::identity(2, 2);
        let s = DVector::from_vec(vec![1.0, 0.5]);
        let y = DVector::from_vec(vec![2.0, 1.5]);
        assert!(damped_bfgs(&mut b, &s, &y));
        let bs = &b * &s;
        assert!((bs - &y).amax() < 1e-12);
        assert!((b[(0, 1)] - b[(1, 0)]).abs() < 1e-12);
    }

    #[test]
    fn bfgs_damping_keeps_positive_definite() {
        let mut b = DMatrix::identity(2, 2);
        let s = DVector::from_vec(vec![1.0, 0.0]);
        let y = DVector::from_vec(vec![-1.0, 0.0]);
        assert!(damped_bfgs(&mut b, &s, &y));
        assert!(b.clone().cholesky().is_some());
    }
}
