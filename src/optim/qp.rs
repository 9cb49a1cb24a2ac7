use nalgebra::{DMatrix, DVector};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Convex QP subproblem
// ---------------------------------------------------------------------------
//
//   min  1/2 d'Bd + g'd
//   s.t. A d  = b
//        G d >= h
//
// Primal-dual interior point (Mehrotra predictor-corrector). Slacks s and
// inequality multipliers z stay strictly positive; the Newton system is
// reduced to the (d, y) block
//
//   [ B + G' diag(z/s) G   -A' ] [dd]   [ -r_d - G' ((r_c + z r_i) / s) ]
//   [        -A              0 ] [dy] = [  r_p                          ]
//
// and factored once per iteration for both predictor and corrector.

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QpError {
    #[error("KKT system is singular")]
    Singular,
    #[error("inconsistent QP dimensions: {0}")]
    Dimension(String),
    #[error("non-finite QP iterate")]
    NonFinite,
}

/// Borrowed QP data; `B` must be symmetric positive semi-definite.
pub struct QpProblem<'a> {
    pub hessian: &'a DMatrix<f64>,
    pub gradient: &'a DVector<f64>,
    pub eq_matrix: &'a DMatrix<f64>,
    pub eq_rhs: &'a DVector<f64>,
    pub ineq_matrix: &'a DMatrix<f64>,
    pub ineq_rhs: &'a DVector<f64>,
}

#[derive(Debug, Clone)]
pub struct QpSolution {
    pub step: DVector<f64>,
    pub eq_multipliers: DVector<f64>,
    /// Non-negative multipliers of `G d >= h`.
    pub ineq_multipliers: DVector<f64>,
    pub iterations: usize,
    pub converged: bool,
}

struct Direction {
    d: DVector<f64>,
    y: DVector<f64>,
    s: DVector<f64>,
    z: DVector<f64>,
}

impl QpProblem<'_> {
    fn check_dimensions(&self) -> Result<(), QpError> {
        let n = self.gradient.len();
        if self.hessian.shape() != (n, n) {
            return Err(QpError::Dimension(format!(
                "hessian {:?} for {} variables",
                self.hessian.shape(),
                n
            )));
        }
        if self.eq_matrix.ncols() != n || self.eq_matrix.nrows() != self.eq_rhs.len() {
            return Err(QpError::Dimension(format!(
                "equality matrix {:?} with {} right-hand sides",
                self.eq_matrix.shape(),
                self.eq_rhs.len()
            )));
        }
        if self.ineq_matrix.ncols() != n || self.ineq_matrix.nrows() != self.ineq_rhs.len() {
            return Err(QpError::Dimension(format!(
                "inequality matrix {:?} with {} right-hand sides",
                self.ineq_matrix.shape(),
                self.ineq_rhs.len()
            )));
        }
        Ok(())
    }
}

/// Solve the QP to `tolerance` (relative residuals and complementarity).
///
/// Hitting `max_iterations` is not an error: the last iterate is returned
/// with `converged == false`.
pub fn solve_qp(
    qp: &QpProblem,
    max_iterations: usize,
    tolerance: f64,
) -> Result<QpSolution, QpError> {
    qp.check_dimensions()?;

    let n = qp.gradient.len();
    let me = qp.eq_rhs.len();
    let mi = qp.ineq_rhs.len();
    let a = qp.eq_matrix;
    let g = qp.ineq_matrix;

    let mut d = DVector::zeros(n);
    let mut y = DVector::zeros(me);
    let mut s = qp.ineq_rhs.map(|h| (-h).max(1.0));
    let mut z = DVector::from_element(mi, 1.0);

    let dual_scale = 1.0 + max_abs(qp.gradient);
    let eq_scale = 1.0 + max_abs(qp.eq_rhs);
    let ineq_scale = 1.0 + max_abs(qp.ineq_rhs);

    for iteration in 0..max_iterations {
        let r_d = qp.hessian * &d + qp.gradient - a.tr_mul(&y) - g.tr_mul(&z);
        let r_p = a * &d - qp.eq_rhs;
        let r_i = g * &d - &s - qp.ineq_rhs;
        let mu = if mi > 0 { s.dot(&z) / mi as f64 } else { 0.0 };

        if !(r_d.iter().chain(r_p.iter()).chain(r_i.iter()).all(|v| v.is_finite()) && mu.is_finite())
        {
            return Err(QpError::NonFinite);
        }

        if max_abs(&r_d) <= tolerance * dual_scale
            && max_abs(&r_p) <= tolerance * eq_scale
            && max_abs(&r_i) <= tolerance * ineq_scale
            && mu <= tolerance
        {
            return Ok(QpSolution {
                step: d,
                eq_multipliers: y,
                ineq_multipliers: z,
                iterations: iteration,
                converged: true,
            });
        }

        // Reduced KKT matrix
        let w = z.component_div(&s);
        let mut weighted = g.clone();
        for (i, mut row) in weighted.row_iter_mut().enumerate() {
            row *= w[i];
        }
        let mut kkt = DMatrix::zeros(n + me, n + me);
        kkt.view_mut((0, 0), (n, n)).copy_from(&(qp.hessian + g.tr_mul(&weighted)));
        kkt.view_mut((0, n), (n, me)).copy_from(&(-a.transpose()));
        kkt.view_mut((n, 0), (me, n)).copy_from(&(-a));
        let lu = kkt.lu();
        if !lu.is_invertible() {
            return Err(QpError::Singular);
        }

        let direction = |r_c: &DVector<f64>| -> Result<Direction, QpError> {
            let t = (r_c + z.component_mul(&r_i)).component_div(&s);
            let mut rhs = DVector::zeros(n + me);
            rhs.rows_mut(0, n).copy_from(&(-(g.tr_mul(&t) + &r_d)));
            rhs.rows_mut(n, me).copy_from(&r_p);
            let sol = lu.solve(&rhs).ok_or(QpError::Singular)?;
            let dd = sol.rows(0, n).into_owned();
            let dy = sol.rows(n, me).into_owned();
            let ds = g * &dd + &r_i;
            let dz = -(r_c + z.component_mul(&ds)).component_div(&s);
            Ok(Direction { d: dd, y: dy, s: ds, z: dz })
        };

        let (step, alpha) = if mi > 0 {
            // Predictor: pure Newton step towards complementarity
            let affine = direction(&s.component_mul(&z))?;
            let alpha_aff = max_step(&s, &affine.s).min(max_step(&z, &affine.z)).min(1.0);
            let mu_aff =
                (&s + &affine.s * alpha_aff).dot(&(&z + &affine.z * alpha_aff)) / mi as f64;
            let sigma = (mu_aff / mu).powi(3);

            // Corrector with centering
            let r_c = s.component_mul(&z) + affine.s.component_mul(&affine.z)
                - DVector::from_element(mi, sigma * mu);
            let step = direction(&r_c)?;
            let alpha = (0.995 * max_step(&s, &step.s).min(max_step(&z, &step.z))).min(1.0);
            (step, alpha)
        } else {
            (direction(&DVector::zeros(0))?, 1.0)
        };

        d += &step.d * alpha;
        y += &step.y * alpha;
        s += &step.s * alpha;
        z += &step.z * alpha;
    }

    Ok(QpSolution {
        step: d,
        eq_multipliers: y,
        ineq_multipliers: z,
        iterations: max_iterations,
        converged: false,
    })
}

/// Largest step along `dv` keeping `v + alpha dv >= 0`; infinite when no
/// component decreases.
fn max_step(v: &DVector<f64>, dv: &DVector<f64>) -> f64 {
    v.iter()
        .zip(dv.iter())
        .filter(|(_, dvi)| **dvi < 0.0)
        .map(|(&vi, &dvi)| -vi / dvi)
        .fold(f64::INFINITY, f64::min)
}

fn max_abs(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(
        b: DMatrix<f64>,
        g: DVector<f64>,
        a: DMatrix<f64>,
        rhs: DVector<f64>,
        gi: DMatrix<f64>,
        h: DVector<f64>,
    ) -> Result<QpSolution, QpError> {
        let qp = QpProblem {
            hessian: &b,
            gradient: &g,
            eq_matrix: &a,
            eq_rhs: &rhs,
            ineq_matrix: &gi,
            ineq_rhs: &h,
        };
        solve_qp(&qp, 100, 1e-10)
    }

    #[test]
    fn equality_only_projection() {
        // min 1/2 |d|^2  s.t. d0 + d1 = 1
        let sol = solve(
            DMatrix::identity(2, 2),
            DVector::zeros(2),
            DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
            DVector::from_vec(vec![1.0]),
            DMatrix::zeros(0, 2),
            DVector::zeros(0),
        )
        .unwrap();
        assert!(sol.converged);
        assert!((sol.step[0] - 0.5).abs() < 1e-9);
        assert!((sol.step[1] - 0.5).abs() < 1e-9);
        assert!((sol.eq_multipliers[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn active_bound_has_positive_multiplier() {
        // min 1/2 |d|^2 - 2 d0  s.t. -d0 >= -1
        let sol = solve(
            DMatrix::identity(2, 2),
            DVector::from_vec(vec![-2.0, 0.0]),
            DMatrix::zeros(0, 2),
            DVector::zeros(0),
            DMatrix::from_row_slice(1, 2, &[-1.0, 0.0]),
            DVector::from_vec(vec![-1.0]),
        )
        .unwrap();
        assert!(sol.converged);
        assert!((sol.step[0] - 1.0).abs() < 1e-7);
        assert!(sol.step[1].abs() < 1e-7);
        assert!((sol.ineq_multipliers[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn inactive_bound_is_ignored() {
        // Same objective, d0 >= -5 never binds
        let sol = solve(
            DMatrix::identity(2, 2),
            DVector::from_vec(vec![-2.0, 0.0]),
            DMatrix::zeros(0, 2),
            DVector::zeros(0),
            DMatrix::from_row_slice(1, 2, &[1.0, 0.0]),
            DVector::from_vec(vec![-5.0]),
        )
        .unwrap();
        assert!(sol.converged);
        assert!((sol.step[0] - 2.0).abs() < 1e-7);
        assert!(sol.ineq_multipliers[0].abs() < 1e-6);
    }

    #[test]
    fn mixed_constraints() {
        // min 1/2 |d|^2  s.t. d0 + d1 + d2 = 3, d2 <= 0.5
        let sol = solve(
            DMatrix::identity(3, 3),
            DVector::zeros(3),
            DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]),
            DVector::from_vec(vec![3.0]),
            DMatrix::from_row_slice(1, 3, &[0.0, 0.0, -1.0]),
            DVector::from_vec(vec![-0.5]),
        )
        .unwrap();
        assert!(sol.converged);
        assert!((sol.step[0] - 1.25).abs() < 1e-7);
        assert!((sol.step[1] - 1.25).abs() < 1e-7);
        assert!((sol.step[2] - 0.5).abs() < 1e-7);
    }

    #[test]
    fn singular_system_is_reported() {
        let err = solve(
            DMatrix::zeros(2, 2),
            DVector::from_vec(vec![1.0, 1.0]),
            DMatrix::zeros(0, 2),
            DVector::zeros(0),
            DMatrix::zeros(0, 2),
            DVector::zeros(0),
        )
        .unwrap_err();
        assert_eq!(err, QpError::Singular);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let err = solve(
            DMatrix::identity(2, 2),
            DVector::zeros(3),
            DMatrix::zeros(0, 3),
            DVector::zeros(0),
            DMatrix::zeros(0, 3),
            DVector::zeros(0),
        )
        .unwrap_err();
        assert!(matches!(err, QpError::Dimension(_)));
    }
}
