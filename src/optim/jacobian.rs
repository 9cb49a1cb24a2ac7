use nalgebra::DMatrix;

// ---------------------------------------------------------------------------
// Finite-difference Jacobian
// ---------------------------------------------------------------------------

/// Forward-difference Jacobian of `f` at `x`, given `f0 = f(x)`.
///
/// Column `j` perturbs `x[j]` by `sqrt(eps) * max(1, |x[j]|)`; the step
/// actually taken is re-read from the perturbed value so the quotient uses
/// an exactly representable increment.
pub fn forward_jacobian<F>(mut f: F, x: &[f64], f0: &[f64]) -> DMatrix<f64>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    let rel = f64::EPSILON.sqrt();
    let mut jac = DMatrix::zeros(f0.len(), x.len());
    if f0.is_empty() {
        return jac;
    }

    let mut shifted = x.to_vec();
    for j in 0..x.len() {
        shifted[j] = x[j] + rel * x[j].abs().max(1.0);
        let h = shifted[j] - x[j];
        let fj = f(&shifted);
        for (i, (a, b)) in fj.iter().zip(f0).enumerate() {
            jac[(i, j)] = (a - b) / h;
        }
        shifted[j] = x[j];
    }
    jac
}
