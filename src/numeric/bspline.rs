use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

// ---------------------------------------------------------------------------
// Clamped B-spline basis
// ---------------------------------------------------------------------------

/// B-spline basis of fixed degree on a clamped knot vector.
///
/// Evaluation outside `[lo, hi]` extends the polynomial piece of the nearest
/// end interval.
#[derive(Debug, Clone)]
pub struct BSplineBasis {
    knots: Vec<f64>,
    degree: usize,
}

impl BSplineBasis {
    /// Clamped knot vector on `[lo, hi]` with the given strictly interior knots.
    pub fn clamped(lo: f64, hi: f64, interior: &[f64], degree: usize) -> Result<Self, FitError> {
        if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
            return Err(FitError::NotIncreasing);
        }
        if interior.iter().any(|&k| !(k > lo && k < hi)) || interior.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(FitError::NotIncreasing);
        }

        let mut knots = Vec::with_capacity(interior.len() + 2 * (degree + 1));
        knots.extend(std::iter::repeat(lo).take(degree + 1));
        knots.extend_from_slice(interior);
        knots.extend(std::iter::repeat(hi).take(degree + 1));
        Ok(Self { knots, degree })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of basis functions.
    pub fn len(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lo(&self) -> f64 {
        self.knots[0]
    }

    pub fn hi(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// All basis functions (or their `order`-th derivative) at `x`.
    pub fn eval(&self, x: f64, order: usize) -> Vec<f64> {
        if order > self.degree {
            return vec![0.0; self.len()];
        }
        self.eval_degree(x, self.degree, order)
    }

    fn count(&self, degree: usize) -> usize {
        self.knots.len() - degree - 1
    }

    fn eval_degree(&self, x: f64, degree: usize, order: usize) -> Vec<f64> {
        if order == 0 {
            return self.values(x, degree);
        }

        // N'_{i,p} = p/(t_{i+p}-t_i) N_{i,p-1} - p/(t_{i+p+1}-t_{i+1}) N_{i+1,p-1}
        let lower = self.eval_degree(x, degree - 1, order - 1);
        let t = &self.knots;
        let p = degree as f64;
        (0..self.count(degree))
            .map(|i| {
                let left = t[i + degree] - t[i];
                let right = t[i + degree + 1] - t[i + 1];
                let a = if left > 0.0 { p / left * lower[i] } else { 0.0 };
                let b = if right > 0.0 { p / right * lower[i + 1] } else { 0.0 };
                a - b
            })
            .collect()
    }

    /// Values of all degree-`degree` basis functions at `x`.
    fn values(&self, x: f64, degree: usize) -> Vec<f64> {
        let mut out = vec![0.0; self.count(degree)];
        let span = self.span(x);
        let t = &self.knots;

        // Nonzero functions are span-degree ..= span
        let mut n = vec![0.0; degree + 1];
        let mut left = vec![0.0; degree + 1];
        let mut right = vec![0.0; degree + 1];
        n[0] = 1.0;
        for j in 1..=degree {
            left[j] = x - t[span + 1 - j];
            right[j] = t[span + j] - x;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = n[r] / (right[r + 1] + left[j - r]);
                n[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            n[j] = saved;
        }

        for (r, value) in n.into_iter().enumerate() {
            out[span - degree + r] = value;
        }
        out
    }

    /// Index of the non-empty knot interval containing `x`, clamped to the ends.
    fn span(&self, x: f64) -> usize {
        let first = self.degree;
        let last = self.knots.len() - self.degree - 2;
        if x <= self.knots[first] {
            return first;
        }
        if x >= self.knots[last + 1] {
            return last;
        }
        // Largest i with t_i <= x
        let i = self.knots.partition_point(|&k| k <= x) - 1;
        i.clamp(first, last)
    }
}

// ---------------------------------------------------------------------------
// Tensor-product surface fitted by least squares
// ---------------------------------------------------------------------------

/// Smooth surface `f(x, y) = sum_ij c_ij Bx_i(x) By_j(y)`.
#[derive(Debug, Clone)]
pub struct TensorSurface {
    bx: BSplineBasis,
    by: BSplineBasis,
    coeffs: DMatrix<f64>,
}

impl TensorSurface {
    /// Least-squares fit to scattered samples `(x_k, y_k, f_k)`.
    ///
    /// Rank deficiency from sparse corners of the data is resolved by taking
    /// the minimum-norm coefficient set.
    pub fn fit(
        bx: BSplineBasis,
        by: BSplineBasis,
        x: &[f64],
        y: &[f64],
        f: &[f64],
    ) -> Result<Self, FitError> {
        if x.len() != y.len() || x.len() != f.len() {
            return Err(FitError::LengthMismatch { x: x.len(), y: f.len() });
        }
        let (nx, ny) = (bx.len(), by.len());
        if x.len() < nx * ny {
            return Err(FitError::TooFewPoints { needed: nx * ny, got: x.len() });
        }
        if x.iter().chain(y).chain(f).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let mut design = DMatrix::zeros(x.len(), nx * ny);
        for k in 0..x.len() {
            let ux = bx.eval(x[k], 0);
            let uy = by.eval(y[k], 0);
            for i in 0..nx {
                for j in 0..ny {
                    design[(k, i * ny + j)] = ux[i] * uy[j];
                }
            }
        }
        let rhs = DVector::from_column_slice(f);

        let svd = design.svd(true, true);
        let tol = 1e-12 * svd.singular_values.max();
        let c = svd.solve(&rhs, tol).map_err(|e| FitError::Solve(e.to_string()))?;

        let coeffs = DMatrix::from_fn(nx, ny, |i, j| c[i * ny + j]);
        Ok(Self { bx, by, coeffs })
    }

    /// Surface value or mixed partial derivative `d^(dx+dy) f / dx^dx dy^dy`.
    pub fn eval(&self, x: f64, y: f64, dx: usize, dy: usize) -> f64 {
        let ux = DVector::from_vec(self.bx.eval(x, dx));
        let uy = DVector::from_vec(self.by.eval(y, dy));
        (ux.transpose() * &self.coeffs * uy)[(0, 0)]
    }

    /// Evaluate on the tensor grid `xs x ys`; rows follow `xs`.
    pub fn eval_grid(&self, xs: &[f64], ys: &[f64], dx: usize, dy: usize) -> DMatrix<f64> {
        let ux = DMatrix::from_fn(xs.len(), self.bx.len(), |r, c| self.bx.eval(xs[r], dx)[c]);
        let uy = DMatrix::from_fn(self.by.len(), ys.len(), |r, c| self.by.eval(ys[c], dy)[r]);
        ux * &self.coeffs * uy
    }

    /// Fitted rectangle `((x_lo, x_hi), (y_lo, y_hi))`.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        ((self.bx.lo(), self.bx.hi()), (self.by.lo(), self.by.hi()))
    }
}
