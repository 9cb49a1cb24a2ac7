use crate::error::FitError;

// ---------------------------------------------------------------------------
// Piecewise cubic Hermite interpolation, shape preserving (Fritsch-Carlson)
// ---------------------------------------------------------------------------

/// Monotonicity-preserving cubic interpolant through `(x, y)` samples.
///
/// Node slopes use the weighted harmonic mean of neighbouring secants and are
/// zeroed at local extrema. Outside the sample range the end cubics are
/// extended.
#[derive(Debug, Clone)]
pub struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl Pchip {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, FitError> {
        if x.len() != y.len() {
            return Err(FitError::LengthMismatch { x: x.len(), y: y.len() });
        }
        if x.len() < 2 {
            return Err(FitError::TooFewPoints { needed: 2, got: x.len() });
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FitError::NotIncreasing);
        }

        let slopes = node_slopes(x, y);
        Ok(Self { x: x.to_vec(), y: y.to_vec(), slopes })
    }

    /// Lower and upper abscissa of the samples.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn contains(&self, t: f64) -> bool {
        let (lo, hi) = self.domain();
        t >= lo && t <= hi
    }

    pub fn eval(&self, t: f64) -> f64 {
        let (k, h, s) = self.locate(t);
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        h00 * self.y[k]
            + h10 * h * self.slopes[k]
            + h01 * self.y[k + 1]
            + h11 * h * self.slopes[k + 1]
    }

    /// First derivative of the interpolant.
    pub fn derivative(&self, t: f64) -> f64 {
        let (k, h, s) = self.locate(t);
        let s2 = s * s;
        let d00 = 6.0 * s2 - 6.0 * s;
        let d10 = 3.0 * s2 - 4.0 * s + 1.0;
        let d01 = -6.0 * s2 + 6.0 * s;
        let d11 = 3.0 * s2 - 2.0 * s;
        (d00 * self.y[k] + d01 * self.y[k + 1]) / h
            + d10 * self.slopes[k]
            + d11 * self.slopes[k + 1]
    }

    /// Interval index, interval width and local coordinate for `t`.
    fn locate(&self, t: f64) -> (usize, f64, f64) {
        let last = self.x.len() - 2;
        // partition_point counts nodes <= t
        let k = self.x.partition_point(|&xi| xi <= t).saturating_sub(1).min(last);
        let h = self.x[k + 1] - self.x[k];
        (k, h, (t - self.x[k]) / h)
    }
}

fn node_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let m: Vec<f64> = y
        .windows(2)
        .zip(&h)
        .map(|(w, hk)| (w[1] - w[0]) / hk)
        .collect();

    if n == 2 {
        return vec![m[0], m[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (ml, mr) = (m[k - 1], m[k]);
        if ml == 0.0 || mr == 0.0 || ml.signum() != mr.signum() {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        d[k] = (w1 + w2) / (w1 / ml + w2 / mr);
    }

    d[0] = end_slope(h[0], h[1], m[0], m[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);
    d
}

/// Three-point end slope, limited to keep the end interval monotone.
fn end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(d) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}
