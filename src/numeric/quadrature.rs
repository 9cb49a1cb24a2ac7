// ---------------------------------------------------------------------------
// Sampled-data quadrature and differencing
// ---------------------------------------------------------------------------

/// `n` evenly spaced samples from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            // Pin the last sample so the endpoint is exact
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Cumulative trapezoidal integral of uniformly spaced samples.
///
/// Output has the same length as `y` and starts at zero.
pub fn cumulative_trapezoid(y: &[f64], dx: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(y.len());
    if y.is_empty() {
        return out;
    }
    let mut acc = 0.0;
    out.push(acc);
    for pair in y.windows(2) {
        acc += 0.5 * (pair[0] + pair[1]) * dx;
        out.push(acc);
    }
    out
}

/// Cumulative trapezoidal integral over arbitrary abscissae `x`.
pub fn cumulative_trapezoid_x(y: &[f64], x: &[f64]) -> Vec<f64> {
    debug_assert_eq!(y.len(), x.len());
    let mut out = Vec::with_capacity(y.len());
    if y.is_empty() {
        return out;
    }
    let mut acc = 0.0;
    out.push(acc);
    for i in 1..y.len().min(x.len()) {
        acc += 0.5 * (y[i - 1] + y[i]) * (x[i] - x[i - 1]);
        out.push(acc);
    }
    out
}

/// Forward differences divided by a uniform step. Length `n - 1`.
pub fn forward_difference(y: &[f64], dx: f64) -> Vec<f64> {
    y.windows(2).map(|w| (w[1] - w[0]) / dx).collect()
}

/// Arithmetic mean of consecutive samples. Length `n - 1`.
pub fn midpoints(y: &[f64]) -> Vec<f64> {
    y.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}

/// Derivative estimate on a non-uniform grid.
///
/// Second-order central differences in the interior, first-order one-sided
/// differences at both ends. Fewer than two samples yield zeros.
pub fn gradient(y: &[f64], x: &[f64]) -> Vec<f64> {
    let n = y.len().min(x.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let mut out = vec![0.0; n];
    out[0] = (y[1] - y[0]) / (x[1] - x[0]);
    out[n - 1] = (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]);

    for i in 1..n - 1 {
        let h1 = x[i] - x[i - 1];
        let h2 = x[i + 1] - x[i];
        let a = -h2 / (h1 * (h1 + h2));
        let b = (h2 - h1) / (h1 * h2);
        let c = h1 / (h2 * (h1 + h2));
        out[i] = a * y[i - 1] + b * y[i] + c * y[i + 1];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_ends() {
        let v = linspace(440.0, 968.0, 5);
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], 440.0);
        assert_eq!(v[4], 968.0);
        assert!((v[2] - 704.0).abs() < 1e-12);
    }

    #[test]
    fn trapezoid_exact_for_linear() {
        // Integral of 2t from 0 to t is t^2
        let dx = 0.25;
        let y: Vec<f64> = (0..9).map(|i| 2.0 * i as f64 * dx).collect();
        let z = cumulative_trapezoid(&y, dx);
        assert_eq!(z[0], 0.0);
        for (i, zi) in z.iter().enumerate() {
            let t = i as f64 * dx;
            assert!((zi - t * t).abs() < 1e-12, "at {}: {} vs {}", i, zi, t * t);
        }
    }

    #[test]
    fn trapezoid_uniform_matches_general() {
        let x = linspace(0.0, 3.0, 13);
        let y: Vec<f64> = x.iter().map(|t| t.sin()).collect();
        let a = cumulative_trapezoid(&y, x[1] - x[0]);
        let b = cumulative_trapezoid_x(&y, &x);
        for (p, q) in a.iter().zip(&b) {
            assert!((p - q).abs() < 1e-12);
        }
        // Close to 1 - cos(3)
        assert!((a[12] - (1.0 - 3.0_f64.cos())).abs() < 0.02);
    }

    #[test]
    fn forward_difference_and_midpoints_shrink_by_one() {
        let y = [0.0, 1.0, 4.0, 9.0];
        assert_eq!(forward_difference(&y, 0.5), vec![2.0, 6.0, 10.0]);
        assert_eq!(midpoints(&y), vec![0.5, 2.5, 6.5]);
    }

    #[test]
    fn gradient_exact_for_quadratic_interior() {
        let x = [0.0, 0.5, 1.5, 2.0, 3.5];
        let y: Vec<f64> = x.iter().map(|t| t * t).collect();
        let g = gradient(&y, &x);
        for i in 1..x.len() - 1 {
            assert!((g[i] - 2.0 * x[i]).abs() < 1e-12, "interior {}", i);
        }
        // One-sided ends are first order
        assert!((g[0] - 0.5).abs() < 1e-12);
        assert!((g[4] - 5.5).abs() < 1e-12);
    }

    #[test]
    fn gradient_of_short_input() {
        assert!(gradient(&[1.0], &[0.0]).iter().all(|g| *g == 0.0));
        assert_eq!(gradient(&[1.0, 3.0], &[0.0, 2.0]), vec![1.0, 1.0]);
    }
}
