use nalgebra::DMatrix;

use super::{FOOT, POUND_FORCE};
use crate::error::FitError;
use crate::numeric::{BSplineBasis, TensorSurface};

// ---------------------------------------------------------------------------
// Propulsion model interface
// ---------------------------------------------------------------------------

/// Maximum available thrust as a smooth function of Mach number and altitude.
pub trait ThrustModel {
    /// Maximum thrust, N.
    fn thrust(&self, mach: f64, altitude: f64) -> f64 {
        self.thrust_derivative(mach, altitude, 0, 0)
    }

    /// Partial derivative of thrust of order `d_mach` in Mach and `d_alt` in altitude.
    fn thrust_derivative(&self, mach: f64, altitude: f64, d_mach: usize, d_alt: usize) -> f64;

    /// Thrust (or a partial derivative) on the grid `machs x altitudes`.
    fn thrust_grid(
        &self,
        machs: &[f64],
        altitudes: &[f64],
        d_mach: usize,
        d_alt: usize,
    ) -> DMatrix<f64> {
        DMatrix::from_fn(machs.len(), altitudes.len(), |i, j| {
            self.thrust_derivative(machs[i], altitudes[j], d_mach, d_alt)
        })
    }

    /// Whether `(mach, altitude)` lies inside the data the model was fitted to.
    fn in_envelope(&self, _mach: f64, _altitude: f64) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Tabulated engine data
// ---------------------------------------------------------------------------

/// Scattered (Mach, altitude, thrust) samples in SI units.
#[derive(Debug, Clone)]
pub struct EngineTable {
    pub mach: Vec<f64>,
    pub altitude: Vec<f64>, // m
    pub thrust: Vec<f64>,   // N
}

/// Maximum-thrust data for the F4 (J79 pair), Bryson, Desai & Hoffman (1969).
pub fn f4_engine_table() -> EngineTable {
    // (Mach, altitude kft, thrust klb)
    const ROWS: [(f64, &[(f64, f64)]); 10] = [
        (0.0, &[(0.0, 24.2)]),
        (0.2, &[(0.0, 28.0), (5.0, 24.6), (10.0, 21.1), (15.0, 18.1), (20.0, 15.2), (25.0, 12.8), (30.0, 10.7)]),
        (0.4, &[(0.0, 28.3), (5.0, 25.2), (10.0, 21.9), (15.0, 18.7), (20.0, 15.9), (25.0, 13.4), (30.0, 11.2), (40.0, 7.3), (50.0, 4.4)]),
        (0.6, &[(0.0, 30.8), (5.0, 27.2), (10.0, 23.8), (15.0, 20.5), (20.0, 17.3), (25.0, 14.7), (30.0, 12.3), (40.0, 8.1), (50.0, 4.9)]),
        (0.8, &[(0.0, 34.5), (5.0, 30.3), (10.0, 26.6), (15.0, 23.2), (20.0, 19.8), (25.0, 16.8), (30.0, 14.1), (40.0, 9.4), (50.0, 5.6), (70.0, 1.1)]),
        (1.0, &[(0.0, 37.9), (5.0, 34.3), (10.0, 30.4), (15.0, 26.8), (20.0, 23.3), (25.0, 19.8), (30.0, 16.8), (40.0, 11.2), (50.0, 6.8), (70.0, 1.4)]),
        (1.2, &[(0.0, 36.1), (5.0, 38.0), (10.0, 34.9), (15.0, 31.3), (20.0, 27.3), (25.0, 23.6), (30.0, 20.1), (40.0, 13.4), (50.0, 8.3), (70.0, 1.7)]),
        (1.4, &[(5.0, 36.6), (10.0, 38.5), (15.0, 36.1), (20.0, 31.6), (25.0, 28.1), (30.0, 24.2), (40.0, 16.2), (50.0, 10.0), (70.0, 2.2)]),
        (1.6, &[(15.0, 38.7), (20.0, 35.7), (25.0, 32.0), (30.0, 28.1), (40.0, 19.3), (50.0, 11.9), (70.0, 2.9)]),
        (1.8, &[(25.0, 34.6), (30.0, 31.1), (40.0, 21.7), (50.0, 13.3), (70.0, 3.1)]),
    ];

    let mut table = EngineTable {
        mach: Vec::with_capacity(77),
        altitude: Vec::with_capacity(77),
        thrust: Vec::with_capacity(77),
    };
    for (mach, samples) in ROWS {
        for &(kft, klb) in samples {
            table.mach.push(mach);
            table.altitude.push(kft * 1000.0 * FOOT);
            table.thrust.push(klb * 1000.0 * POUND_FORCE);
        }
    }
    table
}

// ---------------------------------------------------------------------------
// Smoothed engine deck
// ---------------------------------------------------------------------------

/// Knot layout for the thrust surface fit.
#[derive(Debug, Clone)]
pub struct DeckFit {
    pub degree: usize,
    pub mach_knots: Vec<f64>,
    pub altitude_knots: Vec<f64>, // m
}

impl Default for DeckFit {
    /// Quartic in both directions, interior knots at Mach 0.6 and 1.2 and at
    /// 6 and 12 km.
    fn default() -> Self {
        Self {
            degree: 4,
            mach_knots: vec![0.6, 1.2],
            altitude_knots: vec![6_000.0, 12_000.0],
        }
    }
}

/// Thrust surface fitted by least squares to an [`EngineTable`].
#[derive(Debug, Clone)]
pub struct EngineDeck {
    surface: TensorSurface,
    // Per-Mach altitude ranges covered by the table: (mach, lo, hi)
    envelope: Vec<(f64, f64, f64)>,
}

impl EngineDeck {
    pub fn fit(table: &EngineTable, fit: &DeckFit) -> Result<Self, FitError> {
        let (m_lo, m_hi) = min_max(&table.mach).ok_or(FitError::TooFewPoints { needed: 1, got: 0 })?;
        let (z_lo, z_hi) =
            min_max(&table.altitude).ok_or(FitError::TooFewPoints { needed: 1, got: 0 })?;

        let bx = BSplineBasis::clamped(m_lo, m_hi, &fit.mach_knots, fit.degree)?;
        let by = BSplineBasis::clamped(z_lo, z_hi, &fit.altitude_knots, fit.degree)?;
        let surface = TensorSurface::fit(bx, by, &table.mach, &table.altitude, &table.thrust)?;

        let mut envelope: Vec<(f64, f64, f64)> = vec![];
        for (&m, &z) in table.mach.iter().zip(&table.altitude) {
            match envelope.iter_mut().find(|e| e.0 == m) {
                Some(e) => {
                    e.1 = e.1.min(z);
                    e.2 = e.2.max(z);
                }
                None => envelope.push((m, z, z)),
            }
        }
        envelope.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(Self { surface, envelope })
    }

    /// F4 deck with the default knot layout.
    pub fn f4() -> Result<Self, FitError> {
        Self::fit(&f4_engine_table(), &DeckFit::default())
    }

    /// Altitude band covered by the table at `mach`, linearly interpolated
    /// between tabulated Mach rows.
    fn altitude_band(&self, mach: f64) -> Option<(f64, f64)> {
        let first = self.envelope.first()?;
        let last = self.envelope.last()?;
        if mach < first.0 || mach > last.0 {
            return None;
        }
        for w in self.envelope.windows(2) {
            let (a, b) = (w[0], w[1]);
            if mach >= a.0 && mach <= b.0 {
                let s = (mach - a.0) / (b.0 - a.0);
                return Some((a.1 + s * (b.1 - a.1), a.2 + s * (b.2 - a.2)));
            }
        }
        Some((first.1, first.2))
    }
}

impl ThrustModel for EngineDeck {
    fn thrust_derivative(&self, mach: f64, altitude: f64, d_mach: usize, d_alt: usize) -> f64 {
        self.surface.eval(mach, altitude, d_mach, d_alt)
    }

    fn thrust_grid(
        &self,
        machs: &[f64],
        altitudes: &[f64],
        d_mach: usize,
        d_alt: usize,
    ) -> DMatrix<f64> {
        self.surface.eval_grid(machs, altitudes, d_mach, d_alt)
    }

    fn in_envelope(&self, mach: f64, altitude: f64) -> bool {
        match self.altitude_band(mach) {
            Some((lo, hi)) => altitude >= lo - 1e-9 && altitude <= hi + 1e-9,
            None => false,
        }
    }
}

fn min_max(v: &[f64]) -> Option<(f64, f64)> {
    let lo = v.iter().copied().reduce(f64::min)?;
    let hi = v.iter().copied().reduce(f64::max)?;
    Some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KLB: f64 = 1000.0 * POUND_FORCE;
    const KFT: f64 = 1000.0 * FOOT;

    #[test]
    fn table_has_all_samples() {
        let t = f4_engine_table();
        assert_eq!(t.mach.len(), 77);
        assert_eq!(t.altitude.len(), 77);
        assert!((t.thrust[0] - 24.2 * KLB).abs() < 1e-9);
        assert!((t.altitude[76] - 70.0 * KFT).abs() < 1e-9);
    }

    #[test]
    fn deck_follows_table_closely() {
        let deck = EngineDeck::f4().unwrap();
        let table = f4_engine_table();
        let mut worst = 0.0_f64;
        for k in 0..table.mach.len() {
            let fit = deck.thrust(table.mach[k], table.altitude[k]);
            worst = worst.max((fit - table.thrust[k]).abs());
        }
        assert!(worst < 0.5 * KLB, "worst residual {:.2} klb", worst / KLB);
    }

    #[test]
    fn interior_knots_beat_single_polynomial() {
        let table = f4_engine_table();
        let plain = DeckFit { mach_knots: vec![], altitude_knots: vec![], ..Default::default() };
        let rms = |deck: &EngineDeck| {
            let sum: f64 = (0..table.mach.len())
                .map(|k| (deck.thrust(table.mach[k], table.altitude[k]) - table.thrust[k]).powi(2))
                .sum();
            (sum / table.mach.len() as f64).sqrt()
        };
        let coarse = rms(&EngineDeck::fit(&table, &plain).unwrap());
        let fine = rms(&EngineDeck::f4().unwrap());
        assert!(fine < 0.15 * KLB, "rms {:.3} klb", fine / KLB);
        assert!(fine < 0.5 * coarse);
    }

    #[test]
    fn thrust_falls_with_altitude() {
        let deck = EngineDeck::f4().unwrap();
        for mach in [0.4, 0.8, 1.2] {
            assert!(deck.thrust(mach, 10.0 * KFT) > deck.thrust(mach, 40.0 * KFT));
            assert!(deck.thrust_derivative(mach, 30.0 * KFT, 0, 1) < 0.0);
        }
    }

    #[test]
    fn partial_derivatives_match_finite_differences() {
        let deck = EngineDeck::f4().unwrap();
        let (m, z) = (0.9, 6_000.0);
        let hm = 1e-5;
        let hz = 1e-2;
        let dm = (deck.thrust(m + hm, z) - deck.thrust(m - hm, z)) / (2.0 * hm);
        let dz = (deck.thrust(m, z + hz) - deck.thrust(m, z - hz)) / (2.0 * hz);
        assert!((dm - deck.thrust_derivative(m, z, 1, 0)).abs() < 1e-3 * dm.abs().max(1.0));
        assert!((dz - deck.thrust_derivative(m, z, 0, 1)).abs() < 1e-3 * dz.abs().max(1.0));
    }

    #[test]
    fn grid_matches_pointwise() {
        let deck = EngineDeck::f4().unwrap();
        let machs = [0.3, 0.9, 1.5];
        let alts = [0.0, 5_000.0];
        let g = deck.thrust_grid(&machs, &alts, 0, 0);
        assert_eq!(g.shape(), (3, 2));
        for (i, &m) in machs.iter().enumerate() {
            for (j, &z) in alts.iter().enumerate() {
                assert!((g[(i, j)] - deck.thrust(m, z)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn envelope_excludes_low_mach_at_altitude() {
        let deck = EngineDeck::f4().unwrap();
        assert!(deck.in_envelope(0.4, 20.0 * KFT));
        assert!(!deck.in_envelope(0.2, 60.0 * KFT));
        assert!(!deck.in_envelope(2.0, 40.0 * KFT));
        assert!(deck.in_envelope(1.7, 50.0 * KFT));
    }
}
