use super::aircraft::Aircraft;

// ---------------------------------------------------------------------------
// Characteristic units for non-dimensional optimization
// ---------------------------------------------------------------------------

/// Length, velocity, time and force units derived from the vehicle.
///
/// `length = 2 m / (rho0 S)` is the distance over which the aircraft sweeps
/// its own mass of ground-level air; the other units follow from gravity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingUnits {
    pub length: f64,   // m
    pub velocity: f64, // m/s
    pub time: f64,     // s
    pub force: f64,    // N
}

impl ScalingUnits {
    pub fn new(aircraft: &Aircraft, ground_density: f64) -> Self {
        let length = 2.0 * aircraft.initial_mass / (ground_density * aircraft.wing_area);
        let velocity = (aircraft.gravity * length).sqrt();
        Self {
            length,
            velocity,
            time: length / velocity,
            force: aircraft.initial_mass * aircraft.gravity,
        }
    }

    /// Physical `[tf, v_1..v_{N-2}, gamma_1..gamma_{N-2}]` to scaled form.
    ///
    /// Path angles are already dimensionless and pass through.
    pub fn to_scaled(&self, physical: &[f64]) -> Vec<f64> {
        self.map_parameters(physical, 1.0 / self.time, 1.0 / self.velocity)
    }

    /// Inverse of [`ScalingUnits::to_scaled`].
    pub fn to_physical(&self, scaled: &[f64]) -> Vec<f64> {
        self.map_parameters(scaled, self.time, self.velocity)
    }

    fn map_parameters(&self, p: &[f64], time_factor: f64, velocity_factor: f64) -> Vec<f64> {
        // Length 2N-3: one time, then N-2 velocities, then N-2 angles
        let interior = p.len().saturating_sub(1) / 2;
        p.iter()
            .enumerate()
            .map(|(i, &v)| match i {
                0 => v * time_factor,
                i if i <= interior => v * velocity_factor,
                _ => v,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::presets;

    #[test]
    fn f4_units() {
        let u = ScalingUnits::new(&presets::f4(), 1.225);
        assert!((u.length - 631.66).abs() < 0.01);
        assert!((u.velocity - 78.705).abs() < 0.001);
        assert!((u.time - 8.0257).abs() < 1e-3);
        assert!((u.force - 186_816.4).abs() < 0.1);
        assert!((u.velocity * u.time - u.length).abs() < 1e-9);
    }

    #[test]
    fn parameter_round_trip() {
        let u = ScalingUnits::new(&presets::f4(), 1.225);
        // N = 5: tf, three velocities, three path angles
        let physical = [320.0, 150.0, 250.0, 400.0, 0.1, 0.3, -0.05];
        let scaled = u.to_scaled(&physical);
        assert!((scaled[0] - 320.0 / u.time).abs() < 1e-12);
        assert!((scaled[2] - 250.0 / u.velocity).abs() < 1e-12);
        assert_eq!(scaled[5], 0.3);

        let back = u.to_physical(&scaled);
        for (a, b) in physical.iter().zip(&back) {
            assert!((a - b).abs() <= 1e-12 * a.abs().max(1.0));
        }
    }
}
