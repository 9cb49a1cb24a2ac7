use crate::physics::{DEGREE, FOOT, G0, POUND};

// ---------------------------------------------------------------------------
// Aircraft definition (point-mass climb model)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Aircraft {
    pub name: String,
    pub initial_mass: f64,       // kg
    pub wing_area: f64,          // m^2, aerodynamic reference area
    pub zero_lift_angle: f64,    // rad, thrust line to zero-lift line (epsilon)
    pub fuel_time_constant: f64, // s, mass flow = thrust / (c * g)
    pub gravity: f64,            // m/s^2
}

impl Aircraft {
    /// Fuel mass flow at the given thrust, kg/s.
    pub fn fuel_flow(&self, thrust: f64) -> f64 {
        thrust / (self.fuel_time_constant * self.gravity)
    }

    pub fn weight(&self) -> f64 {
        self.initial_mass * self.gravity
    }

    /// Dynamic pressure times reference area, `rho v^2 S / 2`.
    pub fn dynamic_pressure_force(&self, density: f64, speed: f64) -> f64 {
        0.5 * density * speed * speed * self.wing_area
    }
}

// ---------------------------------------------------------------------------
// Aircraft builder
// ---------------------------------------------------------------------------

pub struct AircraftBuilder {
    name: String,
    initial_mass: f64,
    wing_area: f64,
    zero_lift_angle: f64,
    fuel_time_constant: f64,
    gravity: f64,
}

impl AircraftBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial_mass: 10_000.0,
            wing_area: 30.0,
            zero_lift_angle: 0.0,
            fuel_time_constant: 1600.0,
            gravity: G0,
        }
    }

    pub fn initial_mass(mut self, v: f64) -> Self { self.initial_mass = v; self }
    pub fn wing_area(mut self, v: f64) -> Self { self.wing_area = v; self }
    pub fn zero_lift_angle(mut self, v: f64) -> Self { self.zero_lift_angle = v; self }
    pub fn fuel_time_constant(mut self, v: f64) -> Self { self.fuel_time_constant = v; self }
    pub fn gravity(mut self, v: f64) -> Self { self.gravity = v; self }

    pub fn build(self) -> Aircraft {
        Aircraft {
            name: self.name,
            initial_mass: self.initial_mass,
            wing_area: self.wing_area,
            zero_lift_angle: self.zero_lift_angle,
            fuel_time_constant: self.fuel_time_constant,
            gravity: self.gravity,
        }
    }
}

// ---------------------------------------------------------------------------
// Preset aircraft
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// F4 Phantom, Bryson "Dynamic Optimization" problem 9.3.15.
    pub fn f4() -> Aircraft {
        AircraftBuilder::new("F4")
            .initial_mass(41_998.0 * POUND)
            .wing_area(530.0 * FOOT * FOOT)
            .zero_lift_angle(3.0 * DEGREE)
            .fuel_time_constant(1600.0)
            .gravity(G0)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f4_constants_in_si() {
        let f4 = presets::f4();
        assert!((f4.initial_mass - 19_049.97).abs() < 0.01);
        assert!((f4.wing_area - 49.238).abs() < 1e-3);
        assert!((f4.zero_lift_angle - 0.052_36).abs() < 1e-5);
    }

    #[test]
    fn fuel_flow_scales_with_thrust() {
        let f4 = presets::f4();
        let mdot = f4.fuel_flow(100_000.0);
        assert!((mdot - 100_000.0 / (1600.0 * G0)).abs() < 1e-12);
        assert!((f4.fuel_flow(200_000.0) - 2.0 * mdot).abs() < 1e-12);
    }

    #[test]
    fn builder_overrides_defaults() {
        let a = AircraftBuilder::new("Test").initial_mass(5000.0).wing_area(20.0).build();
        assert_eq!(a.initial_mass, 5000.0);
        assert_eq!(a.wing_area, 20.0);
        assert_eq!(a.gravity, G0);
        assert!((a.dynamic_pressure_force(1.0, 10.0) - 1000.0).abs() < 1e-12);
    }
}
