use super::{BoundaryConditions, ClimbProblem};
use crate::error::ClimbError;
use crate::numeric::{cumulative_trapezoid, forward_difference, midpoints};
use crate::optim::NlpProblem;
use crate::physics::{AeroModel, Atmosphere, ThrustModel};
use crate::vehicle::Aircraft;

// ---------------------------------------------------------------------------
// Lateral force balance
// ---------------------------------------------------------------------------

/// Flight condition entering the force balance normal to the flight path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightCondition {
    pub mass: f64,            // kg
    pub speed: f64,           // m/s
    pub path_angle: f64,      // rad
    pub path_angle_rate: f64, // rad/s
    pub thrust: f64,          // N
    pub lift_slope: f64,      // C_La, per rad
    pub dynamic_force: f64,   // rho v^2 S / 2, N
}

/// Angle of attack that balances forces normal to the flight path,
/// linearized in alpha:
///
/// ```text
/// alpha = (m (v gamma_dot + g cos gamma) - T eps) / (T + C_La q S)
/// ```
pub fn angle_of_attack(c: &FlightCondition, aircraft: &Aircraft) -> f64 {
    let required = c.mass * (c.speed * c.path_angle_rate + aircraft.gravity * c.path_angle.cos());
    (required - c.thrust * aircraft.zero_lift_angle) / (c.thrust + c.lift_slope * c.dynamic_force)
}

// ---------------------------------------------------------------------------
// Transcribed climb problem
// ---------------------------------------------------------------------------

/// The climb as a nonlinear program over the scaled parameter vector
/// `[tf, v_1..v_{N-2}, gamma_1..gamma_{N-2}]`.
pub struct ClimbNlp<'a, A, T, D> {
    problem: &'a ClimbProblem<A, T, D>,
    boundary: BoundaryConditions,
    mesh_size: usize,
}

/// Node histories in physical units.
struct Mesh {
    step: f64,
    velocity: Vec<f64>,
    path_angle: Vec<f64>,
}

impl<'a, A: Atmosphere, T: ThrustModel, D: AeroModel> ClimbNlp<'a, A, T, D> {
    pub fn new(
        problem: &'a ClimbProblem<A, T, D>,
        boundary: BoundaryConditions,
        mesh_size: usize,
    ) -> Result<Self, ClimbError> {
        if mesh_size < 2 {
            return Err(ClimbError::InvalidConfig(format!(
                "mesh size must be at least 2, got {}",
                mesh_size
            )));
        }
        Ok(Self { problem, boundary, mesh_size })
    }

    pub fn mesh_size(&self) -> usize {
        self.mesh_size
    }

    fn unpack(&self, p: &[f64]) -> Mesh {
        let n = self.mesh_size;
        let units = self.problem.units();
        let interior = n - 2;

        let mut velocity = Vec::with_capacity(n);
        velocity.push(self.boundary.initial_velocity);
        velocity.extend(p[1..1 + interior].iter().map(|v| v * units.velocity));
        velocity.push(self.boundary.final_velocity);

        let mut path_angle = Vec::with_capacity(n);
        path_angle.push(self.boundary.initial_path_angle);
        path_angle.extend_from_slice(&p[1 + interior..]);
        path_angle.push(self.boundary.final_path_angle);

        Mesh {
            step: p[0] * units.time / (n - 1) as f64,
            velocity,
            path_angle,
        }
    }

    /// Node altitudes by trapezoidal integration of the climb rate.
    fn altitude(&self, mesh: &Mesh) -> Vec<f64> {
        let climb_rate: Vec<f64> =
            mesh.velocity.iter().zip(&mesh.path_angle).map(|(v, g)| v * g.sin()).collect();
        cumulative_trapezoid(&climb_rate, mesh.step)
            .into_iter()
            .map(|z| z + self.boundary.initial_altitude)
            .collect()
    }

    /// Final-altitude miss, then one along-track force residual per interval.
    pub fn equality_residuals(&self, p: &[f64]) -> Vec<f64> {
        let n = self.mesh_size;
        let units = self.problem.units();
        let aircraft = self.problem.aircraft();
        let mesh = self.unpack(p);
        let z = self.altitude(&mesh);
        let dt = mesh.step;

        let mut out = Vec::with_capacity(n);
        out.push((z[n - 1] - self.boundary.final_altitude) / units.length);

        let v_dot = forward_difference(&mesh.velocity, dt);
        let gamma_dot = forward_difference(&mesh.path_angle, dt);
        let z_mid = midpoints(&z);
        let v_mid = midpoints(&mesh.velocity);
        let gamma_mid = midpoints(&mesh.path_angle);

        let air: Vec<_> = z_mid.iter().map(|&h| self.problem.atmosphere().properties(h)).collect();
        let mach: Vec<f64> = v_mid.iter().zip(&air).map(|(v, a)| v / a.sound_speed).collect();
        let thrust: Vec<f64> = mach
            .iter()
            .zip(&z_mid)
            .map(|(&m, &h)| self.problem.thrust().thrust(m, h))
            .collect();

        // Node masses from rectangle sums of the interval burn rates
        let mut m = aircraft.initial_mass;
        let mut node_mass = Vec::with_capacity(n);
        node_mass.push(m);
        for &t in &thrust {
            m -= aircraft.fuel_flow(t) * dt;
            node_mass.push(m);
        }
        let mass = midpoints(&node_mass);

        for k in 0..n - 1 {
            let coeffs = self.problem.aero().coefficients(mach[k]);
            let q = aircraft.dynamic_pressure_force(air[k].density, v_mid[k]);
            let alpha = angle_of_attack(
                &FlightCondition {
                    mass: mass[k],
                    speed: v_mid[k],
                    path_angle: gamma_mid[k],
                    path_angle_rate: gamma_dot[k],
                    thrust: thrust[k],
                    lift_slope: coeffs.lift_slope,
                    dynamic_force: q,
                },
                aircraft,
            );
            let drag = coeffs.drag_coefficient(alpha) * q;
            let residual = mass[k] * (v_dot[k] + aircraft.gravity * gamma_mid[k].sin()) + drag
                - thrust[k] * (alpha + aircraft.zero_lift_angle).cos();
            out.push(residual / units.force);
        }
        out
    }

    /// Scaled altitude at the interior nodes, kept non-negative.
    pub fn inequality_residuals(&self, p: &[f64]) -> Vec<f64> {
        let n = self.mesh_size;
        let length = self.problem.units().length;
        let z = self.altitude(&self.unpack(p));
        z[1..n - 1].iter().map(|h| h / length).collect()
    }
}

impl<A: Atmosphere, T: ThrustModel, D: AeroModel> NlpProblem for ClimbNlp<'_, A, T, D> {
    fn dimension(&self) -> usize {
        2 * self.mesh_size - 3
    }

    /// Scaled final time.
    fn objective(&self, p: &[f64]) -> f64 {
        p[0]
    }

    fn equality(&self, p: &[f64]) -> Vec<f64> {
        self.equality_residuals(p)
    }

    fn inequality(&self, p: &[f64]) -> Vec<f64> {
        self.inequality_residuals(p)
    }

    fn objective_gradient(&self, p: &[f64]) -> Vec<f64> {
        let mut g = vec![0.0; p.len()];
        g[0] = 1.0;
        g
    }
}
