use crate::error::FitError;
use crate::numeric::Pchip;

// ---------------------------------------------------------------------------
// Aerodynamic coefficient model
// ---------------------------------------------------------------------------
//
// Lift:  C_L = C_La * alpha
// Drag:  C_D = C_D0 + kappa * C_La * alpha^2

/// Aerodynamic coefficients at one Mach number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroCoefficients {
    pub lift_slope: f64,     // C_La, per rad
    pub zero_lift_drag: f64, // C_D0
    pub induced_drag: f64,   // kappa
}

impl AeroCoefficients {
    /// Drag coefficient of the quadratic polar at angle of attack `alpha`.
    pub fn drag_coefficient(&self, alpha: f64) -> f64 {
        self.zero_lift_drag + self.induced_drag * self.lift_slope * alpha * alpha
    }

    pub fn lift_coefficient(&self, alpha: f64) -> f64 {
        self.lift_slope * alpha
    }
}

pub trait AeroModel {
    fn coefficients(&self, mach: f64) -> AeroCoefficients;

    /// Whether `mach` lies inside the tabulated range.
    fn in_envelope(&self, _mach: f64) -> bool {
        true
    }
}

/// Tabulated coefficients against Mach number.
#[derive(Debug, Clone)]
pub struct AeroData {
    pub mach: Vec<f64>,
    pub lift_slope: Vec<f64>,
    pub zero_lift_drag: Vec<f64>,
    pub induced_drag: Vec<f64>,
}

/// F4 aerodynamic data, Bryson, Desai & Hoffman (1969).
pub fn f4_aero_table() -> AeroData {
    AeroData {
        mach: vec![0.0, 0.4, 0.8, 0.9, 1.0, 1.2, 1.4, 1.6, 1.8],
        lift_slope: vec![3.44, 3.44, 3.44, 3.58, 4.44, 3.44, 3.01, 2.86, 2.44],
        zero_lift_drag: vec![0.013, 0.013, 0.013, 0.014, 0.031, 0.041, 0.039, 0.036, 0.035],
        induced_drag: vec![0.54, 0.54, 0.54, 0.75, 0.79, 0.78, 0.89, 0.93, 0.93],
    }
}

/// Shape-preserving interpolation of each coefficient over Mach.
#[derive(Debug, Clone)]
pub struct AeroTable {
    lift_slope: Pchip,
    zero_lift_drag: Pchip,
    induced_drag: Pchip,
}

impl AeroTable {
    pub fn new(data: &AeroData) -> Result<Self, FitError> {
        Ok(Self {
            lift_slope: Pchip::new(&data.mach, &data.lift_slope)?,
            zero_lift_drag: Pchip::new(&data.mach, &data.zero_lift_drag)?,
            induced_drag: Pchip::new(&data.mach, &data.induced_drag)?,
        })
    }

    pub fn f4() -> Result<Self, FitError> {
        Self::new(&f4_aero_table())
    }

    /// Derivatives of the three coefficients with respect to Mach.
    pub fn slopes(&self, mach: f64) -> AeroCoefficients {
        AeroCoefficients {
            lift_slope: self.lift_slope.derivative(mach),
            zero_lift_drag: self.zero_lift_drag.derivative(mach),
            induced_drag: self.induced_drag.derivative(mach),
        }
    }
}

impl AeroModel for AeroTable {
    fn coefficients(&self, mach: f64) -> AeroCoefficients {
        AeroCoefficients {
            lift_slope: self.lift_slope.eval(mach),
            zero_lift_drag: self.zero_lift_drag.eval(mach),
            induced_drag: self.induced_drag.eval(mach),
        }
    }

    fn in_envelope(&self, mach: f64) -> bool {
        self.lift_slope.contains(mach)
    }
}
