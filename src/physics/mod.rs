pub mod aerodynamics;
pub mod atmosphere;
pub mod propulsion;

pub use aerodynamics::{AeroCoefficients, AeroModel, AeroTable};
pub use atmosphere::{Atmo, Atmosphere, StandardAtmosphere};
pub use propulsion::{EngineDeck, EngineTable, ThrustModel};

// ---------------------------------------------------------------------------
// Physical constants and unit conversions (SI)
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.80665; // standard gravity, m/s^2
pub const FOOT: f64 = 0.3048; // m
pub const POUND: f64 = 0.453_592_37; // kg (avoirdupois pound mass)
pub const POUND_FORCE: f64 = POUND * G0; // N
pub const DEGREE: f64 = std::f64::consts::PI / 180.0; // rad
