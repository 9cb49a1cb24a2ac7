pub mod aircraft;
pub mod scaling;

pub use aircraft::{presets, Aircraft, AircraftBuilder};
pub use scaling::ScalingUnits;
