pub mod bspline;
pub mod pchip;
pub mod quadrature;

pub use bspline::{BSplineBasis, TensorSurface};
pub use pchip::Pchip;
pub use quadrature::{
    cumulative_trapezoid, cumulative_trapezoid_x, forward_difference, gradient, linspace,
    midpoints,
};
