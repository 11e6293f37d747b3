//! Numeric helpers: replicate statistics and elementwise normalization.

pub mod aggregate;
pub mod normalize;

pub use aggregate::*;
pub use normalize::*;
