//! Numeric helpers shared by the basket pricing crates.

pub mod conversions;
pub mod fixed_point;
pub mod serialization;
