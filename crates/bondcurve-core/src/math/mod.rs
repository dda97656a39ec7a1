//! # Mathematical Functions
//!
//! Exact fixed-point primitives shared by the fee engine, the curves and the
//! curve builders.

pub mod big_int;
pub mod fixed_point;
pub mod liquidity_math;
pub mod safe_math;

// Re-export commonly used functions
pub use big_int::*;
pub use fixed_point::*;
pub use liquidity_math::*;
pub use safe_math::*;
