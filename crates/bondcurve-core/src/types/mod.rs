//! # Core Type Definitions
//!
//! Plain data shared by the fee engine, the curves and the builders.

pub mod curve;
pub mod fees;
pub mod pool;
pub mod quote;
pub mod vesting;

// Re-export all types
pub use curve::*;
pub use fees::*;
pub use pool::*;
pub use quote::*;
pub use vesting::*;
