//! # Bondcurve Core - AMM Pricing Kernel
//!
//! Deterministic pricing logic shared by launch tooling, quoting services and
//! simulators for bonding-curve pools and the constant-product pools they
//! migrate into. It provides:
//!
//! - Exact Q64.64 fixed-point and liquidity math
//! - Multi-segment and single-segment liquidity curves
//! - Fee schedules, rate limiter and volatility surcharge
//! - Exact-in swap quotes with fee splits and price impact
//! - Curve construction from launch targets with token conservation
//!
//! All amounts are raw token units. Nothing here performs I/O except the
//! optional launch profile loader.
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde derives and TOML launch profiles for off-chain use

pub mod builder;
pub mod constants;
pub mod curve;
pub mod errors;
pub mod fees;
pub mod math;
pub mod quote;
pub mod types;

#[cfg(feature = "client")]
pub mod config;

// Re-export commonly used items
pub use builder::{build_curve, BuildCurveParams, BuiltCurve, CurveShape, TokenAllocation};
pub use constants::*;
pub use curve::{ConstantProductCurve, LiquidityCurve};
pub use errors::{CoreResult, CurveError, ErrorKind};
pub use fees::FeeEngine;
pub use quote::swap_quote;
pub use types::*;

#[cfg(feature = "client")]
pub use config::LaunchProfile;
