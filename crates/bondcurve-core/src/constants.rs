//! # Protocol Constants
//!
//! Scale conventions and bounds shared with the on-chain program:
//! - Fixed-point scales (Q64.64 prices, Q128 liquidity products)
//! - Price bounds
//! - Fee numerators and basis points
//! - Curve construction limits
//! - Dynamic fee defaults

// ============================================================================
// Fixed-Point Constants
// ============================================================================

/// Number of fractional bits in a Q64.64 value
pub const RESOLUTION: u32 = 64;

/// Shift used when rescaling Q64.64 products
pub const SCALE_OFFSET: u32 = 64;

/// 1.0 in Q64.64
pub const ONE_Q64: u128 = 1u128 << RESOLUTION;

// ============================================================================
// Price Bounds
// ============================================================================

/// Minimum sqrt price in Q64.64
pub const MIN_SQRT_PRICE: u128 = 4_295_048_016;

/// Maximum sqrt price in Q64.64
pub const MAX_SQRT_PRICE: u128 = 79_226_673_521_066_979_257_578_248_091;

// ============================================================================
// Fee Constants
// ============================================================================

/// Denominator of every fee numerator (1e9 = 100%)
pub const FEE_DENOMINATOR: u64 = 1_000_000_000;

/// Maximum fee (99%)
pub const MAX_FEE_NUMERATOR: u64 = 990_000_000;

/// Minimum fee (0.01%)
pub const MIN_FEE_NUMERATOR: u64 = 100_000;

/// Maximum fee in basis points
pub const MAX_FEE_BPS: u64 = 9_900;

/// Minimum fee in basis points
pub const MIN_FEE_BPS: u64 = 1;

/// Basis points denominator (10,000 = 100%)
pub const BASIS_POINT_MAX: u64 = 10_000;

/// Default share of the trading fee routed to the protocol (percent)
pub const PROTOCOL_FEE_PERCENT: u8 = 20;

/// Default share of the protocol fee paid to a referrer (percent)
pub const REFERRAL_FEE_PERCENT: u8 = 20;

/// Exponents at or above this magnitude underflow in `pow`
pub const MAX_EXPONENTIAL: u32 = 0x80000;

// ============================================================================
// Curve Construction Constants
// ============================================================================

/// Maximum number of points a curve may carry
pub const MAX_CURVE_POINT: usize = 20;

/// Number of geometric bins in a liquidity-weighted curve
pub const LIQUIDITY_WEIGHT_BINS: usize = 16;

/// Extra base supply reserved on top of the swap amount (percent)
pub const SWAP_BUFFER_PERCENTAGE: u64 = 25;

/// Maximum migration fee (percent of the migration quote threshold)
pub const MAX_MIGRATION_FEE_PERCENTAGE: u8 = 99;

// ============================================================================
// Dynamic Fee Defaults
// ============================================================================

/// Bin step used by the dynamic fee (basis points)
pub const BIN_STEP_BPS_DEFAULT: u16 = 1;

/// Bin step in Q64.64 divided by BASIS_POINT_MAX
pub const BIN_STEP_BPS_U128_DEFAULT: u128 = 1_844_674_407_370_955;

/// Filter period for the volatility reference
pub const DYNAMIC_FEE_FILTER_PERIOD_DEFAULT: u16 = 10;

/// Decay period for the volatility reference
pub const DYNAMIC_FEE_DECAY_PERIOD_DEFAULT: u16 = 120;

/// Volatility reduction factor (basis points)
pub const DYNAMIC_FEE_REDUCTION_FACTOR_DEFAULT: u16 = 5_000;

/// Largest price move the dynamic fee is calibrated for (basis points)
pub const MAX_PRICE_CHANGE_BPS_DEFAULT: u16 = 1_500;

/// Divisor turning `control * (accumulator * bin_step)^2` into a fee numerator
pub const DYNAMIC_FEE_SCALING_FACTOR: u128 = 100_000_000_000;

/// Maximum variable fee as a share of the base fee (percent)
pub const MAX_DYNAMIC_FEE_PERCENT: u64 = 20;
