//! # Curve Builder
//!
//! Derives a complete bonding curve and its fee configuration from launch
//! targets: total supply, migration threshold or market caps, migration fee,
//! vesting and leftover.
//!
//! Three shapes are supported:
//! - **Flat**: one segment from the start price to the migration price
//! - **Market cap**: two segments bent at a geometric mid price
//! - **Liquidity weighted**: sixteen geometric bins with caller weights
//!
//! Every build ends with the same supply reconciliation. The curve is walked
//! up to the migration threshold, the resulting minimum supply is compared
//! with the total supply, and the difference becomes either a padding segment
//! up to [`MAX_SQRT_PRICE`] or a cut from the leftover. The returned
//! [`TokenAllocation`] always sums to the total supply exactly.

pub mod single;
pub mod two_segment;
pub mod validation;
pub mod vesting;
pub mod weighted;

pub use single::build_single_segment_curve;
pub use two_segment::build_two_segment_curve;
pub use validation::{validate_build_params, validate_curve};
pub use vesting::{get_locked_vesting_params, LockedVestingParams};
pub use weighted::build_liquidity_weighted_curve;

use ethnum::U256;
use num::BigUint;
use tracing::debug;

use crate::constants::{
    LIQUIDITY_WEIGHT_BINS, MAX_PRICE_CHANGE_BPS_DEFAULT, MAX_SQRT_PRICE, MIN_SQRT_PRICE,
    PROTOCOL_FEE_PERCENT, REFERRAL_FEE_PERCENT, SWAP_BUFFER_PERCENTAGE,
};
use crate::curve::{get_base_amount_from_liquidity, LiquidityCurve};
use crate::errors::{CoreResult, CurveError};
use crate::fees::{get_base_fee_params, get_dynamic_fee_params, get_rate_limiter_params, SchedulerMode};
use crate::math::big_int::{big_div_rounding, big_to_u128, big_to_u64, u256_to_u64, Rounding};
use crate::math::fixed_point::isqrt;
use crate::math::liquidity_math::{
    get_delta_amount_base_unsigned, get_delta_amount_base_unsigned_256,
    get_liquidity_from_delta_base, get_liquidity_from_delta_quote,
};
use crate::math::safe_math::{safe_add_u64, safe_cast_u128_to_u64, safe_sub_u128};
use crate::types::{
    CollectFeeMode, ConstantProductPool, Curve, CurveSegment, PoolFeesConfig, TradeDirection,
    VestingSchedule,
};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Build Parameters
// ============================================================================

/// Pool kind the curve migrates into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "snake_case"))]
pub enum MigrationOption {
    /// Full-range pool priced by reserve ratio
    #[default]
    ConstantProductV1,
    /// Concentrated pool seeded over `[MIN_SQRT_PRICE, MAX_SQRT_PRICE]`
    ConstantProductV2,
}

/// Base fee schedule requested for the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(tag = "mode", rename_all = "snake_case"))]
pub enum BaseFeeParams {
    FeeScheduler {
        starting_fee_bps: u64,
        ending_fee_bps: u64,
        number_of_period: u16,
        total_duration: u64,
        #[cfg_attr(feature = "client", serde(default))]
        scheduler_mode: SchedulerMode,
    },
    RateLimiter {
        base_fee_bps: u64,
        fee_increment_bps: u16,
        reference_amount: u64,
        max_limiter_duration: u64,
    },
}

impl BaseFeeParams {
    /// Fee the pool settles at, which the dynamic fee is calibrated against
    pub fn floor_fee_bps(&self) -> u64 {
        match self {
            BaseFeeParams::FeeScheduler { ending_fee_bps, .. } => *ending_fee_bps,
            BaseFeeParams::RateLimiter { base_fee_bps, .. } => *base_fee_bps,
        }
    }
}

/// Fee parameters of a launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct FeeParams {
    pub base_fee: BaseFeeParams,
    #[cfg_attr(feature = "client", serde(default))]
    pub dynamic_fee_enabled: bool,
    #[cfg_attr(feature = "client", serde(default))]
    pub collect_fee_mode: CollectFeeMode,
    #[cfg_attr(feature = "client", serde(default = "default_protocol_fee_percent"))]
    pub protocol_fee_percent: u8,
    #[cfg_attr(feature = "client", serde(default = "default_referral_fee_percent"))]
    pub referral_fee_percent: u8,
}

#[cfg(feature = "client")]
fn default_protocol_fee_percent() -> u8 {
    PROTOCOL_FEE_PERCENT
}

#[cfg(feature = "client")]
fn default_referral_fee_percent() -> u8 {
    REFERRAL_FEE_PERCENT
}

impl FeeParams {
    /// Flat fee in basis points with default splits
    pub fn flat(fee_bps: u64) -> Self {
        Self {
            base_fee: BaseFeeParams::FeeScheduler {
                starting_fee_bps: fee_bps,
                ending_fee_bps: fee_bps,
                number_of_period: 0,
                total_duration: 0,
                scheduler_mode: SchedulerMode::Linear,
            },
            dynamic_fee_enabled: false,
            collect_fee_mode: CollectFeeMode::QuoteToken,
            protocol_fee_percent: PROTOCOL_FEE_PERCENT,
            referral_fee_percent: REFERRAL_FEE_PERCENT,
        }
    }

    /// Resolve into a validated pool fee config
    pub fn build(&self) -> CoreResult<PoolFeesConfig> {
        let base_fee = match self.base_fee {
            BaseFeeParams::FeeScheduler {
                starting_fee_bps,
                ending_fee_bps,
                number_of_period,
                total_duration,
                scheduler_mode,
            } => get_base_fee_params(
                starting_fee_bps,
                ending_fee_bps,
                scheduler_mode.into(),
                number_of_period,
                total_duration,
            )?,
            BaseFeeParams::RateLimiter {
                base_fee_bps,
                fee_increment_bps,
                reference_amount,
                max_limiter_duration,
            } => get_rate_limiter_params(
                base_fee_bps,
                fee_increment_bps,
                reference_amount,
                max_limiter_duration,
            )?,
        };

        let dynamic_fee = if self.dynamic_fee_enabled {
            Some(get_dynamic_fee_params(
                self.base_fee.floor_fee_bps(),
                MAX_PRICE_CHANGE_BPS_DEFAULT,
            )?)
        } else {
            None
        };

        let config = PoolFeesConfig {
            base_fee,
            dynamic_fee,
            protocol_fee_percent: self.protocol_fee_percent,
            referral_fee_percent: self.referral_fee_percent,
            collect_fee_mode: self.collect_fee_mode,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Curve shape and its shape-specific targets. Amounts are in raw token units.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(tag = "kind", rename_all = "snake_case"))]
pub enum CurveShape {
    /// One segment ending where the migration threshold is reached
    Flat {
        percentage_supply_on_migration: u8,
        migration_quote_threshold: u64,
    },
    /// Two segments between the initial and migration market caps
    MarketCap {
        initial_market_cap: u64,
        migration_market_cap: u64,
        percentage_supply_on_migration: u8,
    },
    /// Sixteen geometric bins between the two market caps
    LiquidityWeighted {
        initial_market_cap: u64,
        migration_market_cap: u64,
        liquidity_weights: [u64; LIQUIDITY_WEIGHT_BINS],
    },
}

/// Everything `build_curve` needs
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct BuildCurveParams {
    pub total_token_supply: u64,
    pub shape: CurveShape,
    #[cfg_attr(feature = "client", serde(default))]
    pub migration_option: MigrationOption,
    #[cfg_attr(feature = "client", serde(default))]
    pub migration_fee_percent: u8,
    #[cfg_attr(feature = "client", serde(default))]
    pub leftover: u64,
    #[cfg_attr(feature = "client", serde(default))]
    pub locked_vesting: LockedVestingParams,
    pub fees: FeeParams,
}

// ============================================================================
// Build Output
// ============================================================================

/// Where every unit of the total supply goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct TokenAllocation {
    /// Base sold on the curve up to migration, including the swap buffer
    pub swap_amount: u64,
    /// Base seeded into the migrated pool
    pub migration_base_amount: u64,
    pub vesting_amount: u64,
    pub leftover: u64,
    /// Residual parked beyond the migration price
    pub padding: u64,
}

impl TokenAllocation {
    pub fn total(&self) -> CoreResult<u64> {
        [
            self.migration_base_amount,
            self.vesting_amount,
            self.leftover,
            self.padding,
        ]
        .iter()
        .try_fold(self.swap_amount, |acc, amount| safe_add_u64(acc, *amount))
    }
}

/// Intermediate result of a shape builder, before supply reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveDraft {
    pub curve: Curve,
    pub migration_quote_threshold: u64,
    pub migration_sqrt_price: u128,
}

/// A fully reconciled curve ready to be submitted
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct BuiltCurve {
    pub curve: Curve,
    pub fees: PoolFeesConfig,
    pub migration_quote_threshold: u64,
    /// Target price at which the pool migrates
    pub migration_sqrt_price: u128,
    pub locked_vesting: VestingSchedule,
    pub allocation: TokenAllocation,
}


// ============================================================================
// Entry Point
// ============================================================================

/// Build a curve and its fee config from launch targets.
///
/// Nothing is returned unless the curve validates and the allocation sums to
/// the total supply.
pub fn build_curve(params: &BuildCurveParams) -> CoreResult<BuiltCurve> {
    validate_build_params(params)?;

    let fees = params.fees.build()?;
    let vesting = params.locked_vesting;
    let locked_vesting = get_locked_vesting_params(
        vesting.total_locked_vesting_amount,
        vesting.number_of_vesting_period,
        vesting.cliff_unlock_amount,
        vesting.total_vesting_duration,
        vesting.cliff_duration_from_migration_time,
    )?;
    let vesting_amount = locked_vesting.total_amount()?;

    let draft = match &params.shape {
        CurveShape::Flat {
            percentage_supply_on_migration,
            migration_quote_threshold,
        } => build_single_segment_curve(
            params,
            vesting_amount,
            *percentage_supply_on_migration,
            *migration_quote_threshold,
        )?,
        CurveShape::MarketCap {
            initial_market_cap,
            migration_market_cap,
            percentage_supply_on_migration,
        } => build_two_segment_curve(
            params,
            vesting_amount,
            *initial_market_cap,
            *migration_market_cap,
            *percentage_supply_on_migration,
        )?,
        CurveShape::LiquidityWeighted {
            initial_market_cap,
            migration_market_cap,
            liquidity_weights,
        } => build_liquidity_weighted_curve(
            params,
            vesting_amount,
            *initial_market_cap,
            *migration_market_cap,
            liquidity_weights,
        )?,
    };

    let (curve, allocation) = reconcile_supply(
        draft.curve,
        params.total_token_supply,
        draft.migration_quote_threshold,
        vesting_amount,
        params.leftover,
        params.migration_option,
        params.migration_fee_percent,
    )?;
    validate_curve(&curve, draft.migration_sqrt_price)?;

    Ok(BuiltCurve {
        curve,
        fees,
        migration_quote_threshold: draft.migration_quote_threshold,
        migration_sqrt_price: draft.migration_sqrt_price,
        locked_vesting,
        allocation,
    })
}

// ============================================================================
// Price Helpers
// ============================================================================

/// `sqrt(numerator / denominator)` in Q64.64, rounded down, for a price in
/// raw quote units per raw base unit
pub fn get_sqrt_price_from_price(numerator: u128, denominator: u128) -> CoreResult<u128> {
    if denominator == 0 {
        return Err(CurveError::DivisionByZero);
    }
    let ratio = (BigUint::from(numerator) << 128u32) / BigUint::from(denominator);
    let sqrt_price = big_to_u128(&isqrt(&ratio))?;
    if !(MIN_SQRT_PRICE..=MAX_SQRT_PRICE).contains(&sqrt_price) {
        return Err(CurveError::invalid_parameter(
            "price",
            format!("sqrt price {} outside [{}, {}]", sqrt_price, MIN_SQRT_PRICE, MAX_SQRT_PRICE),
        ));
    }
    Ok(sqrt_price)
}

/// Sqrt price at which `total_supply` base units are worth `market_cap` quote units
pub fn get_sqrt_price_from_market_cap(market_cap: u64, total_supply: u64) -> CoreResult<u128> {
    get_sqrt_price_from_price(u128::from(market_cap), u128::from(total_supply))
}

// ============================================================================
// Migration Helpers
// ============================================================================

/// Quote left for the migrated pool after the migration fee, rounded down
pub fn get_migration_quote_amount_from_threshold(
    migration_quote_threshold: u64,
    migration_fee_percent: u8,
) -> CoreResult<u64> {
    let kept = safe_sub_u128(100, u128::from(migration_fee_percent))?;
    safe_cast_u128_to_u64(u128::from(migration_quote_threshold) * kept / 100)
}

/// Threshold that leaves `migration_quote_amount` after the migration fee, rounded down
pub fn get_migration_threshold_from_quote_amount(
    migration_quote_amount: u64,
    migration_fee_percent: u8,
) -> CoreResult<u64> {
    let kept = safe_sub_u128(100, u128::from(migration_fee_percent))?;
    if kept == 0 {
        return Err(CurveError::DivisionByZero);
    }
    safe_cast_u128_to_u64(u128::from(migration_quote_amount) * 100 / kept)
}

/// Base paired with `migration_quote_amount` in the migrated pool, rounded up
pub fn get_migration_base_token(
    migration_quote_amount: u64,
    sqrt_migration_price: u128,
    migration_option: MigrationOption,
) -> CoreResult<u64> {
    match migration_option {
        MigrationOption::ConstantProductV1 => {
            let price = BigUint::from(sqrt_migration_price) * BigUint::from(sqrt_migration_price);
            let quote = BigUint::from(migration_quote_amount) << 128u32;
            big_to_u64(&big_div_rounding(&quote, &price, Rounding::Up)?)
        }
        MigrationOption::ConstantProductV2 => {
            // Full-range pool seeded at the migration price from the quote side
            let liquidity = get_liquidity_from_delta_quote(
                migration_quote_amount,
                MIN_SQRT_PRICE,
                sqrt_migration_price,
            )?;
            let pool = ConstantProductPool::full_range(sqrt_migration_price, liquidity);
            get_base_amount_from_liquidity(pool.liquidity, pool.sqrt_price, pool.sqrt_max_price, Rounding::Up)
        }
    }
}

// ============================================================================
// Supply Accounting
// ============================================================================

/// Price the curve reaches once `migration_quote_threshold` quote has been paid in
pub fn get_migration_threshold_price(
    migration_quote_threshold: u64,
    curve: &Curve,
) -> CoreResult<u128> {
    if migration_quote_threshold == 0 {
        return Ok(curve.sqrt_start_price);
    }
    let result = curve.swap_exact_in(
        curve.sqrt_start_price,
        migration_quote_threshold,
        TradeDirection::QuoteToBase,
    )?;
    Ok(result.next_sqrt_price)
}

/// Base the curve sells between `sqrt_start_price` and `sqrt_migration_price`, rounded up
pub fn get_base_token_for_swap(
    sqrt_start_price: u128,
    sqrt_migration_price: u128,
    curve: &Curve,
) -> CoreResult<u64> {
    let mut total = U256::ZERO;
    let mut lower = sqrt_start_price;

    for segment in &curve.segments {
        let upper = segment.upper_sqrt_price.min(sqrt_migration_price);
        if upper > lower {
            let amount =
                get_delta_amount_base_unsigned_256(lower, upper, segment.liquidity, Rounding::Up)?;
            total = total.checked_add(amount).ok_or(CurveError::MathOverflow)?;
        }
        if segment.upper_sqrt_price >= sqrt_migration_price {
            break;
        }
        lower = segment.upper_sqrt_price;
    }

    u256_to_u64(total)
}

/// Swap amount plus the 25 % buffer, capped by what the whole curve can sell
pub fn get_swap_amount_with_buffer(swap_base_amount: u64, curve: &Curve) -> CoreResult<u64> {
    let buffer = u128::from(swap_base_amount) * u128::from(SWAP_BUFFER_PERCENTAGE) / 100;
    let with_buffer = u128::from(swap_base_amount) + buffer;
    let max_on_curve = get_base_token_for_swap(curve.sqrt_start_price, MAX_SQRT_PRICE, curve)?;
    Ok(u64::try_from(with_buffer.min(u128::from(max_on_curve))).unwrap_or(max_on_curve))
}

/// Minimum allocation the curve needs to reach migration, with no padding
pub fn get_minimum_allocation(
    migration_quote_threshold: u64,
    curve: &Curve,
    vesting_amount: u64,
    leftover: u64,
    migration_option: MigrationOption,
    migration_fee_percent: u8,
) -> CoreResult<TokenAllocation> {
    let sqrt_migration_price = get_migration_threshold_price(migration_quote_threshold, curve)?;
    let swap_base_amount =
        get_base_token_for_swap(curve.sqrt_start_price, sqrt_migration_price, curve)?;
    let swap_amount = get_swap_amount_with_buffer(swap_base_amount, curve)?;

    let migration_quote_amount =
        get_migration_quote_amount_from_threshold(migration_quote_threshold, migration_fee_percent)?;
    let migration_base_amount =
        get_migration_base_token(migration_quote_amount, sqrt_migration_price, migration_option)?;

    Ok(TokenAllocation {
        swap_amount,
        migration_base_amount,
        vesting_amount,
        leftover,
        padding: 0,
    })
}

/// Base supply the pool must hold for `curve` to reach migration
pub fn get_total_supply_from_curve(
    migration_quote_threshold: u64,
    curve: &Curve,
    vesting_amount: u64,
    leftover: u64,
    migration_option: MigrationOption,
    migration_fee_percent: u8,
) -> CoreResult<u64> {
    get_minimum_allocation(
        migration_quote_threshold,
        curve,
        vesting_amount,
        leftover,
        migration_option,
        migration_fee_percent,
    )?
    .total()
}

/// Close the gap between the curve's minimum supply and `total_supply`.
///
/// A surplus is parked in a padding segment above the last point. A shortfall
/// comes out of the leftover and must stay strictly below it.
pub fn reconcile_supply(
    mut curve: Curve,
    total_supply: u64,
    migration_quote_threshold: u64,
    vesting_amount: u64,
    leftover: u64,
    migration_option: MigrationOption,
    migration_fee_percent: u8,
) -> CoreResult<(Curve, TokenAllocation)> {
    let mut allocation = get_minimum_allocation(
        migration_quote_threshold,
        &curve,
        vesting_amount,
        leftover,
        migration_option,
        migration_fee_percent,
    )?;
    let dynamic_supply = allocation.total()?;

    let mut padding_liquidity = 0;
    if dynamic_supply > total_supply {
        let shortfall = dynamic_supply - total_supply;
        if shortfall >= leftover {
            return Err(CurveError::reconciliation(format!(
                "curve needs {} base but supply is {} and leftover only covers {}",
                dynamic_supply, total_supply, leftover
            )));
        }
        allocation.leftover = leftover - shortfall;
        debug!(shortfall, leftover = allocation.leftover, "shortfall taken from leftover");
    } else {
        let remaining = total_supply - dynamic_supply;
        allocation.padding = remaining;
        if remaining > 0 && !curve.is_terminated() {
            padding_liquidity =
                get_liquidity_from_delta_base(remaining, curve.terminal_sqrt_price(), MAX_SQRT_PRICE)?;
            if padding_liquidity > 0 {
                curve
                    .segments
                    .push(CurveSegment::new(MAX_SQRT_PRICE, padding_liquidity));
                debug!(remaining, padding_liquidity, "padding segment appended");
            }
        }
    }

    verify_conservation(
        &curve,
        &allocation,
        total_supply,
        migration_quote_threshold,
        migration_option,
        migration_fee_percent,
        padding_liquidity,
    )?;
    Ok((curve, allocation))
}

fn verify_conservation(
    curve: &Curve,
    allocation: &TokenAllocation,
    total_supply: u64,
    migration_quote_threshold: u64,
    migration_option: MigrationOption,
    migration_fee_percent: u8,
    padding_liquidity: u128,
) -> CoreResult<()> {
    let allocated = allocation.total()?;
    if allocated != total_supply {
        return Err(CurveError::reconciliation(format!(
            "allocation sums to {} instead of {}",
            allocated, total_supply
        )));
    }

    if padding_liquidity > 0 {
        let padding_start = curve
            .segments
            .iter()
            .rev()
            .nth(1)
            .map(|segment| segment.upper_sqrt_price)
            .unwrap_or(curve.sqrt_start_price);
        let padding_capacity = get_delta_amount_base_unsigned(
            padding_start,
            MAX_SQRT_PRICE,
            padding_liquidity,
            Rounding::Up,
        )?;
        if padding_capacity > allocation.padding {
            return Err(CurveError::reconciliation(format!(
                "padding segment sells {} but only {} is parked",
                padding_capacity, allocation.padding
            )));
        }
    }

    let minimum_supply = get_total_supply_from_curve(
        migration_quote_threshold,
        curve,
        allocation.vesting_amount,
        allocation.leftover,
        migration_option,
        migration_fee_percent,
    )?;
    if minimum_supply > total_supply {
        return Err(CurveError::reconciliation(format!(
            "padded curve needs {} base, supply is {}",
            minimum_supply, total_supply
        )));
    }

    debug!(total_supply, ?allocation, "token conservation verified");
    Ok(())
}

/// Base left for the curve once migration, vesting and leftover are set aside
pub(crate) fn get_swap_amount(
    total_supply: u64,
    migration_base_amount: u64,
    vesting_amount: u64,
    leftover: u64,
) -> CoreResult<u64> {
    let swap_amount = total_supply
        .checked_sub(migration_base_amount)
        .and_then(|amount| amount.checked_sub(vesting_amount))
        .and_then(|amount| amount.checked_sub(leftover))
        .ok_or_else(|| {
            CurveError::reconciliation(format!(
                "supply {} cannot cover migration {}, vesting {} and leftover {}",
                total_supply, migration_base_amount, vesting_amount, leftover
            ))
        })?;
    if swap_amount == 0 {
        return Err(CurveError::reconciliation("no supply left to sell on the curve"));
    }
    Ok(swap_amount)
}
