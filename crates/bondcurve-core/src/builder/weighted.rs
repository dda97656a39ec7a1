//! # Liquidity-Weighted Curve
//!
//! Sixteen geometric bins between the initial and migration market caps,
//! bin `i` carrying `l * k_i` liquidity. The common factor `l` is chosen so
//! the base sold on the curve plus the base migrated at the last price use
//! up everything except vesting and leftover:
//!
//! ```text
//! sum_i l k_i ((p_i - p_{i-1}) / (p_i p_{i-1}) + (p_i - p_{i-1}) (1 - f) / p_max^2)
//!     = supply - vesting - leftover
//! ```
//!
//! The migration threshold then follows from the base left for migration.

use num::rational::BigRational;
use num::{BigInt, BigUint};
use num_traits::{ToPrimitive, Zero};

use crate::builder::{
    get_base_token_for_swap, get_migration_threshold_from_quote_amount,
    get_sqrt_price_from_market_cap, get_swap_amount_with_buffer, BuildCurveParams, CurveDraft,
};
use crate::constants::{LIQUIDITY_WEIGHT_BINS, MAX_MIGRATION_FEE_PERCENTAGE};
use crate::errors::{CoreResult, CurveError};
use crate::math::big_int::big_to_u64;
use crate::math::fixed_point::sixteenth_root;
use crate::types::{Curve, CurveSegment};

pub fn build_liquidity_weighted_curve(
    params: &BuildCurveParams,
    vesting_amount: u64,
    initial_market_cap: u64,
    migration_market_cap: u64,
    liquidity_weights: &[u64; LIQUIDITY_WEIGHT_BINS],
) -> CoreResult<CurveDraft> {
    let total_supply = params.total_token_supply;
    let fee_percent = params.migration_fee_percent;

    if fee_percent > MAX_MIGRATION_FEE_PERCENTAGE {
        return Err(CurveError::invalid_parameter(
            "migration_fee_percent",
            format!("{} exceeds {}", fee_percent, MAX_MIGRATION_FEE_PERCENTAGE),
        ));
    }
    if liquidity_weights.iter().any(|weight| *weight == 0) {
        return Err(CurveError::invalid_parameter(
            "liquidity_weights",
            "every bin needs a positive weight",
        ));
    }

    let sqrt_min_price = get_sqrt_price_from_market_cap(initial_market_cap, total_supply)?;
    let sqrt_max_price = get_sqrt_price_from_market_cap(migration_market_cap, total_supply)?;
    let sqrt_prices = get_bin_sqrt_prices(sqrt_min_price, sqrt_max_price)?;

    let distributable = total_supply
        .checked_sub(params.leftover)
        .and_then(|amount| amount.checked_sub(vesting_amount))
        .ok_or_else(|| {
            CurveError::reconciliation(format!(
                "supply {} cannot cover vesting {} and leftover {}",
                total_supply, vesting_amount, params.leftover
            ))
        })?;

    let sum_factor = get_sum_factor(&sqrt_prices, liquidity_weights, fee_percent)?;
    let unit_liquidity = BigRational::from_integer(BigInt::from(distributable)) / sum_factor;

    let segments = liquidity_weights
        .iter()
        .zip(sqrt_prices.iter().skip(1))
        .map(|(weight, upper_sqrt_price)| {
            let liquidity = (unit_liquidity.clone() * BigInt::from(*weight)).floor().to_integer();
            liquidity
                .to_u128()
                .map(|liquidity| CurveSegment::new(*upper_sqrt_price, liquidity))
                .ok_or(CurveError::MathOverflow)
        })
        .collect::<CoreResult<Vec<_>>>()?;
    let curve = Curve::new(sqrt_min_price, segments)?;

    let swap_base_amount = get_base_token_for_swap(sqrt_min_price, sqrt_max_price, &curve)?;
    let swap_amount = get_swap_amount_with_buffer(swap_base_amount, &curve)?;
    let migration_amount = distributable.checked_sub(swap_amount).ok_or_else(|| {
        CurveError::reconciliation(format!(
            "curve sells {} base but only {} is distributable",
            swap_amount, distributable
        ))
    })?;

    let migration_quote_amount = big_to_u64(
        &((BigUint::from(migration_amount) * BigUint::from(sqrt_max_price) * BigUint::from(sqrt_max_price))
            >> 128u32),
    )?;
    let migration_quote_threshold =
        get_migration_threshold_from_quote_amount(migration_quote_amount, fee_percent)?;
    if migration_quote_threshold == 0 {
        return Err(CurveError::reconciliation("curve leaves nothing to migrate"));
    }

    Ok(CurveDraft {
        curve,
        migration_quote_threshold,
        migration_sqrt_price: sqrt_max_price,
    })
}

/// Bin edges `p_i = (p_min^(16-i) p_max^i)^(1/16)`, rounded down, with both
/// ends exact
pub fn get_bin_sqrt_prices(
    sqrt_min_price: u128,
    sqrt_max_price: u128,
) -> CoreResult<[u128; LIQUIDITY_WEIGHT_BINS + 1]> {
    let min = BigUint::from(sqrt_min_price);
    let max = BigUint::from(sqrt_max_price);
    let bins = LIQUIDITY_WEIGHT_BINS as u32;

    let mut sqrt_prices = [0u128; LIQUIDITY_WEIGHT_BINS + 1];
    sqrt_prices[0] = sqrt_min_price;
    sqrt_prices[LIQUIDITY_WEIGHT_BINS] = sqrt_max_price;
    for i in 1..bins {
        let product = min.pow(bins - i) * max.pow(i);
        sqrt_prices[i as usize] = sixteenth_root(&product)
            .to_u128()
            .ok_or(CurveError::MathOverflow)?;
    }

    if sqrt_prices.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(CurveError::invalid_parameter(
            "migration_market_cap",
            "market cap range too narrow for sixteen distinct bins",
        ));
    }
    Ok(sqrt_prices)
}

/// Base consumed per unit of `l`: swapped base over every bin plus the base
/// migrated against the quote collected in it
fn get_sum_factor(
    sqrt_prices: &[u128; LIQUIDITY_WEIGHT_BINS + 1],
    liquidity_weights: &[u64; LIQUIDITY_WEIGHT_BINS],
    fee_percent: u8,
) -> CoreResult<BigRational> {
    let sqrt_max = BigInt::from(sqrt_prices[LIQUIDITY_WEIGHT_BINS]);
    let migration_denominator = BigInt::from(100u32) * &sqrt_max * &sqrt_max;
    let kept_percent = BigInt::from(100u32 - u32::from(fee_percent));

    let mut sum_factor = BigRational::zero();
    for (i, weight) in liquidity_weights.iter().enumerate() {
        let lower = BigInt::from(sqrt_prices[i]);
        let upper = BigInt::from(sqrt_prices[i + 1]);
        let delta = &upper - &lower;

        let swapped = BigRational::new(delta.clone(), &upper * &lower);
        let migrated = BigRational::new(&delta * &kept_percent, migration_denominator.clone());
        sum_factor += (swapped + migrated) * BigInt::from(*weight);
    }

    if sum_factor.is_zero() {
        return Err(CurveError::DivisionByZero);
    }
    Ok(sum_factor)
}
