//! # Two-Segment Curve
//!
//! Curve between an initial and a migration market cap, bent at a mid price.
//! For a mid price `p1` between start `p0` and migration `p2`, the two segment
//! liquidities solve
//!
//! ```text
//! swap      = l0 (1/p0 - 1/p1) + l1 (1/p1 - 1/p2)
//! threshold = l0 (p1 - p0)     + l1 (p2 - p1)
//! ```
//!
//! Not every mid price admits a positive solution. Three geometric means are
//! tried in order and the first feasible one is kept.

use num::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive, Zero};
use tracing::debug;

use crate::builder::{
    get_migration_base_token, get_migration_threshold_from_quote_amount,
    get_sqrt_price_from_market_cap, get_sqrt_price_from_price, get_swap_amount, BuildCurveParams,
    CurveDraft,
};
use crate::errors::{CoreResult, CurveError};
use crate::math::fixed_point::{fourth_root, isqrt};
use crate::math::safe_math::safe_cast_u128_to_u64;
use crate::types::{Curve, CurveSegment};

pub fn build_two_segment_curve(
    params: &BuildCurveParams,
    vesting_amount: u64,
    initial_market_cap: u64,
    migration_market_cap: u64,
    percentage_supply_on_migration: u8,
) -> CoreResult<CurveDraft> {
    let total_supply = params.total_token_supply;

    let migration_base_supply =
        u128::from(total_supply) * u128::from(percentage_supply_on_migration) / 100;
    let migration_quote_amount = safe_cast_u128_to_u64(
        u128::from(migration_market_cap) * u128::from(percentage_supply_on_migration) / 100,
    )?;
    if migration_base_supply == 0 || migration_quote_amount == 0 {
        return Err(CurveError::invalid_parameter(
            "percentage_supply_on_migration",
            "leaves nothing to migrate",
        ));
    }

    let migration_quote_threshold =
        get_migration_threshold_from_quote_amount(migration_quote_amount, params.migration_fee_percent)?;
    let migration_sqrt_price =
        get_sqrt_price_from_price(u128::from(migration_quote_amount), migration_base_supply)?;
    let migration_base_amount = get_migration_base_token(
        migration_quote_amount,
        migration_sqrt_price,
        params.migration_option,
    )?;
    let swap_amount = get_swap_amount(
        total_supply,
        migration_base_amount,
        vesting_amount,
        params.leftover,
    )?;

    let sqrt_start_price = get_sqrt_price_from_market_cap(initial_market_cap, total_supply)?;
    if sqrt_start_price >= migration_sqrt_price {
        return Err(CurveError::invalid_parameter(
            "initial_market_cap",
            "start price must be below the migration price",
        ));
    }

    for (index, mid_sqrt_price) in mid_price_candidates(sqrt_start_price, migration_sqrt_price)
        .into_iter()
        .enumerate()
    {
        match solve_two_segments(
            sqrt_start_price,
            mid_sqrt_price,
            migration_sqrt_price,
            swap_amount,
            migration_quote_threshold,
        ) {
            Some((liquidity_0, liquidity_1)) => {
                debug!(index, mid_sqrt_price, "mid price candidate accepted");
                let curve = Curve::new(
                    sqrt_start_price,
                    vec![
                        CurveSegment::new(mid_sqrt_price, liquidity_0),
                        CurveSegment::new(migration_sqrt_price, liquidity_1),
                    ],
                )?;
                return Ok(CurveDraft {
                    curve,
                    migration_quote_threshold,
                    migration_sqrt_price,
                });
            }
            None => debug!(index, mid_sqrt_price, "mid price candidate rejected"),
        }
    }

    Err(CurveError::reconciliation(format!(
        "no mid price between {} and {} gives positive liquidity for both segments",
        sqrt_start_price, migration_sqrt_price
    )))
}

/// `sqrt(p0 p2)`, `(p0 p2^3)^(1/4)` and `(p0^3 p2)^(1/4)`, all rounded down
pub fn mid_price_candidates(sqrt_start_price: u128, sqrt_migration_price: u128) -> [u128; 3] {
    let p0 = BigUint::from(sqrt_start_price);
    let p2 = BigUint::from(sqrt_migration_price);

    let candidates = [
        isqrt(&(&p0 * &p2)),
        fourth_root(&(&p0 * p2.pow(3))),
        fourth_root(&(p0.pow(3) * &p2)),
    ];
    // Geometric means of two u128 values always fit back into u128
    candidates.map(|candidate| candidate.to_u128().unwrap_or(sqrt_start_price))
}

/// Segment liquidities for mid price `p1`, or `None` when either would be
/// zero or negative.
///
/// Closed form of the 2x2 system, with `Q = threshold << 128`:
/// `l0 = p0 (S p1 p2 - Q) / ((p1 - p0)(p2 - p0))` and
/// `l1 = p2 (Q - S p0 p1) / ((p2 - p1)(p2 - p0))`, both rounded down.
pub fn solve_two_segments(
    sqrt_start_price: u128,
    mid_sqrt_price: u128,
    sqrt_migration_price: u128,
    swap_amount: u64,
    migration_quote_threshold: u64,
) -> Option<(u128, u128)> {
    if !(sqrt_start_price < mid_sqrt_price && mid_sqrt_price < sqrt_migration_price) {
        return None;
    }

    let p0 = BigInt::from(sqrt_start_price);
    let p1 = BigInt::from(mid_sqrt_price);
    let p2 = BigInt::from(sqrt_migration_price);
    let swap = BigInt::from(swap_amount);
    let quote = BigInt::from(migration_quote_threshold) << 128u32;

    let numerator_0 = &swap * &p1 * &p2 - &quote;
    let numerator_1 = &quote - &swap * &p0 * &p1;
    if numerator_0.is_negative() || numerator_1.is_negative() {
        return None;
    }

    let span = &p2 - &p0;
    let liquidity_0 = (&p0 * numerator_0) / ((&p1 - &p0) * &span);
    let liquidity_1 = (&p2 * numerator_1) / ((&p2 - &p1) * &span);
    if liquidity_0.is_zero() || liquidity_1.is_zero() {
        return None;
    }

    Some((liquidity_0.to_u128()?, liquidity_1.to_u128()?))
}
