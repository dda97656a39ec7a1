//! # Liquidity Math
//!
//! Closed-form token deltas for a constant-liquidity price range and the
//! next-price solutions used when walking a curve. Prices are Q64.64 sqrt
//! prices, liquidity is scaled so that `liquidity * sqrt_price / 2^128` is a
//! quote amount.
//!
//! Rounding is always explicit. Amounts a trader pays round up, amounts a
//! trader receives round down.

use ethnum::U256;
use num::BigUint;

use crate::constants::RESOLUTION;
use crate::errors::{CoreResult, CurveError};
use crate::math::big_int::{
    big_div_rounding, big_to_u128, checked_shl, div_rounding, mul_div, shr_rounding, u256_to_u128,
    u256_to_u64, Rounding,
};

fn check_range(lower_sqrt_price: u128, upper_sqrt_price: u128) -> CoreResult<()> {
    if lower_sqrt_price == 0 || upper_sqrt_price == 0 {
        return Err(CurveError::ZeroPriceOrLiquidity);
    }
    if lower_sqrt_price > upper_sqrt_price {
        return Err(CurveError::MathUnderflow);
    }
    Ok(())
}

// ============================================================================
// Token Deltas
// ============================================================================

/// Base amount spanned by `[lower, upper]` at constant liquidity:
/// `L * (upper - lower) / (lower * upper)`
pub fn get_delta_amount_base_unsigned_256(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    rounding: Rounding,
) -> CoreResult<U256> {
    check_range(lower_sqrt_price, upper_sqrt_price)?;

    let numerator_1 = U256::from(liquidity);
    let numerator_2 = U256::from(upper_sqrt_price - lower_sqrt_price);
    let denominator = U256::from(lower_sqrt_price)
        .checked_mul(U256::from(upper_sqrt_price))
        .ok_or(CurveError::MathOverflow)?;

    mul_div(numerator_1, numerator_2, denominator, rounding)
}

pub fn get_delta_amount_base_unsigned(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    rounding: Rounding,
) -> CoreResult<u64> {
    let result =
        get_delta_amount_base_unsigned_256(lower_sqrt_price, upper_sqrt_price, liquidity, rounding)?;
    u256_to_u64(result)
}

/// Quote amount spanned by `[lower, upper]` at constant liquidity:
/// `L * (upper - lower) / 2^128`
pub fn get_delta_amount_quote_unsigned_256(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    rounding: Rounding,
) -> CoreResult<U256> {
    check_range(lower_sqrt_price, upper_sqrt_price)?;

    let delta_sqrt_price = U256::from(upper_sqrt_price - lower_sqrt_price);
    let product = U256::from(liquidity)
        .checked_mul(delta_sqrt_price)
        .ok_or(CurveError::MathOverflow)?;

    shr_rounding(product, RESOLUTION * 2, rounding)
}

pub fn get_delta_amount_quote_unsigned(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    rounding: Rounding,
) -> CoreResult<u64> {
    let result = get_delta_amount_quote_unsigned_256(
        lower_sqrt_price,
        upper_sqrt_price,
        liquidity,
        rounding,
    )?;
    u256_to_u64(result)
}

// ============================================================================
// Next Sqrt Price
// ============================================================================

/// Sqrt price reached after `amount_in` enters the pool.
///
/// Base in (selling base) pushes the price down, quote in pushes it up.
pub fn get_next_sqrt_price_from_input(
    sqrt_price: u128,
    liquidity: u128,
    amount_in: u64,
    base_for_quote: bool,
) -> CoreResult<u128> {
    if sqrt_price == 0 || liquidity == 0 {
        return Err(CurveError::ZeroPriceOrLiquidity);
    }

    if base_for_quote {
        get_next_sqrt_price_from_amount_base_rounding_up(sqrt_price, liquidity, amount_in)
    } else {
        get_next_sqrt_price_from_amount_quote_rounding_down(sqrt_price, liquidity, amount_in)
    }
}


/// √P' = √P * L / (L + Δx * √P)
fn get_next_sqrt_price_from_amount_base_rounding_up(
    sqrt_price: u128,
    liquidity: u128,
    amount: u64,
) -> CoreResult<u128> {
    if amount == 0 {
        return Ok(sqrt_price);
    }

    let sqrt_price = U256::from(sqrt_price);
    let liquidity = U256::from(liquidity);

    let product = U256::from(amount)
        .checked_mul(sqrt_price)
        .ok_or(CurveError::MathOverflow)?;
    let denominator = liquidity
        .checked_add(product)
        .ok_or(CurveError::MathOverflow)?;
    if denominator == U256::ZERO {
        return Err(CurveError::NonPositiveDenominator);
    }

    let result = mul_div(liquidity, sqrt_price, denominator, Rounding::Up)?;
    u256_to_u128(result)
}

/// √P' = √P + Δy / L
fn get_next_sqrt_price_from_amount_quote_rounding_down(
    sqrt_price: u128,
    liquidity: u128,
    amount: u64,
) -> CoreResult<u128> {
    let quotient = checked_shl(U256::from(amount), RESOLUTION * 2)? / U256::from(liquidity);
    let result = U256::from(sqrt_price)
        .checked_add(quotient)
        .ok_or(CurveError::MathOverflow)?;
    u256_to_u128(result)
}

// ============================================================================
// Liquidity From Amounts
// ============================================================================

/// Liquidity that spans exactly `base_amount` over `[lower, upper]`, rounded down:
/// `amount * lower * upper / (upper - lower)`
pub fn get_liquidity_from_delta_base(
    base_amount: u64,
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
) -> CoreResult<u128> {
    check_range(lower_sqrt_price, upper_sqrt_price)?;
    if lower_sqrt_price == upper_sqrt_price {
        return Err(CurveError::DivisionByZero);
    }

    let product = BigUint::from(base_amount)
        * BigUint::from(lower_sqrt_price)
        * BigUint::from(upper_sqrt_price);
    let delta = BigUint::from(upper_sqrt_price - lower_sqrt_price);
    big_to_u128(&big_div_rounding(&product, &delta, Rounding::Down)?)
}

/// Liquidity that spans exactly `quote_amount` over `[lower, upper]`, rounded down:
/// `(amount << 128) / (upper - lower)`
pub fn get_liquidity_from_delta_quote(
    quote_amount: u64,
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
) -> CoreResult<u128> {
    check_range(lower_sqrt_price, upper_sqrt_price)?;

    let shifted = checked_shl(U256::from(quote_amount), RESOLUTION * 2)?;
    let delta = U256::from(upper_sqrt_price - lower_sqrt_price);
    u256_to_u128(div_rounding(shifted, delta, Rounding::Down)?)
}
