//! # Liquidity Curves
//!
//! Both pool kinds price along constant-liquidity segments: the bonding curve
//! has up to [`MAX_CURVE_POINT`](crate::constants::MAX_CURVE_POINT) of them, a
//! constant-product position has exactly one. Swaps walk the segments with
//! the same step function in either case.

pub mod bonding;
pub mod constant_product;

pub use constant_product::*;

use ethnum::U256;

use crate::errors::{CoreResult, CurveError};
use crate::math::big_int::{u256_to_u64, Rounding};
use crate::math::liquidity_math::{
    get_delta_amount_base_unsigned, get_delta_amount_base_unsigned_256,
    get_delta_amount_quote_unsigned, get_delta_amount_quote_unsigned_256,
    get_next_sqrt_price_from_input,
};
use crate::math::safe_math::safe_add_u64;
use crate::types::{PriceSegment, SwapAmount, TradeDirection};

/// A price curve made of constant-liquidity segments
pub trait LiquidityCurve {
    /// Segments in increasing price order, adjacent and non-overlapping
    fn segments(&self) -> Vec<PriceSegment>;

    /// Lowest and highest sqrt price the curve covers
    fn sqrt_price_range(&self) -> (u128, u128) {
        let segments = self.segments();
        let lower = segments.first().map(|s| s.lower_sqrt_price).unwrap_or(0);
        let upper = segments.last().map(|s| s.upper_sqrt_price).unwrap_or(0);
        (lower, upper)
    }

    /// Most input the curve absorbs from `sqrt_price` in `direction`, rounded up
    fn max_amount_in(&self, sqrt_price: u128, direction: TradeDirection) -> CoreResult<U256> {
        let mut total = U256::ZERO;
        for segment in self.segments() {
            let amount = match direction {
                TradeDirection::QuoteToBase if segment.upper_sqrt_price > sqrt_price => {
                    get_delta_amount_quote_unsigned_256(
                        sqrt_price.max(segment.lower_sqrt_price),
                        segment.upper_sqrt_price,
                        segment.liquidity,
                        Rounding::Up,
                    )?
                }
                TradeDirection::BaseToQuote if segment.lower_sqrt_price < sqrt_price => {
                    get_delta_amount_base_unsigned_256(
                        segment.lower_sqrt_price,
                        sqrt_price.min(segment.upper_sqrt_price),
                        segment.liquidity,
                        Rounding::Up,
                    )?
                }
                _ => U256::ZERO,
            };
            total = total.checked_add(amount).ok_or(CurveError::MathOverflow)?;
        }
        Ok(total)
    }

    /// Walk the curve from `sqrt_price` absorbing all of `amount_in`.
    ///
    /// Fails with `InsufficientLiquidity` instead of returning a partial fill.
    fn swap_exact_in(
        &self,
        sqrt_price: u128,
        amount_in: u64,
        direction: TradeDirection,
    ) -> CoreResult<SwapAmount> {
        swap_across_segments(&self.segments(), sqrt_price, amount_in, direction)
    }
}

/// One step inside a single segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SwapStep {
    pub next_sqrt_price: u128,
    pub amount_in: u64,
    pub amount_out: u64,
}

/// Buy base inside `[current, upper]`
pub(crate) fn step_quote_to_base(
    current_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    amount_left: u64,
) -> CoreResult<SwapStep> {
    let max_amount_in = get_delta_amount_quote_unsigned_256(
        current_sqrt_price,
        upper_sqrt_price,
        liquidity,
        Rounding::Up,
    )?;

    if U256::from(amount_left) < max_amount_in {
        let next_sqrt_price =
            get_next_sqrt_price_from_input(current_sqrt_price, liquidity, amount_left, false)?;
        let amount_out = get_delta_amount_base_unsigned(
            current_sqrt_price,
            next_sqrt_price,
            liquidity,
            Rounding::Down,
        )?;
        Ok(SwapStep {
            next_sqrt_price,
            amount_in: amount_left,
            amount_out,
        })
    } else {
        let amount_out = get_delta_amount_base_unsigned(
            current_sqrt_price,
            upper_sqrt_price,
            liquidity,
            Rounding::Down,
        )?;
        Ok(SwapStep {
            next_sqrt_price: upper_sqrt_price,
            amount_in: u256_to_u64(max_amount_in)?,
            amount_out,
        })
    }
}

/// Sell base inside `[lower, current]`
pub(crate) fn step_base_to_quote(
    lower_sqrt_price: u128,
    current_sqrt_price: u128,
    liquidity: u128,
    amount_left: u64,
) -> CoreResult<SwapStep> {
    let max_amount_in = get_delta_amount_base_unsigned_256(
        lower_sqrt_price,
        current_sqrt_price,
        liquidity,
        Rounding::Up,
    )?;

    if U256::from(amount_left) < max_amount_in {
        let next_sqrt_price =
            get_next_sqrt_price_from_input(current_sqrt_price, liquidity, amount_left, true)?;
        let amount_out = get_delta_amount_quote_unsigned(
            next_sqrt_price,
            current_sqrt_price,
            liquidity,
            Rounding::Down,
        )?;
        Ok(SwapStep {
            next_sqrt_price,
            amount_in: amount_left,
            amount_out,
        })
    } else {
        let amount_out = get_delta_amount_quote_unsigned(
            lower_sqrt_price,
            current_sqrt_price,
            liquidity,
            Rounding::Down,
        )?;
        Ok(SwapStep {
            next_sqrt_price: lower_sqrt_price,
            amount_in: u256_to_u64(max_amount_in)?,
            amount_out,
        })
    }
}

/// Walk `segments` from `sqrt_price` until `amount_in` is used up
pub(crate) fn swap_across_segments(
    segments: &[PriceSegment],
    sqrt_price: u128,
    amount_in: u64,
    direction: TradeDirection,
) -> CoreResult<SwapAmount> {
    let (lower_bound, upper_bound) = match (segments.first(), segments.last()) {
        (Some(first), Some(last)) => (first.lower_sqrt_price, last.upper_sqrt_price),
        _ => return Err(CurveError::InvalidCurve("curve has no points")),
    };
    if sqrt_price < lower_bound || sqrt_price > upper_bound {
        return Err(CurveError::invalid_parameter(
            "sqrt_price",
            format!("{} outside curve range [{}, {}]", sqrt_price, lower_bound, upper_bound),
        ));
    }

    let mut current_sqrt_price = sqrt_price;
    let mut amount_left = amount_in;
    let mut output_amount = 0u64;

    match direction {
        TradeDirection::QuoteToBase => {
            for segment in segments {
                if amount_left == 0 {
                    break;
                }
                if segment.upper_sqrt_price <= current_sqrt_price {
                    continue;
                }
                // Empty segments are crossed for free
                if segment.liquidity == 0 {
                    current_sqrt_price = segment.upper_sqrt_price;
                    continue;
                }
                let step = step_quote_to_base(
                    current_sqrt_price,
                    segment.upper_sqrt_price,
                    segment.liquidity,
                    amount_left,
                )?;
                output_amount = safe_add_u64(output_amount, step.amount_out)?;
                amount_left -= step.amount_in;
                current_sqrt_price = step.next_sqrt_price;
            }
        }
        TradeDirection::BaseToQuote => {
            for segment in segments.iter().rev() {
                if amount_left == 0 {
                    break;
                }
                if segment.lower_sqrt_price >= current_sqrt_price {
                    continue;
                }
                if segment.liquidity == 0 {
                    current_sqrt_price = segment.lower_sqrt_price;
                    continue;
                }
                let step = step_base_to_quote(
                    segment.lower_sqrt_price,
                    current_sqrt_price,
                    segment.liquidity,
                    amount_left,
                )?;
                output_amount = safe_add_u64(output_amount, step.amount_out)?;
                amount_left -= step.amount_in;
                current_sqrt_price = step.next_sqrt_price;
            }
        }
    }

    if amount_left > 0 {
        return Err(CurveError::insufficient_liquidity(amount_left));
    }

    Ok(SwapAmount {
        output_amount,
        next_sqrt_price: current_sqrt_price,
    })
}
