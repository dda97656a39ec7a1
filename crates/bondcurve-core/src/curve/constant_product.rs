//! # Constant Product Math
//!
//! Single-segment specialization used by the non-migrating pool: liquidity
//! and amount conversions over `[sqrt_min_price, sqrt_max_price]`, deposit and
//! withdraw quoting, and price impact.

use fixed::types::U64F64;
use num::BigUint;
use num_traits::ToPrimitive;

use crate::constants::{BASIS_POINT_MAX, RESOLUTION};
use crate::curve::LiquidityCurve;
use crate::errors::{CoreResult, CurveError};
use crate::math::big_int::{mul_div_u64, Rounding};
use crate::math::liquidity_math::{
    get_delta_amount_base_unsigned, get_delta_amount_quote_unsigned,
    get_liquidity_from_delta_base, get_liquidity_from_delta_quote,
};
use crate::math::safe_math::apply_slippage_bps;
use crate::types::{ConstantProductPool, DepositQuote, PriceSegment, TradeDirection, WithdrawQuote};

/// One-segment [`LiquidityCurve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProductCurve {
    pub sqrt_min_price: u128,
    pub sqrt_max_price: u128,
    pub liquidity: u128,
}

impl From<&ConstantProductPool> for ConstantProductCurve {
    fn from(pool: &ConstantProductPool) -> Self {
        Self {
            sqrt_min_price: pool.sqrt_min_price,
            sqrt_max_price: pool.sqrt_max_price,
            liquidity: pool.liquidity,
        }
    }
}

impl LiquidityCurve for ConstantProductCurve {
    fn segments(&self) -> Vec<PriceSegment> {
        vec![PriceSegment {
            lower_sqrt_price: self.sqrt_min_price,
            upper_sqrt_price: self.sqrt_max_price,
            liquidity: self.liquidity,
        }]
    }
}

// ============================================================================
// Liquidity <-> Amount
// ============================================================================

/// Liquidity provided by `base_amount` between the current and max price
pub fn get_liquidity_from_base_amount(
    base_amount: u64,
    sqrt_price: u128,
    sqrt_max_price: u128,
) -> CoreResult<u128> {
    get_liquidity_from_delta_base(base_amount, sqrt_price, sqrt_max_price)
}

/// Liquidity provided by `quote_amount` between the min and current price
pub fn get_liquidity_from_quote_amount(
    quote_amount: u64,
    sqrt_min_price: u128,
    sqrt_price: u128,
) -> CoreResult<u128> {
    get_liquidity_from_delta_quote(quote_amount, sqrt_min_price, sqrt_price)
}

pub fn get_base_amount_from_liquidity(
    liquidity: u128,
    sqrt_price: u128,
    sqrt_max_price: u128,
    rounding: Rounding,
) -> CoreResult<u64> {
    get_delta_amount_base_unsigned(sqrt_price, sqrt_max_price, liquidity, rounding)
}

pub fn get_quote_amount_from_liquidity(
    liquidity: u128,
    sqrt_min_price: u128,
    sqrt_price: u128,
    rounding: Rounding,
) -> CoreResult<u64> {
    get_delta_amount_quote_unsigned(sqrt_min_price, sqrt_price, liquidity, rounding)
}

// ============================================================================
// Deposit / Withdraw
// ============================================================================

fn validate_slippage(slippage_bps: u16) -> CoreResult<()> {
    if u64::from(slippage_bps) > BASIS_POINT_MAX {
        return Err(CurveError::invalid_parameter(
            "slippage_bps",
            format!("{} exceeds {}", slippage_bps, BASIS_POINT_MAX),
        ));
    }
    Ok(())
}

/// Most a depositor accepts to pay, `amount * (10000 + bps) / 10000` rounded up
fn add_slippage_bps(amount: u64, slippage_bps: u16) -> CoreResult<u64> {
    mul_div_u64(
        amount,
        BASIS_POINT_MAX + u64::from(slippage_bps),
        BASIS_POINT_MAX,
        Rounding::Up,
    )
}

/// Size a deposit from one side's `amount`.
///
/// Both owed amounts are recomputed from the liquidity delta and round up,
/// the way the pool charges them.
pub fn deposit_quote(
    pool: &ConstantProductPool,
    amount: u64,
    is_base: bool,
    slippage_bps: u16,
) -> CoreResult<DepositQuote> {
    pool.validate()?;
    validate_slippage(slippage_bps)?;
    if amount == 0 {
        return Err(CurveError::invalid_parameter("amount", "must be positive"));
    }

    let liquidity_delta = get_liquidity_for_one_side(pool, amount, is_base)?;
    if liquidity_delta == 0 {
        return Err(CurveError::invalid_parameter(
            "amount",
            "too small to mint any liquidity",
        ));
    }

    let base_amount = get_base_amount_from_liquidity(
        liquidity_delta,
        pool.sqrt_price,
        pool.sqrt_max_price,
        Rounding::Up,
    )?;
    let quote_amount = get_quote_amount_from_liquidity(
        liquidity_delta,
        pool.sqrt_min_price,
        pool.sqrt_price,
        Rounding::Up,
    )?;

    Ok(DepositQuote {
        liquidity_delta,
        base_amount,
        quote_amount,
        base_amount_threshold: add_slippage_bps(base_amount, slippage_bps)?,
        quote_amount_threshold: add_slippage_bps(quote_amount, slippage_bps)?,
    })
}

/// Liquidity worth `amount` of one side at the current price. A side whose
/// range is empty at the current price has no liquidity to price against.
fn get_liquidity_for_one_side(
    pool: &ConstantProductPool,
    amount: u64,
    is_base: bool,
) -> CoreResult<u128> {
    if is_base {
        if pool.sqrt_price == pool.sqrt_max_price {
            return Err(CurveError::invalid_parameter(
                "is_base",
                "pool sits at its max price and holds no base",
            ));
        }
        get_liquidity_from_base_amount(amount, pool.sqrt_price, pool.sqrt_max_price)
    } else {
        if pool.sqrt_price == pool.sqrt_min_price {
            return Err(CurveError::invalid_parameter(
                "is_base",
                "pool sits at its min price and holds no quote",
            ));
        }
        get_liquidity_from_quote_amount(amount, pool.sqrt_min_price, pool.sqrt_price)
    }
}

/// Withdraw the liquidity worth `amount` of one side
pub fn withdraw_quote(
    pool: &ConstantProductPool,
    amount: u64,
    is_base: bool,
    slippage_bps: u16,
) -> CoreResult<WithdrawQuote> {
    pool.validate()?;
    if amount == 0 {
        return Err(CurveError::invalid_parameter("amount", "must be positive"));
    }

    let liquidity_delta = get_liquidity_for_one_side(pool, amount, is_base)?;

    withdraw_quote_from_liquidity(pool, liquidity_delta, slippage_bps)
}

/// Amounts released by burning `liquidity_delta`, rounded down
pub fn withdraw_quote_from_liquidity(
    pool: &ConstantProductPool,
    liquidity_delta: u128,
    slippage_bps: u16,
) -> CoreResult<WithdrawQuote> {
    pool.validate()?;
    validate_slippage(slippage_bps)?;
    if liquidity_delta > pool.liquidity {
        return Err(CurveError::insufficient_liquidity(liquidity_delta - pool.liquidity));
    }

    let base_amount = get_base_amount_from_liquidity(
        liquidity_delta,
        pool.sqrt_price,
        pool.sqrt_max_price,
        Rounding::Down,
    )?;
    let quote_amount = get_quote_amount_from_liquidity(
        liquidity_delta,
        pool.sqrt_min_price,
        pool.sqrt_price,
        Rounding::Down,
    )?;

    Ok(WithdrawQuote {
        liquidity_delta,
        base_amount,
        quote_amount,
        min_base_amount: apply_slippage_bps(base_amount, slippage_bps)?,
        min_quote_amount: apply_slippage_bps(quote_amount, slippage_bps)?,
    })
}

// ============================================================================
// Price Impact
// ============================================================================

/// `|execution_price - spot_price| / spot_price` as a Q64.64 fraction.
///
/// Prices are quote per base. A buy that receives nothing saturates at
/// [`U64F64::MAX`].
pub fn get_price_impact(
    spot_sqrt_price: u128,
    amount_in: u64,
    amount_out: u64,
    direction: TradeDirection,
) -> CoreResult<U64F64> {
    if spot_sqrt_price == 0 {
        return Err(CurveError::ZeroPriceOrLiquidity);
    }
    if amount_in == 0 {
        return Ok(U64F64::ZERO);
    }

    // execution = quote / base
    let (quote_amount, base_amount) = match direction {
        TradeDirection::QuoteToBase => (amount_in, amount_out),
        TradeDirection::BaseToQuote => (amount_out, amount_in),
    };
    if base_amount == 0 {
        return Ok(U64F64::MAX);
    }

    let spot = BigUint::from(spot_sqrt_price) * BigUint::from(spot_sqrt_price);
    let execution = BigUint::from(quote_amount) << (RESOLUTION * 2);
    let scaled_spot = &spot * BigUint::from(base_amount);

    let difference = if execution >= scaled_spot {
        execution - &scaled_spot
    } else {
        scaled_spot.clone() - execution
    };

    let bits = (difference << RESOLUTION) / scaled_spot;
    Ok(bits
        .to_u128()
        .map(U64F64::from_bits)
        .unwrap_or(U64F64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_SQRT_PRICE, MIN_SQRT_PRICE, ONE_Q64};
    use crate::errors::ErrorKind;

    const LIQUIDITY: u128 = 1_000_000_000u128 << 64;

    fn bounded_pool() -> ConstantProductPool {
        ConstantProductPool {
            sqrt_price: 2 * ONE_Q64,
            liquidity: LIQUIDITY,
            sqrt_min_price: ONE_Q64,
            sqrt_max_price: 4 * ONE_Q64,
        }
    }

    #[test]
    fn test_amount_conversions() {
        let pool = bounded_pool();
        // L (1/2 - 1/4) and L (2 - 1)
        let base =
            get_base_amount_from_liquidity(LIQUIDITY, pool.sqrt_price, pool.sqrt_max_price, Rounding::Down)
                .unwrap();
        let quote =
            get_quote_amount_from_liquidity(LIQUIDITY, pool.sqrt_min_price, pool.sqrt_price, Rounding::Down)
                .unwrap();
        assert_eq!(base, 250_000_000);
        assert_eq!(quote, 1_000_000_000);

        assert_eq!(
            get_liquidity_from_base_amount(base, pool.sqrt_price, pool.sqrt_max_price).unwrap(),
            LIQUIDITY
        );
        assert_eq!(
            get_liquidity_from_quote_amount(quote, pool.sqrt_min_price, pool.sqrt_price).unwrap(),
            LIQUIDITY
        );
    }

    #[test]
    fn test_deposit_quote() {
        let pool = bounded_pool();

        let quote = deposit_quote(&pool, 250_000_000, true, 100).unwrap();
        assert_eq!(quote.liquidity_delta, LIQUIDITY);
        assert_eq!(quote.base_amount, 250_000_000);
        assert_eq!(quote.quote_amount, 1_000_000_000);
        assert_eq!(quote.base_amount_threshold, 252_500_000);
        assert_eq!(quote.quote_amount_threshold, 1_010_000_000);

        let from_quote = deposit_quote(&pool, 1_000_000_000, false, 0).unwrap();
        assert_eq!(from_quote.liquidity_delta, LIQUIDITY);
        assert_eq!(from_quote.base_amount, 250_000_000);
    }

    #[test]
    fn test_deposit_rejects_bad_input() {
        let pool = bounded_pool();
        assert!(deposit_quote(&pool, 0, true, 0).is_err());
        assert!(deposit_quote(&pool, 1, true, 10_001).is_err());

        let mut at_max = pool;
        at_max.sqrt_price = at_max.sqrt_max_price;
        let err = deposit_quote(&at_max, 1_000, true, 0).unwrap_err();
        assert!(matches!(err, CurveError::InvalidParameter { field: "is_base", .. }));
        // The quote side still prices
        assert!(deposit_quote(&at_max, 1_000_000_000, false, 0).is_ok());

        let mut at_min = pool;
        at_min.sqrt_price = at_min.sqrt_min_price;
        let err = deposit_quote(&at_min, 1_000, false, 0).unwrap_err();
        assert!(matches!(err, CurveError::InvalidParameter { field: "is_base", .. }));
        let err = withdraw_quote(&at_min, 1_000, false, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_withdraw_quote() {
        let pool = bounded_pool();

        let quote = withdraw_quote_from_liquidity(&pool, LIQUIDITY / 2, 50).unwrap();
        assert_eq!(quote.base_amount, 125_000_000);
        assert_eq!(quote.quote_amount, 500_000_000);
        assert_eq!(quote.min_base_amount, 124_375_000);
        assert_eq!(quote.min_quote_amount, 497_500_000);

        let by_amount = withdraw_quote(&pool, 125_000_000, true, 0).unwrap();
        assert_eq!(by_amount.liquidity_delta, LIQUIDITY / 2);
        assert_eq!(by_amount.quote_amount, 500_000_000);

        let err = withdraw_quote_from_liquidity(&pool, LIQUIDITY + 1, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientLiquidity);
    }

    #[test]
    fn test_constant_product_curve_swap() {
        let pool = bounded_pool();
        let curve = ConstantProductCurve::from(&pool);

        let result = curve
            .swap_exact_in(pool.sqrt_price, 1_000_000_000, TradeDirection::QuoteToBase)
            .unwrap();
        assert_eq!(result.next_sqrt_price, 3 * ONE_Q64);
        // L (1/2 - 1/3)
        assert_eq!(result.output_amount, 166_666_666);

        // Only 5e8 base fits between 1 and 2
        let err = curve
            .swap_exact_in(pool.sqrt_price, 500_000_001, TradeDirection::BaseToQuote)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientLiquidity);
    }

    #[test]
    fn test_full_range_pool() {
        let pool = ConstantProductPool::full_range(ONE_Q64, LIQUIDITY);
        let curve = ConstantProductCurve::from(&pool);
        assert_eq!(curve.sqrt_price_range(), (MIN_SQRT_PRICE, MAX_SQRT_PRICE));

        let result = curve
            .swap_exact_in(ONE_Q64, 1_000_000_000, TradeDirection::BaseToQuote)
            .unwrap();
        assert_eq!(result.next_sqrt_price, ONE_Q64 / 2);
        assert_eq!(result.output_amount, 500_000_000);
    }

    #[test]
    fn test_price_impact() {
        // Spot 1.0, paying 2 quote per base is a 100% impact
        let impact = get_price_impact(ONE_Q64, 2_000, 1_000, TradeDirection::QuoteToBase).unwrap();
        assert_eq!(impact, U64F64::from_num(1));

        // Selling 1000 base for 750 quote at spot 1.0
        let impact = get_price_impact(ONE_Q64, 1_000, 750, TradeDirection::BaseToQuote).unwrap();
        assert_eq!(impact, U64F64::from_num(0.25));

        // Spot 4.0, buying at exactly spot
        let impact = get_price_impact(2 * ONE_Q64, 4_000, 1_000, TradeDirection::QuoteToBase).unwrap();
        assert_eq!(impact, U64F64::ZERO);

        assert_eq!(
            get_price_impact(ONE_Q64, 10, 0, TradeDirection::QuoteToBase).unwrap(),
            U64F64::MAX
        );
        assert_eq!(
            get_price_impact(ONE_Q64, 0, 0, TradeDirection::BaseToQuote).unwrap(),
            U64F64::ZERO
        );
        assert!(get_price_impact(0, 1, 1, TradeDirection::BaseToQuote).is_err());
    }
}
