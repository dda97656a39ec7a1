//! # Swap Quoting
//!
//! One exact-in trade against any [`LiquidityCurve`]: fee on input or output
//! per the pool's collect mode, a full curve walk, slippage and price impact.

use tracing::trace;

use crate::curve::{get_price_impact, LiquidityCurve};
use crate::errors::{CoreResult, CurveError};
use crate::fees::FeeEngine;
use crate::math::safe_math::apply_slippage_bps;
use crate::types::{FeeMode, FeeOnAmountResult, PoolFeesConfig, PoolSnapshot, QuoteResult, SwapQuoteParams};

/// Quote an exact-in swap.
///
/// Either returns a complete quote or an error, never a partial fill.
pub fn swap_quote<C: LiquidityCurve + ?Sized>(
    curve: &C,
    fees: &PoolFeesConfig,
    pool: &PoolSnapshot,
    params: &SwapQuoteParams,
) -> CoreResult<QuoteResult> {
    if params.amount_in == 0 {
        return Err(CurveError::invalid_parameter("amount_in", "must be positive"));
    }
    if pool.is_completed() {
        return Err(CurveError::PoolCompleted);
    }

    let engine = FeeEngine::new(fees);
    let fee_mode = FeeMode::resolve(fees.collect_fee_mode, params.direction, params.has_referral);

    let fee_numerator = engine.get_total_fee_numerator(
        &pool.volatility_tracker,
        params.current_point,
        pool.activation_point,
        params.direction,
        params.amount_in,
    )?;

    let (amount_in, input_fee) = if fee_mode.fees_on_input {
        let result = engine.get_fee_on_amount(params.amount_in, fee_numerator, fee_mode.has_referral)?;
        (result.amount, result)
    } else {
        (params.amount_in, FeeOnAmountResult::default())
    };

    let swap = curve.swap_exact_in(pool.sqrt_price, amount_in, params.direction)?;

    let (amount_out, fee) = if fee_mode.fees_on_input {
        (swap.output_amount, input_fee)
    } else {
        let result =
            engine.get_fee_on_amount(swap.output_amount, fee_numerator, fee_mode.has_referral)?;
        (result.amount, result)
    };

    let minimum_amount_out = apply_slippage_bps(amount_out, params.slippage_bps)?;
    let price_impact =
        get_price_impact(pool.sqrt_price, amount_in, swap.output_amount, params.direction)?;

    trace!(
        direction = ?params.direction,
        amount_in = params.amount_in,
        amount_out,
        fee_numerator,
        next_sqrt_price = swap.next_sqrt_price,
        "swap quoted"
    );

    Ok(QuoteResult {
        amount_out,
        minimum_amount_out,
        next_sqrt_price: swap.next_sqrt_price,
        trading_fee: fee.trading_fee,
        protocol_fee: fee.protocol_fee,
        referral_fee: fee.referral_fee,
        fee_numerator,
        price_impact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ONE_Q64;
    use crate::curve::ConstantProductCurve;
    use crate::errors::ErrorKind;
    use crate::fees::get_rate_limiter_params;
    use crate::types::{BaseFeeConfig, CollectFeeMode, Curve, CurveSegment, TradeDirection};
    use fixed::types::U64F64;

    const LIQUIDITY: u128 = 1_000_000_000u128 << 64;

    fn curve() -> Curve {
        Curve::new(
            ONE_Q64,
            vec![
                CurveSegment::new(2 * ONE_Q64, LIQUIDITY),
                CurveSegment::new(4 * ONE_Q64, 2 * LIQUIDITY),
            ],
        )
        .unwrap()
    }

    fn fees(collect_fee_mode: CollectFeeMode) -> PoolFeesConfig {
        PoolFeesConfig {
            base_fee: BaseFeeConfig {
                cliff_fee_numerator: 10_000_000,
                ..Default::default()
            },
            collect_fee_mode,
            ..Default::default()
        }
    }

    fn pool(sqrt_price: u128) -> PoolSnapshot {
        PoolSnapshot {
            sqrt_price,
            migration_quote_threshold: Some(5_000_000_000),
            ..Default::default()
        }
    }

    fn params(amount_in: u64, direction: TradeDirection) -> SwapQuoteParams {
        SwapQuoteParams {
            amount_in,
            direction,
            current_point: 0,
            slippage_bps: 100,
            has_referral: false,
        }
    }

    #[test]
    fn test_buy_fee_on_input() {
        let quote = swap_quote(
            &curve(),
            &fees(CollectFeeMode::QuoteToken),
            &pool(ONE_Q64),
            &params(1_010_101_011, TradeDirection::QuoteToBase),
        )
        .unwrap();

        // 1% of 1_010_101_011 rounds up to 10_101_011, leaving exactly 1e9
        assert_eq!(quote.trading_fee + quote.protocol_fee, 10_101_011);
        assert_eq!(quote.protocol_fee, 2_020_202);
        assert_eq!(quote.next_sqrt_price, 2 * ONE_Q64);
        assert_eq!(quote.amount_out, 500_000_000);
        assert_eq!(quote.minimum_amount_out, 495_000_000);
        assert_eq!(quote.fee_numerator, 10_000_000);
    }

    #[test]
    fn test_buy_fee_on_output() {
        let quote = swap_quote(
            &curve(),
            &fees(CollectFeeMode::OutputToken),
            &pool(ONE_Q64),
            &params(1_000_000_000, TradeDirection::QuoteToBase),
        )
        .unwrap();

        // Fee comes out of the 5e8 base received
        assert_eq!(quote.next_sqrt_price, 2 * ONE_Q64);
        assert_eq!(quote.amount_out, 495_000_000);
        assert_eq!(quote.trading_fee, 4_000_000);
        assert_eq!(quote.protocol_fee, 1_000_000);
    }

    #[test]
    fn test_sell_fee_on_quote_output() {
        let mut with_referral = params(500_000_000, TradeDirection::BaseToQuote);
        with_referral.has_referral = true;

        let quote = swap_quote(
            &curve(),
            &fees(CollectFeeMode::QuoteToken),
            &pool(2 * ONE_Q64),
            &with_referral,
        )
        .unwrap();

        assert_eq!(quote.next_sqrt_price, ONE_Q64);
        assert_eq!(quote.amount_out, 990_000_000);
        assert_eq!(quote.trading_fee, 8_000_000);
        assert_eq!(quote.protocol_fee, 1_600_000);
        assert_eq!(quote.referral_fee, 400_000);
        // Sold at an average of 2.0 against a spot of 4.0
        assert_eq!(quote.price_impact, U64F64::from_num(0.5));
    }

    #[test]
    fn test_rejections() {
        let err = swap_quote(
            &curve(),
            &fees(CollectFeeMode::QuoteToken),
            &pool(ONE_Q64),
            &params(0, TradeDirection::QuoteToBase),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let mut completed = pool(ONE_Q64);
        completed.quote_reserve = 5_000_000_000;
        let err = swap_quote(
            &curve(),
            &fees(CollectFeeMode::QuoteToken),
            &completed,
            &params(1, TradeDirection::QuoteToBase),
        )
        .unwrap_err();
        assert_eq!(err, CurveError::PoolCompleted);

        let mut bad_slippage = params(1_000, TradeDirection::QuoteToBase);
        bad_slippage.slippage_bps = 10_001;
        assert!(swap_quote(
            &curve(),
            &fees(CollectFeeMode::QuoteToken),
            &pool(ONE_Q64),
            &bad_slippage
        )
        .is_err());
    }

    #[test]
    fn test_insufficient_liquidity_is_not_truncated() {
        let err = swap_quote(
            &curve(),
            &fees(CollectFeeMode::OutputToken),
            &pool(4 * ONE_Q64),
            &params(1_000_000_001, TradeDirection::BaseToQuote),
        )
        .unwrap_err();
        assert_eq!(err, CurveError::insufficient_liquidity(1u64));
    }

    #[test]
    fn test_rate_limiter_applies_to_buys() {
        let mut config = fees(CollectFeeMode::QuoteToken);
        config.base_fee = get_rate_limiter_params(100, 10, 100_000_000, 1_000).unwrap();

        let quote = swap_quote(
            &curve(),
            &config,
            &pool(ONE_Q64),
            &params(300_000_000, TradeDirection::QuoteToBase),
        )
        .unwrap();
        assert_eq!(quote.fee_numerator, 11_000_000);

        let quote = swap_quote(
            &curve(),
            &config,
            &pool(2 * ONE_Q64),
            &params(300_000_000, TradeDirection::BaseToQuote),
        )
        .unwrap();
        assert_eq!(quote.fee_numerator, 10_000_000);
    }

    #[test]
    fn test_constant_product_pool_quote() {
        let curve = ConstantProductCurve {
            sqrt_min_price: ONE_Q64,
            sqrt_max_price: 4 * ONE_Q64,
            liquidity: LIQUIDITY,
        };
        let snapshot = PoolSnapshot {
            sqrt_price: 2 * ONE_Q64,
            ..Default::default()
        };
        let quote = swap_quote(
            &curve,
            &fees(CollectFeeMode::OutputToken),
            &snapshot,
            &params(1_000_000_000, TradeDirection::QuoteToBase),
        )
        .unwrap();
        assert_eq!(quote.next_sqrt_price, 3 * ONE_Q64);
        // 166_666_666 less 1% rounded up
        assert_eq!(quote.amount_out, 164_999_999);
    }
}
