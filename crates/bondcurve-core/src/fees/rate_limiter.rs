//! # Rate Limiter
//!
//! Size-dependent base fee for buys during the launch window. The first
//! `reference_amount` of a trade pays the cliff fee, every further
//! `reference_amount` pays `fee_increment_bps` more than the one before, and
//! the trade is charged the amount-weighted average.

use ethnum::U256;

use crate::constants::{FEE_DENOMINATOR, MAX_FEE_NUMERATOR, MIN_FEE_NUMERATOR};
use crate::errors::{CoreResult, CurveError};
use crate::fees::BaseFeeHandler;
use crate::math::big_int::{div_rounding, u256_to_u64, Rounding};
use crate::math::fixed_point::bps_to_fee_numerator;
use crate::math::safe_math::safe_sub_u64;
use crate::types::{CollectFeeMode, TradeDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRateLimiter {
    pub cliff_fee_numerator: u64,
    pub fee_increment_bps: u16,
    pub max_limiter_duration: u64,
    pub reference_amount: u64,
}

impl FeeRateLimiter {
    pub fn is_zero_rate_limiter(&self) -> bool {
        self.fee_increment_bps == 0 && self.max_limiter_duration == 0 && self.reference_amount == 0
    }

    /// Buys are limited from `activation_point` through `activation_point + max_limiter_duration`
    pub fn is_rate_limiter_applied(
        &self,
        current_point: u64,
        activation_point: u64,
        direction: TradeDirection,
    ) -> bool {
        if self.is_zero_rate_limiter() || direction == TradeDirection::BaseToQuote {
            return false;
        }
        if current_point < activation_point {
            return false;
        }
        let last_effective_point = activation_point.saturating_add(self.max_limiter_duration);
        current_point <= last_effective_point
    }

    pub fn get_fee_increment_numerator(&self) -> CoreResult<u64> {
        bps_to_fee_numerator(u64::from(self.fee_increment_bps))
    }

    /// Step at which the per-step fee reaches [`MAX_FEE_NUMERATOR`]
    pub fn get_max_index(&self) -> CoreResult<u64> {
        let increment = self.get_fee_increment_numerator()?;
        if increment == 0 {
            return Err(CurveError::DivisionByZero);
        }
        let headroom = safe_sub_u64(MAX_FEE_NUMERATOR, self.cliff_fee_numerator)?;
        Ok(headroom / increment)
    }

    /// Average fee numerator charged on `input_amount`
    pub fn get_fee_numerator_from_amount(&self, input_amount: u64) -> CoreResult<u64> {
        let cliff = self.cliff_fee_numerator;
        let reference = self.reference_amount;
        if input_amount <= reference || reference == 0 {
            return Ok(cliff);
        }

        let increment = self.get_fee_increment_numerator()?;
        if increment == 0 {
            return Ok(cliff);
        }

        let max_index = self.get_max_index()?;
        let excess = input_amount - reference;
        let steps = excess / reference;
        let remainder = excess % reference;
        if steps >= max_index {
            return Ok(MAX_FEE_NUMERATOR);
        }

        // reference * (c * (a + 1) + i * a * (a + 1) / 2) + b * (c + i * (a + 1))
        let a = U256::from(steps);
        let c = U256::from(cliff);
        let i = U256::from(increment);
        let a_plus_one = a + U256::ONE;

        let full_steps = c * a_plus_one + i * a * a_plus_one / U256::from(2u8);
        let full_fee = U256::from(reference)
            .checked_mul(full_steps)
            .ok_or(CurveError::MathOverflow)?;
        let partial_fee = U256::from(remainder)
            .checked_mul(c + i * a_plus_one)
            .ok_or(CurveError::MathOverflow)?;
        let total_fee = full_fee
            .checked_add(partial_fee)
            .ok_or(CurveError::MathOverflow)?;

        let numerator = div_rounding(total_fee, U256::from(input_amount), Rounding::Up)?;
        Ok(u256_to_u64(numerator)?.min(MAX_FEE_NUMERATOR))
    }
}

impl BaseFeeHandler for FeeRateLimiter {
    fn validate(&self, collect_fee_mode: CollectFeeMode) -> CoreResult<()> {
        if collect_fee_mode != CollectFeeMode::QuoteToken {
            return Err(CurveError::invalid_parameter(
                "collect_fee_mode",
                "rate limiter requires fees collected in quote token",
            ));
        }

        if self.cliff_fee_numerator < MIN_FEE_NUMERATOR
            || self.cliff_fee_numerator > MAX_FEE_NUMERATOR
        {
            return Err(CurveError::invalid_parameter(
                "cliff_fee_numerator",
                format!(
                    "{} outside [{}, {}]",
                    self.cliff_fee_numerator, MIN_FEE_NUMERATOR, MAX_FEE_NUMERATOR
                ),
            ));
        }

        if self.is_zero_rate_limiter() {
            return Ok(());
        }

        if self.fee_increment_bps == 0 || self.reference_amount == 0 || self.max_limiter_duration == 0
        {
            return Err(CurveError::invalid_parameter(
                "rate_limiter",
                "increment, reference amount and duration must all be set",
            ));
        }

        let increment = self.get_fee_increment_numerator()?;
        if self.cliff_fee_numerator.saturating_add(increment) > MAX_FEE_NUMERATOR {
            return Err(CurveError::invalid_parameter(
                "fee_increment_bps",
                "first increment already exceeds the maximum fee",
            ));
        }
        if increment > FEE_DENOMINATOR {
            return Err(CurveError::invalid_parameter(
                "fee_increment_bps",
                "increment above 100%",
            ));
        }

        Ok(())
    }

    fn get_base_fee_numerator(
        &self,
        current_point: u64,
        activation_point: u64,
        direction: TradeDirection,
        amount_in: u64,
    ) -> CoreResult<u64> {
        if self.is_rate_limiter_applied(current_point, activation_point, direction) {
            self.get_fee_numerator_from_amount(amount_in)
        } else {
            Ok(self.cliff_fee_numerator)
        }
    }
}
