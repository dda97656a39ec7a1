//! # Fee Parameter Helpers
//!
//! Turn human fee targets (basis points, durations) into the exact on-chain
//! fee configuration.

use num::{BigInt, BigUint};
use tracing::debug;

use crate::constants::{
    BASIS_POINT_MAX, BIN_STEP_BPS_DEFAULT, BIN_STEP_BPS_U128_DEFAULT,
    DYNAMIC_FEE_DECAY_PERIOD_DEFAULT, DYNAMIC_FEE_FILTER_PERIOD_DEFAULT,
    DYNAMIC_FEE_REDUCTION_FACTOR_DEFAULT, DYNAMIC_FEE_SCALING_FACTOR, MAX_DYNAMIC_FEE_PERCENT,
    MAX_FEE_BPS, MAX_PRICE_CHANGE_BPS_DEFAULT, MIN_FEE_BPS, ONE_Q64,
};
use crate::errors::{CoreResult, CurveError};
use crate::fees::scheduler::{FeeScheduler, SchedulerMode};
use crate::math::big_int::big_to_u128;
use crate::math::fixed_point::{bps_to_fee_numerator, fee_numerator_to_bps, sqrt};
use crate::types::{BaseFeeConfig, BaseFeeMode, CollectFeeMode, DynamicFeeConfig};

/// Fee scheduler config decaying from `starting_fee_bps` to `ending_fee_bps`
/// over `number_of_period` periods spread across `total_duration` points.
pub fn get_base_fee_params(
    starting_fee_bps: u64,
    ending_fee_bps: u64,
    mode: BaseFeeMode,
    number_of_period: u16,
    total_duration: u64,
) -> CoreResult<BaseFeeConfig> {
    if starting_fee_bps > MAX_FEE_BPS {
        return Err(CurveError::invalid_parameter(
            "starting_fee_bps",
            format!("{} exceeds {}", starting_fee_bps, MAX_FEE_BPS),
        ));
    }

    if starting_fee_bps == ending_fee_bps {
        if number_of_period != 0 || total_duration != 0 {
            return Err(CurveError::invalid_parameter(
                "number_of_period",
                "a flat fee takes no periods and no duration",
            ));
        }
        let config = BaseFeeConfig {
            cliff_fee_numerator: bps_to_fee_numerator(starting_fee_bps)?,
            first_factor: 0,
            second_factor: 0,
            third_factor: 0,
            base_fee_mode: BaseFeeMode::FeeSchedulerLinear,
        };
        config.validate(CollectFeeMode::QuoteToken)?;
        return Ok(config);
    }

    let scheduler_mode = match mode {
        BaseFeeMode::FeeSchedulerLinear => SchedulerMode::Linear,
        BaseFeeMode::FeeSchedulerExponential => SchedulerMode::Exponential,
        BaseFeeMode::RateLimiter => {
            return Err(CurveError::invalid_parameter(
                "mode",
                "use get_rate_limiter_params for a rate limiter",
            ))
        }
    };

    if number_of_period == 0 {
        return Err(CurveError::invalid_parameter(
            "number_of_period",
            "must be positive when the fee decays",
        ));
    }
    if total_duration == 0 {
        return Err(CurveError::invalid_parameter(
            "total_duration",
            "must be positive when the fee decays",
        ));
    }
    if ending_fee_bps > starting_fee_bps {
        return Err(CurveError::invalid_parameter(
            "ending_fee_bps",
            "must not exceed starting_fee_bps",
        ));
    }
    if ending_fee_bps < MIN_FEE_BPS {
        return Err(CurveError::invalid_parameter(
            "ending_fee_bps",
            format!("must be at least {}", MIN_FEE_BPS),
        ));
    }

    let period_frequency = total_duration / u64::from(number_of_period);
    if period_frequency == 0 {
        return Err(CurveError::invalid_parameter(
            "total_duration",
            "shorter than the number of periods",
        ));
    }

    let max_fee_numerator = bps_to_fee_numerator(starting_fee_bps)?;
    let min_fee_numerator = bps_to_fee_numerator(ending_fee_bps)?;

    let reduction_factor = match scheduler_mode {
        SchedulerMode::Linear => (max_fee_numerator - min_fee_numerator) / u64::from(number_of_period),
        SchedulerMode::Exponential => get_exponential_reduction_factor(
            max_fee_numerator,
            min_fee_numerator,
            number_of_period,
            period_frequency,
        )?,
    };

    let config = BaseFeeConfig {
        cliff_fee_numerator: max_fee_numerator,
        first_factor: number_of_period,
        second_factor: period_frequency,
        third_factor: reduction_factor,
        base_fee_mode: mode,
    };
    config.validate(CollectFeeMode::QuoteToken)?;

    // Integer reductions can settle slightly above the requested ending fee
    let settled_fee_bps = fee_numerator_to_bps(
        FeeScheduler {
            cliff_fee_numerator: max_fee_numerator,
            number_of_period,
            period_frequency,
            reduction_factor,
            mode: scheduler_mode,
        }
        .get_min_base_fee_numerator()?,
    )?;
    debug!(
        ?mode,
        cliff_fee_numerator = max_fee_numerator,
        period_frequency,
        reduction_factor,
        settled_fee_bps,
        "derived fee scheduler"
    );
    Ok(config)
}

/// Largest per-period reduction `r` (bps) that keeps the final fee at or
/// above `min_fee_numerator`.
///
/// Solved exactly on `(10000 - r)^n * max >= min * 10000^n`, then stepped
/// down until the on-chain Q64.64 evaluation agrees.
fn get_exponential_reduction_factor(
    max_fee_numerator: u64,
    min_fee_numerator: u64,
    number_of_period: u16,
    period_frequency: u64,
) -> CoreResult<u64> {
    let n = u32::from(number_of_period);
    let target = BigUint::from(min_fee_numerator) * BigUint::from(BASIS_POINT_MAX).pow(n);

    let mut low = 0u64;
    let mut high = BASIS_POINT_MAX - 1;
    while low < high {
        let mid = (low + high + 1) / 2;
        let scaled = BigUint::from(BASIS_POINT_MAX - mid).pow(n) * max_fee_numerator;
        if scaled >= target {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    let mut scheduler = FeeScheduler {
        cliff_fee_numerator: max_fee_numerator,
        number_of_period,
        period_frequency,
        reduction_factor: low,
        mode: SchedulerMode::Exponential,
    };
    while scheduler.reduction_factor > 0
        && scheduler.get_min_base_fee_numerator()? < min_fee_numerator
    {
        scheduler.reduction_factor -= 1;
    }

    Ok(scheduler.reduction_factor)
}

/// Rate limiter config. All-zero limiter parameters give a flat fee.
pub fn get_rate_limiter_params(
    base_fee_bps: u64,
    fee_increment_bps: u16,
    reference_amount: u64,
    max_limiter_duration: u64,
) -> CoreResult<BaseFeeConfig> {
    if base_fee_bps < MIN_FEE_BPS || base_fee_bps > MAX_FEE_BPS {
        return Err(CurveError::invalid_parameter(
            "base_fee_bps",
            format!("{} outside [{}, {}]", base_fee_bps, MIN_FEE_BPS, MAX_FEE_BPS),
        ));
    }
    if base_fee_bps + u64::from(fee_increment_bps) > MAX_FEE_BPS {
        return Err(CurveError::invalid_parameter(
            "fee_increment_bps",
            format!("base plus increment exceeds {}", MAX_FEE_BPS),
        ));
    }

    let config = BaseFeeConfig {
        cliff_fee_numerator: bps_to_fee_numerator(base_fee_bps)?,
        first_factor: fee_increment_bps,
        second_factor: max_limiter_duration,
        third_factor: reference_amount,
        base_fee_mode: BaseFeeMode::RateLimiter,
    };
    config.validate(CollectFeeMode::QuoteToken)?;
    Ok(config)
}

/// Dynamic fee calibrated so a `max_price_change_bps` move costs 20 % of the
/// base fee on top of it.
pub fn get_dynamic_fee_params(
    base_fee_bps: u64,
    max_price_change_bps: u16,
) -> CoreResult<DynamicFeeConfig> {
    if max_price_change_bps == 0 || max_price_change_bps > MAX_PRICE_CHANGE_BPS_DEFAULT {
        return Err(CurveError::invalid_parameter(
            "max_price_change_bps",
            format!("must be in (0, {}]", MAX_PRICE_CHANGE_BPS_DEFAULT),
        ));
    }

    // sqrt(1 + change / 10000) in Q64.64
    let price_ratio_q64 =
        ((BASIS_POINT_MAX + u64::from(max_price_change_bps)) as u128) * ONE_Q64 / BASIS_POINT_MAX as u128;
    let sqrt_price_ratio_q64 = big_to_u128(&sqrt(&BigInt::from(price_ratio_q64), 64)?)?;

    let delta_bin_id = (sqrt_price_ratio_q64 - ONE_Q64) / BIN_STEP_BPS_U128_DEFAULT * 2;
    let max_volatility_accumulator = delta_bin_id * BASIS_POINT_MAX as u128;

    let base_fee_numerator = bps_to_fee_numerator(base_fee_bps)?;
    let max_dynamic_fee_numerator = u128::from(base_fee_numerator) * u128::from(MAX_DYNAMIC_FEE_PERCENT) / 100;
    let scaled_fee = (max_dynamic_fee_numerator * DYNAMIC_FEE_SCALING_FACTOR)
        .checked_sub(DYNAMIC_FEE_SCALING_FACTOR - 1)
        .ok_or_else(|| CurveError::invalid_parameter("base_fee_bps", "too small for a dynamic fee"))?;

    let square_vfa_bin = (max_volatility_accumulator * u128::from(BIN_STEP_BPS_DEFAULT))
        .checked_pow(2)
        .ok_or(CurveError::MathOverflow)?;
    let variable_fee_control = scaled_fee / square_vfa_bin;

    let config = DynamicFeeConfig {
        bin_step: BIN_STEP_BPS_DEFAULT,
        bin_step_u128: BIN_STEP_BPS_U128_DEFAULT,
        filter_period: DYNAMIC_FEE_FILTER_PERIOD_DEFAULT,
        decay_period: DYNAMIC_FEE_DECAY_PERIOD_DEFAULT,
        reduction_factor: DYNAMIC_FEE_REDUCTION_FACTOR_DEFAULT,
        max_volatility_accumulator: u32::try_from(max_volatility_accumulator)
            .map_err(|_| CurveError::ConversionError)?,
        variable_fee_control: u32::try_from(variable_fee_control)
            .map_err(|_| CurveError::ConversionError)?,
    };
    config.validate()?;
    Ok(config)
}
