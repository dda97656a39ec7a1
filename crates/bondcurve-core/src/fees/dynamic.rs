//! # Dynamic Fee
//!
//! Volatility surcharge on top of the base fee:
//! `ceil(variable_fee_control * (volatility_accumulator * bin_step)^2 / 1e11)`

use ethnum::U256;

use crate::constants::{
    BASIS_POINT_MAX, BIN_STEP_BPS_DEFAULT, BIN_STEP_BPS_U128_DEFAULT, DYNAMIC_FEE_SCALING_FACTOR,
};
use crate::errors::{CoreResult, CurveError};
use crate::math::big_int::{div_rounding, Rounding};
use crate::types::{DynamicFeeConfig, VolatilityTracker};

/// Variable fee numerator for the tracker's current accumulator.
///
/// Returned unnarrowed, the caller caps the sum with the base fee.
pub fn get_variable_fee_numerator(
    config: &DynamicFeeConfig,
    tracker: &VolatilityTracker,
) -> CoreResult<U256> {
    let volatility_bin = U256::from(tracker.volatility_accumulator)
        .checked_mul(U256::from(config.bin_step))
        .ok_or(CurveError::MathOverflow)?;
    let squared = volatility_bin
        .checked_mul(volatility_bin)
        .ok_or(CurveError::MathOverflow)?;
    let variable_fee = squared
        .checked_mul(U256::from(config.variable_fee_control))
        .ok_or(CurveError::MathOverflow)?;

    div_rounding(
        variable_fee,
        U256::from(DYNAMIC_FEE_SCALING_FACTOR),
        Rounding::Up,
    )
}

impl DynamicFeeConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.bin_step != BIN_STEP_BPS_DEFAULT {
            return Err(CurveError::invalid_parameter(
                "bin_step",
                format!("must be {}", BIN_STEP_BPS_DEFAULT),
            ));
        }
        if self.bin_step_u128 != BIN_STEP_BPS_U128_DEFAULT {
            return Err(CurveError::invalid_parameter(
                "bin_step_u128",
                format!("must be {}", BIN_STEP_BPS_U128_DEFAULT),
            ));
        }
        if self.filter_period >= self.decay_period {
            return Err(CurveError::invalid_parameter(
                "filter_period",
                "must be shorter than the decay period",
            ));
        }
        if u64::from(self.reduction_factor) > BASIS_POINT_MAX {
            return Err(CurveError::invalid_parameter(
                "reduction_factor",
                format!("exceeds {}", BASIS_POINT_MAX),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    fn config() -> DynamicFeeConfig {
        DynamicFeeConfig {
            bin_step: BIN_STEP_BPS_DEFAULT,
            bin_step_u128: BIN_STEP_BPS_U128_DEFAULT,
            filter_period: DYNAMIC_FEE_FILTER_PERIOD_DEFAULT,
            decay_period: DYNAMIC_FEE_DECAY_PERIOD_DEFAULT,
            reduction_factor: DYNAMIC_FEE_REDUCTION_FACTOR_DEFAULT,
            max_volatility_accumulator: 14_460_000,
            variable_fee_control: 956,
        }
    }

    #[test]
    fn test_variable_fee() {
        let config = config();

        let quiet = VolatilityTracker::default();
        assert_eq!(get_variable_fee_numerator(&config, &quiet).unwrap(), U256::ZERO);

        let stressed = VolatilityTracker {
            volatility_accumulator: 14_460_000,
            ..Default::default()
        };
        // ceil(14_460_000^2 * 956 / 1e11)
        assert_eq!(
            get_variable_fee_numerator(&config, &stressed).unwrap(),
            U256::from(1_998_916u32)
        );

        // Any non-zero accumulator rounds up to at least one unit
        let tiny = VolatilityTracker {
            volatility_accumulator: 1,
            ..Default::default()
        };
        assert_eq!(get_variable_fee_numerator(&config, &tiny).unwrap(), U256::ONE);
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut bad = config();
        bad.filter_period = bad.decay_period;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.bin_step = 2;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.reduction_factor = 10_001;
        assert!(bad.validate().is_err());
    }
}
