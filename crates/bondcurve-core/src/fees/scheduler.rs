//! # Fee Scheduler
//!
//! Time-decaying base fee. The fee starts at the cliff and drops once per
//! period, linearly or geometrically, until `number_of_period` is reached.

use ethnum::U256;

use crate::constants::{BASIS_POINT_MAX, MAX_FEE_NUMERATOR, MIN_FEE_NUMERATOR, ONE_Q64, SCALE_OFFSET};
use crate::errors::{CoreResult, CurveError};
use crate::fees::BaseFeeHandler;
use crate::math::big_int::{mul_div_u64, shr_rounding, u256_to_u64, Rounding};
use crate::math::fixed_point::pow;
use crate::types::{BaseFeeMode, CollectFeeMode, TradeDirection};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "snake_case"))]
pub enum SchedulerMode {
    #[default]
    Linear,
    Exponential,
}

impl From<SchedulerMode> for BaseFeeMode {
    fn from(mode: SchedulerMode) -> Self {
        match mode {
            SchedulerMode::Linear => BaseFeeMode::FeeSchedulerLinear,
            SchedulerMode::Exponential => BaseFeeMode::FeeSchedulerExponential,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeScheduler {
    pub cliff_fee_numerator: u64,
    pub number_of_period: u16,
    pub period_frequency: u64,
    /// Numerator decrement per period (linear) or basis points per period (exponential)
    pub reduction_factor: u64,
    pub mode: SchedulerMode,
}

impl FeeScheduler {
    /// A scheduler with no periods is a flat fee
    pub fn is_flat(&self) -> bool {
        self.number_of_period == 0 && self.period_frequency == 0 && self.reduction_factor == 0
    }

    /// Period index at `current_point`, clamped to `number_of_period`.
    ///
    /// Before activation the schedule is treated as fully elapsed.
    pub fn get_current_period(&self, current_point: u64, activation_point: u64) -> u64 {
        let number_of_period = u64::from(self.number_of_period);
        if self.period_frequency == 0 {
            return 0;
        }
        if current_point < activation_point {
            return number_of_period;
        }

        let period = (current_point - activation_point) / self.period_frequency;
        period.min(number_of_period)
    }

    pub fn get_fee_numerator_at_period(&self, period: u64) -> CoreResult<u64> {
        match self.mode {
            SchedulerMode::Linear => {
                let reduction = period
                    .checked_mul(self.reduction_factor)
                    .ok_or(CurveError::MathOverflow)?;
                Ok(self.cliff_fee_numerator.saturating_sub(reduction))
            }
            SchedulerMode::Exponential => self.get_exponential_fee_numerator(period),
        }
    }

    fn get_exponential_fee_numerator(&self, period: u64) -> CoreResult<u64> {
        if period == 0 {
            return Ok(self.cliff_fee_numerator);
        }
        if self.reduction_factor >= BASIS_POINT_MAX {
            return Ok(0);
        }
        if period == 1 {
            return mul_div_u64(
                self.cliff_fee_numerator,
                BASIS_POINT_MAX - self.reduction_factor,
                BASIS_POINT_MAX,
                Rounding::Down,
            );
        }

        // cliff * (1 - r / 10000)^period in Q64.64
        let reduction_q64 = (u128::from(self.reduction_factor) << SCALE_OFFSET) / u128::from(BASIS_POINT_MAX);
        let base = ONE_Q64 - reduction_q64;
        let exponent = i32::try_from(period).map_err(|_| CurveError::ConversionError)?;
        let factor = pow(base, exponent)?;

        let product = U256::from(self.cliff_fee_numerator)
            .checked_mul(U256::from(factor))
            .ok_or(CurveError::MathOverflow)?;
        u256_to_u64(shr_rounding(product, SCALE_OFFSET, Rounding::Down)?)
    }

    /// Fee once the schedule has fully elapsed
    pub fn get_min_base_fee_numerator(&self) -> CoreResult<u64> {
        self.get_fee_numerator_at_period(u64::from(self.number_of_period))
    }
}

impl BaseFeeHandler for FeeScheduler {
    fn validate(&self, _collect_fee_mode: CollectFeeMode) -> CoreResult<()> {
        if self.cliff_fee_numerator > MAX_FEE_NUMERATOR {
            return Err(CurveError::invalid_parameter(
                "cliff_fee_numerator",
                format!("{} exceeds {}", self.cliff_fee_numerator, MAX_FEE_NUMERATOR),
            ));
        }

        if !self.is_flat() && (self.number_of_period == 0 || self.period_frequency == 0) {
            return Err(CurveError::invalid_parameter(
                "number_of_period",
                "periods and period frequency must both be set",
            ));
        }

        if self.mode == SchedulerMode::Exponential && self.reduction_factor >= BASIS_POINT_MAX {
            return Err(CurveError::invalid_parameter(
                "reduction_factor",
                format!("must be below {} bps", BASIS_POINT_MAX),
            ));
        }

        let min_fee_numerator = self.get_min_base_fee_numerator()?;
        if min_fee_numerator < MIN_FEE_NUMERATOR {
            return Err(CurveError::invalid_parameter(
                "reduction_factor",
                format!(
                    "fee decays to {}, below the minimum {}",
                    min_fee_numerator, MIN_FEE_NUMERATOR
                ),
            ));
        }

        Ok(())
    }

    fn get_base_fee_numerator(
        &self,
        current_point: u64,
        activation_point: u64,
        _direction: TradeDirection,
        _amount_in: u64,
    ) -> CoreResult<u64> {
        let period = self.get_current_period(current_point, activation_point);
        self.get_fee_numerator_at_period(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> FeeScheduler {
        FeeScheduler {
            cliff_fee_numerator: 500_000_000,
            number_of_period: 10,
            period_frequency: 60,
            reduction_factor: 49_000_000,
            mode: SchedulerMode::Linear,
        }
    }

    fn exponential() -> FeeScheduler {
        FeeScheduler {
            cliff_fee_numerator: 100_000_000,
            number_of_period: 100,
            period_frequency: 1,
            reduction_factor: 100,
            mode: SchedulerMode::Exponential,
        }
    }

    #[test]
    fn test_current_period() {
        let scheduler = linear();
        assert_eq!(scheduler.get_current_period(1_000, 1_000), 0);
        assert_eq!(scheduler.get_current_period(1_059, 1_000), 0);
        assert_eq!(scheduler.get_current_period(1_060, 1_000), 1);
        assert_eq!(scheduler.get_current_period(100_000, 1_000), 10);
        // Not active yet
        assert_eq!(scheduler.get_current_period(999, 1_000), 10);
    }

    #[test]
    fn test_linear_schedule() {
        let scheduler = linear();
        assert_eq!(scheduler.get_fee_numerator_at_period(0).unwrap(), 500_000_000);
        assert_eq!(scheduler.get_fee_numerator_at_period(1).unwrap(), 451_000_000);
        assert_eq!(scheduler.get_min_base_fee_numerator().unwrap(), 10_000_000);
        assert!(scheduler.validate(CollectFeeMode::QuoteToken).is_ok());

        // Clamps at zero rather than wrapping
        assert_eq!(scheduler.get_fee_numerator_at_period(11).unwrap(), 0);
    }

    #[test]
    fn test_exponential_schedule() {
        let scheduler = exponential();
        let fees: Vec<u64> = (0..6)
            .map(|p| scheduler.get_fee_numerator_at_period(p).unwrap())
            .collect();
        assert_eq!(
            fees,
            vec![100_000_000, 99_000_000, 98_010_000, 97_029_899, 96_059_600, 95_099_004]
        );
        assert_eq!(scheduler.get_fee_numerator_at_period(10).unwrap(), 90_438_207);
        assert_eq!(scheduler.get_min_base_fee_numerator().unwrap(), 36_603_234);
        assert!(scheduler.validate(CollectFeeMode::QuoteToken).is_ok());
    }

    #[test]
    fn test_exponential_schedule_strictly_decreasing() {
        let scheduler = exponential();
        let fees: Vec<u64> = (0..=u64::from(scheduler.number_of_period))
            .map(|p| scheduler.get_fee_numerator_at_period(p).unwrap())
            .collect();
        assert_eq!(fees[0], scheduler.cliff_fee_numerator);
        assert!(fees.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn test_flat_schedule() {
        let scheduler = FeeScheduler {
            cliff_fee_numerator: 2_500_000,
            number_of_period: 0,
            period_frequency: 0,
            reduction_factor: 0,
            mode: SchedulerMode::Linear,
        };
        assert!(scheduler.is_flat());
        assert!(scheduler.validate(CollectFeeMode::OutputToken).is_ok());
        assert_eq!(
            scheduler
                .get_base_fee_numerator(0, 1_000, TradeDirection::QuoteToBase, 1)
                .unwrap(),
            2_500_000
        );
    }

    #[test]
    fn test_invalid_schedules() {
        let mut scheduler = linear();
        scheduler.reduction_factor = 50_000_000;
        // 500M - 10 * 50M == 0
        assert!(scheduler.validate(CollectFeeMode::QuoteToken).is_err());

        let mut scheduler = linear();
        scheduler.period_frequency = 0;
        assert!(scheduler.validate(CollectFeeMode::QuoteToken).is_err());

        let mut scheduler = exponential();
        scheduler.reduction_factor = BASIS_POINT_MAX;
        assert!(scheduler.validate(CollectFeeMode::QuoteToken).is_err());

        let mut scheduler = linear();
        scheduler.cliff_fee_numerator = MAX_FEE_NUMERATOR + 1;
        assert!(scheduler.validate(CollectFeeMode::QuoteToken).is_err());
    }
}
