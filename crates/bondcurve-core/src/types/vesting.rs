//! # Vesting Types

use crate::errors::{CoreResult, CurveError};
use crate::math::safe_math::{safe_add_u64, safe_mul_u64};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Locked vesting allocation released after migration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct VestingSchedule {
    pub amount_per_period: u64,
    pub number_of_period: u64,
    pub cliff_unlock_amount: u64,
    pub cliff_duration_from_migration_time: u64,
    /// Points between two period unlocks
    pub frequency: u64,
}

impl VestingSchedule {
    /// `cliff_unlock_amount + amount_per_period * number_of_period`
    pub fn total_amount(&self) -> CoreResult<u64> {
        let periodic = safe_mul_u64(self.amount_per_period, self.number_of_period)?;
        safe_add_u64(periodic, self.cliff_unlock_amount)
    }

    pub fn is_empty(&self) -> bool {
        self.amount_per_period == 0 && self.number_of_period == 0 && self.cliff_unlock_amount == 0
    }

    /// Periodic unlocks need a frequency, and an unused schedule stays all zero
    pub fn validate(&self) -> CoreResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        if self.number_of_period > 0 && self.frequency == 0 {
            return Err(CurveError::invalid_parameter(
                "frequency",
                "must be positive when periods are scheduled",
            ));
        }
        if self.total_amount()? == 0 {
            return Err(CurveError::invalid_parameter(
                "vesting",
                "schedule releases nothing",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_amount() {
        let schedule = VestingSchedule {
            amount_per_period: 1_000,
            number_of_period: 12,
            cliff_unlock_amount: 500,
            cliff_duration_from_migration_time: 0,
            frequency: 86_400,
        };
        assert_eq!(schedule.total_amount().unwrap(), 12_500);
        assert!(schedule.validate().is_ok());

        let overflow = VestingSchedule {
            amount_per_period: u64::MAX,
            number_of_period: 2,
            ..Default::default()
        };
        assert_eq!(overflow.total_amount(), Err(CurveError::MathOverflow));
    }

    #[test]
    fn test_validate() {
        assert!(VestingSchedule::default().validate().is_ok());

        let missing_frequency = VestingSchedule {
            amount_per_period: 10,
            number_of_period: 3,
            ..Default::default()
        };
        assert!(missing_frequency.validate().is_err());

        let cliff_only = VestingSchedule {
            cliff_unlock_amount: 10,
            ..Default::default()
        };
        assert!(cliff_only.validate().is_ok());
    }
}
