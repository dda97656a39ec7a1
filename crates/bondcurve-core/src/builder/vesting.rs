//! # Locked Vesting

use crate::errors::{CoreResult, CurveError};
use crate::types::VestingSchedule;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Vesting targets as a launch describes them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(default))]
pub struct LockedVestingParams {
    pub total_locked_vesting_amount: u64,
    pub number_of_vesting_period: u64,
    pub cliff_unlock_amount: u64,
    pub total_vesting_duration: u64,
    pub cliff_duration_from_migration_time: u64,
}

/// Split `total_locked_vesting_amount` into a cliff and equal periods.
///
/// The rounding remainder of the periodic split is added to the cliff, so the
/// schedule always releases exactly the total.
pub fn get_locked_vesting_params(
    total_locked_vesting_amount: u64,
    number_of_vesting_period: u64,
    cliff_unlock_amount: u64,
    total_vesting_duration: u64,
    cliff_duration_from_migration_time: u64,
) -> CoreResult<VestingSchedule> {
    if total_locked_vesting_amount == 0 {
        return Ok(VestingSchedule::default());
    }

    // Everything at the cliff is expressed as one period of one unit
    if total_locked_vesting_amount == cliff_unlock_amount {
        return Ok(VestingSchedule {
            amount_per_period: 1,
            number_of_period: 1,
            cliff_unlock_amount: total_locked_vesting_amount - 1,
            cliff_duration_from_migration_time,
            frequency: 1,
        });
    }

    if number_of_vesting_period == 0 {
        return Err(CurveError::invalid_parameter(
            "number_of_vesting_period",
            "must be positive when vesting is not all cliff",
        ));
    }
    if total_vesting_duration == 0 {
        return Err(CurveError::invalid_parameter(
            "total_vesting_duration",
            "must be positive when vesting is not all cliff",
        ));
    }
    if cliff_unlock_amount > total_locked_vesting_amount {
        return Err(CurveError::invalid_parameter(
            "cliff_unlock_amount",
            format!(
                "{} exceeds total vesting amount {}",
                cliff_unlock_amount, total_locked_vesting_amount
            ),
        ));
    }

    let periodic_amount = total_locked_vesting_amount - cliff_unlock_amount;
    let amount_per_period = periodic_amount / number_of_vesting_period;
    let remainder = periodic_amount % number_of_vesting_period;
    let frequency = total_vesting_duration / number_of_vesting_period;
    if frequency == 0 {
        return Err(CurveError::invalid_parameter(
            "total_vesting_duration",
            "shorter than the number of periods",
        ));
    }

    let schedule = VestingSchedule {
        amount_per_period,
        number_of_period: number_of_vesting_period,
        cliff_unlock_amount: cliff_unlock_amount + remainder,
        cliff_duration_from_migration_time,
        frequency,
    };
    schedule.validate()?;
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_vesting() {
        let schedule = get_locked_vesting_params(0, 12, 5, 100, 10).unwrap();
        assert_eq!(schedule, VestingSchedule::default());
        assert_eq!(schedule.total_amount().unwrap(), 0);
    }

    #[test]
    fn test_remainder_goes_to_cliff() {
        let schedule = get_locked_vesting_params(1_000, 3, 100, 365, 30).unwrap();
        assert_eq!(schedule.amount_per_period, 300);
        assert_eq!(schedule.cliff_unlock_amount, 100);
        assert_eq!(schedule.frequency, 121);
        assert_eq!(schedule.total_amount().unwrap(), 1_000);

        let schedule = get_locked_vesting_params(1_001, 3, 100, 365, 30).unwrap();
        assert_eq!(schedule.amount_per_period, 300);
        assert_eq!(schedule.cliff_unlock_amount, 101);
        assert_eq!(schedule.total_amount().unwrap(), 1_001);
    }

    #[test]
    fn test_all_cliff() {
        let schedule = get_locked_vesting_params(500, 0, 500, 0, 60).unwrap();
        assert_eq!(schedule.cliff_unlock_amount, 499);
        assert_eq!(schedule.amount_per_period, 1);
        assert_eq!(schedule.number_of_period, 1);
        assert_eq!(schedule.cliff_duration_from_migration_time, 60);
        assert_eq!(schedule.total_amount().unwrap(), 500);
    }

    #[test]
    fn test_invalid_vesting() {
        assert!(get_locked_vesting_params(1_000, 0, 100, 365, 0).is_err());
        assert!(get_locked_vesting_params(1_000, 3, 100, 0, 0).is_err());
        assert!(get_locked_vesting_params(1_000, 3, 1_001, 365, 0).is_err());
        assert!(get_locked_vesting_params(1_000, 10, 0, 5, 0).is_err());
    }
}
