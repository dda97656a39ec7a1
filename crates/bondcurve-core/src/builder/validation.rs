//! # Build Validation
//!
//! Checks run before any curve math, and on the finished curve.

use crate::builder::{BuildCurveParams, CurveShape};
use crate::constants::MAX_MIGRATION_FEE_PERCENTAGE;
use crate::errors::{CoreResult, CurveError};
use crate::types::Curve;

fn validate_percentage_supply_on_migration(percentage: u8) -> CoreResult<()> {
    if percentage == 0 || percentage >= 100 {
        return Err(CurveError::invalid_parameter(
            "percentage_supply_on_migration",
            format!("{} outside (0, 100)", percentage),
        ));
    }
    Ok(())
}

fn validate_market_caps(initial_market_cap: u64, migration_market_cap: u64) -> CoreResult<()> {
    if initial_market_cap == 0 {
        return Err(CurveError::invalid_parameter("initial_market_cap", "must be positive"));
    }
    if migration_market_cap <= initial_market_cap {
        return Err(CurveError::invalid_parameter(
            "migration_market_cap",
            format!(
                "{} must exceed initial market cap {}",
                migration_market_cap, initial_market_cap
            ),
        ));
    }
    Ok(())
}

/// Reject launch parameters no curve can satisfy
pub fn validate_build_params(params: &BuildCurveParams) -> CoreResult<()> {
    if params.total_token_supply == 0 {
        return Err(CurveError::invalid_parameter("total_token_supply", "must be positive"));
    }
    if params.migration_fee_percent > MAX_MIGRATION_FEE_PERCENTAGE {
        return Err(CurveError::invalid_parameter(
            "migration_fee_percent",
            format!("exceeds {}", MAX_MIGRATION_FEE_PERCENTAGE),
        ));
    }
    if params.leftover >= params.total_token_supply {
        return Err(CurveError::invalid_parameter(
            "leftover",
            "must be below the total supply",
        ));
    }
    if params.locked_vesting.total_locked_vesting_amount >= params.total_token_supply {
        return Err(CurveError::invalid_parameter(
            "total_locked_vesting_amount",
            "must be below the total supply",
        ));
    }

    match &params.shape {
        CurveShape::Flat {
            percentage_supply_on_migration,
            migration_quote_threshold,
        } => {
            validate_percentage_supply_on_migration(*percentage_supply_on_migration)?;
            if *migration_quote_threshold == 0 {
                return Err(CurveError::invalid_parameter(
                    "migration_quote_threshold",
                    "must be positive",
                ));
            }
        }
        CurveShape::MarketCap {
            initial_market_cap,
            migration_market_cap,
            percentage_supply_on_migration,
        } => {
            validate_percentage_supply_on_migration(*percentage_supply_on_migration)?;
            validate_market_caps(*initial_market_cap, *migration_market_cap)?;
        }
        CurveShape::LiquidityWeighted {
            initial_market_cap,
            migration_market_cap,
            liquidity_weights,
        } => {
            validate_market_caps(*initial_market_cap, *migration_market_cap)?;
            if liquidity_weights.iter().any(|weight| *weight == 0) {
                return Err(CurveError::invalid_parameter(
                    "liquidity_weights",
                    "every bin needs a positive weight",
                ));
            }
        }
    }

    Ok(())
}

/// A finished curve must validate and reach its migration price
pub fn validate_curve(curve: &Curve, migration_sqrt_price: u128) -> CoreResult<()> {
    curve.validate()?;
    if migration_sqrt_price <= curve.sqrt_start_price
        || migration_sqrt_price > curve.terminal_sqrt_price()
    {
        return Err(CurveError::InvalidCurve("migration price outside the curve"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FeeParams, LockedVestingParams, MigrationOption};
    use crate::constants::{LIQUIDITY_WEIGHT_BINS, ONE_Q64};
    use crate::types::CurveSegment;

    fn params(shape: CurveShape) -> BuildCurveParams {
        BuildCurveParams {
            total_token_supply: 1_000_000_000,
            shape,
            migration_option: MigrationOption::ConstantProductV1,
            migration_fee_percent: 0,
            leftover: 0,
            locked_vesting: LockedVestingParams::default(),
            fees: FeeParams::flat(100),
        }
    }

    fn flat(percentage: u8, threshold: u64) -> CurveShape {
        CurveShape::Flat {
            percentage_supply_on_migration: percentage,
            migration_quote_threshold: threshold,
        }
    }

    #[test]
    fn test_valid_params() {
        assert!(validate_build_params(&params(flat(20, 1_000))).is_ok());
        assert!(validate_build_params(&params(CurveShape::MarketCap {
            initial_market_cap: 10,
            migration_market_cap: 100,
            percentage_supply_on_migration: 20,
        }))
        .is_ok());
    }

    #[test]
    fn test_invalid_params() {
        assert!(validate_build_params(&params(flat(0, 1_000))).is_err());
        assert!(validate_build_params(&params(flat(100, 1_000))).is_err());
        assert!(validate_build_params(&params(flat(20, 0))).is_err());

        let mut zero_supply = params(flat(20, 1_000));
        zero_supply.total_token_supply = 0;
        assert!(validate_build_params(&zero_supply).is_err());

        let mut high_fee = params(flat(20, 1_000));
        high_fee.migration_fee_percent = 100;
        assert!(validate_build_params(&high_fee).is_err());

        let mut big_leftover = params(flat(20, 1_000));
        big_leftover.leftover = 1_000_000_000;
        assert!(validate_build_params(&big_leftover).is_err());

        assert!(validate_build_params(&params(CurveShape::MarketCap {
            initial_market_cap: 100,
            migration_market_cap: 100,
            percentage_supply_on_migration: 20,
        }))
        .is_err());

        let mut weights = [1; LIQUIDITY_WEIGHT_BINS];
        weights[15] = 0;
        assert!(validate_build_params(&params(CurveShape::LiquidityWeighted {
            initial_market_cap: 10,
            migration_market_cap: 100,
            liquidity_weights: weights,
        }))
        .is_err());
    }

    #[test]
    fn test_validate_curve() {
        let curve = Curve::new(ONE_Q64, vec![CurveSegment::new(4 * ONE_Q64, 1 << 64)]).unwrap();
        assert!(validate_curve(&curve, 4 * ONE_Q64).is_ok());
        assert!(validate_curve(&curve, 2 * ONE_Q64).is_ok());
        assert!(validate_curve(&curve, ONE_Q64).is_err());
        assert!(validate_curve(&curve, 5 * ONE_Q64).is_err());
    }
}
