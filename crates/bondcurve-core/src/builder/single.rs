//! # Single-Segment Curve
//!
//! One constant-liquidity segment from the start price to the migration
//! price. With `swap` base sold over `[start, mig]` for `threshold` quote:
//!
//! ```text
//! swap      = L (1/start - 1/mig)
//! threshold = L (mig - start)
//! threshold (1 - f) / migration_base = mig^2
//! ```
//!
//! which gives `start = mig * migration_base / (swap * (1 - f))`.

use num::BigUint;

use crate::builder::{
    get_migration_base_token, get_migration_quote_amount_from_threshold,
    get_sqrt_price_from_price, get_swap_amount, BuildCurveParams, CurveDraft,
};
use crate::errors::{CoreResult, CurveError};
use crate::math::big_int::big_to_u128;
use crate::math::liquidity_math::{get_liquidity_from_delta_base, get_liquidity_from_delta_quote};
use crate::types::{Curve, CurveSegment};

pub fn build_single_segment_curve(
    params: &BuildCurveParams,
    vesting_amount: u64,
    percentage_supply_on_migration: u8,
    migration_quote_threshold: u64,
) -> CoreResult<CurveDraft> {
    let total_supply = params.total_token_supply;
    let fee_percent = params.migration_fee_percent;
    let kept_percent = 100u128
        .checked_sub(u128::from(fee_percent))
        .filter(|kept| *kept > 0)
        .ok_or_else(|| CurveError::invalid_parameter("migration_fee_percent", "must be below 100"))?;

    let migration_base_supply =
        u128::from(total_supply) * u128::from(percentage_supply_on_migration) / 100;
    if migration_base_supply == 0 {
        return Err(CurveError::invalid_parameter(
            "percentage_supply_on_migration",
            "leaves no supply for migration",
        ));
    }

    // Price the migration quote amount pays for the migration supply
    let migration_sqrt_price = get_sqrt_price_from_price(
        u128::from(migration_quote_threshold) * kept_percent,
        migration_base_supply * 100,
    )?;

    let migration_quote_amount =
        get_migration_quote_amount_from_threshold(migration_quote_threshold, fee_percent)?;
    let migration_base_amount = get_migration_base_token(
        migration_quote_amount,
        migration_sqrt_price,
        params.migration_option,
    )?;
    let swap_amount = get_swap_amount(
        total_supply,
        migration_base_amount,
        vesting_amount,
        params.leftover,
    )?;

    let numerator = BigUint::from(migration_sqrt_price) * BigUint::from(migration_base_amount) * 100u32;
    let denominator = BigUint::from(swap_amount) * BigUint::from(kept_percent);
    let sqrt_start_price = big_to_u128(&(numerator / denominator))?;
    if sqrt_start_price >= migration_sqrt_price {
        return Err(CurveError::invalid_parameter(
            "migration_quote_threshold",
            "migration price does not exceed the start price",
        ));
    }

    let liquidity = get_liquidity_from_delta_base(swap_amount, sqrt_start_price, migration_sqrt_price)?
        .min(get_liquidity_from_delta_quote(
            migration_quote_threshold,
            sqrt_start_price,
            migration_sqrt_price,
        )?);

    let curve = Curve::new(
        sqrt_start_price,
        vec![CurveSegment::new(migration_sqrt_price, liquidity)],
    )?;

    Ok(CurveDraft {
        curve,
        migration_quote_threshold,
        migration_sqrt_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CurveShape, FeeParams, LockedVestingParams, MigrationOption};

    fn params() -> BuildCurveParams {
        BuildCurveParams {
            total_token_supply: 1_000_000_000_000_000,
            shape: CurveShape::Flat {
                percentage_supply_on_migration: 20,
                migration_quote_threshold: 85_000_000_000,
            },
            migration_option: MigrationOption::ConstantProductV1,
            migration_fee_percent: 1,
            leftover: 0,
            locked_vesting: LockedVestingParams::default(),
            fees: FeeParams::flat(100),
        }
    }

    #[test]
    fn test_single_segment_draft() {
        let draft = build_single_segment_curve(&params(), 0, 20, 85_000_000_000).unwrap();
        assert_eq!(draft.migration_sqrt_price, 378_383_146_931_763_939);
        assert_eq!(draft.curve.sqrt_start_price, 95_551_299_730_244_016);
        assert_eq!(
            draft.curve.segments,
            vec![CurveSegment::new(
                378_383_146_931_763_939,
                102_265_715_386_963_442_996_099_563_693_445
            )]
        );
    }

    #[test]
    fn test_supply_exhausted_by_migration() {
        let mut params = params();
        params.leftover = 900_000_000_000_000;
        let err = build_single_segment_curve(&params, 0, 20, 85_000_000_000).unwrap_err();
        assert!(matches!(err, CurveError::ReconciliationFailure(_)));
    }
}
