//! # Fixed-Point Arithmetic
//!
//! Q64.64 primitives used by the fee scheduler and by curve construction:
//! Newton square roots over arbitrary precision integers, binary exponentiation
//! of Q64.64 bases, and the fee-numerator/basis-point conversions.

use num::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};

use crate::constants::{BASIS_POINT_MAX, FEE_DENOMINATOR, MAX_EXPONENTIAL, ONE_Q64, SCALE_OFFSET};
use crate::errors::{CoreResult, CurveError};
use crate::math::big_int::{mul_div_u64, Rounding};

// ============================================================================
// Square Roots
// ============================================================================

/// Integer square root, `floor(sqrt(value))`, by Newton's method
pub fn isqrt(value: &BigUint) -> BigUint {
    if value.is_zero() {
        return BigUint::zero();
    }

    // Start above the root so the iteration decreases monotonically
    let mut x = BigUint::one() << ((value.bits() + 1) / 2);
    loop {
        let y = (&x + value / &x) >> 1u32;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Fixed-point square root.
///
/// `value` carries `precision_bits` fractional bits and so does the result:
/// `sqrt(value / 2^p) * 2^p == sqrt(value * 2^p)`, rounded down.
pub fn sqrt(value: &BigInt, precision_bits: u32) -> CoreResult<BigUint> {
    if value.is_negative() {
        return Err(CurveError::NegativeSquareRoot);
    }
    let scaled = value.magnitude() << precision_bits;
    Ok(isqrt(&scaled))
}

/// `floor(value^(1/4))`
pub fn fourth_root(value: &BigUint) -> BigUint {
    // floor(sqrt(floor(sqrt(n)))) == floor(n^(1/4)) for integers
    isqrt(&isqrt(value))
}

/// `floor(value^(1/16))`
pub fn sixteenth_root(value: &BigUint) -> BigUint {
    fourth_root(&fourth_root(value))
}

// ============================================================================
// Exponentiation
// ============================================================================

/// Raise a Q64.64 `base` to an integer power.
///
/// Bases at or above one are inverted first so every intermediate square stays
/// below 2^128, and the result is inverted back at the end. Exponents whose
/// magnitude reaches [`MAX_EXPONENTIAL`] underflow to zero.
pub fn pow(base: u128, exp: i32) -> CoreResult<u128> {
    if exp == 0 {
        return Ok(ONE_Q64);
    }

    let mut invert = exp.is_negative();
    let exp = exp.unsigned_abs();
    if exp >= MAX_EXPONENTIAL {
        return Ok(0);
    }

    let mut squared_base = base;
    let mut result = ONE_Q64;

    if squared_base >= result {
        squared_base = u128::MAX
            .checked_div(squared_base)
            .ok_or(CurveError::DivisionByZero)?;
        invert = !invert;
    }

    let mut bits = exp;
    loop {
        if bits & 1 == 1 {
            result = result
                .checked_mul(squared_base)
                .ok_or(CurveError::MathOverflow)?
                >> SCALE_OFFSET;
        }
        bits >>= 1;
        if bits == 0 {
            break;
        }
        squared_base = squared_base
            .checked_mul(squared_base)
            .ok_or(CurveError::MathOverflow)?
            >> SCALE_OFFSET;
    }

    if result == 0 {
        return if invert {
            Err(CurveError::MathOverflow)
        } else {
            Ok(0)
        };
    }

    if invert {
        result = u128::MAX / result;
    }

    Ok(result)
}

// ============================================================================
// Scale Conversions
// ============================================================================

/// Convert basis points to a fee numerator over [`FEE_DENOMINATOR`]
pub fn bps_to_fee_numerator(bps: u64) -> CoreResult<u64> {
    mul_div_u64(bps, FEE_DENOMINATOR, BASIS_POINT_MAX, Rounding::Down)
}

/// Convert a fee numerator back to basis points, rounded down
pub fn fee_numerator_to_bps(fee_numerator: u64) -> CoreResult<u64> {
    mul_div_u64(fee_numerator, BASIS_POINT_MAX, FEE_DENOMINATOR, Rounding::Down)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt() {
        for n in [0u64, 1, 2, 3, 4, 15, 16, 17, 1_000_000, u64::MAX] {
            let root = isqrt(&BigUint::from(n));
            let r = BigUint::from(n);
            assert!(&root * &root <= r);
            assert!((&root + 1u32) * (&root + 1u32) > r);
        }
    }

    #[test]
    fn test_fixed_point_sqrt() {
        // sqrt(4.0) == 2.0 in Q64.64
        let four = BigInt::from(4u8) << 64u32;
        assert_eq!(sqrt(&four, 64).unwrap(), BigUint::from(2u8) << 64u32);

        // sqrt(2.0) in Q64.64
        let two = BigInt::from(2u8) << 64u32;
        assert_eq!(
            sqrt(&two, 64).unwrap(),
            BigUint::from(26087635650665564424u128)
        );

        assert_eq!(
            sqrt(&BigInt::from(-1), 64),
            Err(CurveError::NegativeSquareRoot)
        );
    }

    #[test]
    fn test_roots() {
        let n = BigUint::from(3u8).pow(16u32);
        assert_eq!(sixteenth_root(&n), BigUint::from(3u8));
        assert_eq!(sixteenth_root(&(n - 1u32)), BigUint::from(2u8));
        assert_eq!(fourth_root(&BigUint::from(81u8)), BigUint::from(3u8));
        assert_eq!(fourth_root(&BigUint::from(80u8)), BigUint::from(2u8));
    }

    #[test]
    fn test_pow_exact_fractions() {
        let half = ONE_Q64 / 2;
        assert_eq!(pow(half, 0).unwrap(), ONE_Q64);
        assert_eq!(pow(half, 1).unwrap(), half);
        assert_eq!(pow(half, 2).unwrap(), ONE_Q64 / 4);
        assert_eq!(pow(half, 10).unwrap(), ONE_Q64 >> 10);
    }

    #[test]
    fn test_pow_inverts_large_base() {
        let two = 2 * ONE_Q64;
        let eight = pow(two, 3).unwrap();
        let expected = 8 * ONE_Q64;
        assert!(eight.abs_diff(expected) < expected / 1_000_000_000);

        let inv = pow(ONE_Q64 / 2, -1).unwrap();
        assert!(inv.abs_diff(two) <= 1);
    }

    #[test]
    fn test_pow_underflow_policy() {
        assert_eq!(pow(ONE_Q64 / 2, MAX_EXPONENTIAL as i32).unwrap(), 0);
        assert_eq!(pow(ONE_Q64 / 2, 200).unwrap(), 0);
        assert_eq!(pow(0, 3).unwrap(), 0);
        assert_eq!(pow(0, -3), Err(CurveError::MathOverflow));
    }

    #[test]
    fn test_fee_numerator_conversions() {
        assert_eq!(bps_to_fee_numerator(100).unwrap(), 10_000_000);
        assert_eq!(bps_to_fee_numerator(9_900).unwrap(), 990_000_000);
        assert_eq!(fee_numerator_to_bps(2_500_000).unwrap(), 25);
        assert_eq!(fee_numerator_to_bps(2_599_999).unwrap(), 25);
    }
}
