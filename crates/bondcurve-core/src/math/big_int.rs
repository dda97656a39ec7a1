//! Big integer operations for exact fixed-point calculations
//!
//! Hot-path arithmetic runs on [`ethnum::U256`] so that intermediate products of
//! Q64.64 prices and Q128 liquidity never silently wrap. Every division takes an
//! explicit [`Rounding`].

use ethnum::U256;
use num::{BigUint, Integer};
use num_traits::{ToPrimitive, Zero};

use crate::errors::{CoreResult, CurveError};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// Divide with the requested rounding
pub fn div_rounding(numerator: U256, denominator: U256, rounding: Rounding) -> CoreResult<U256> {
    if denominator == U256::ZERO {
        return Err(CurveError::DivisionByZero);
    }

    let quotient = numerator / denominator;
    match rounding {
        Rounding::Down => Ok(quotient),
        Rounding::Up => {
            if numerator % denominator != U256::ZERO {
                quotient.checked_add(U256::ONE).ok_or(CurveError::MathOverflow)
            } else {
                Ok(quotient)
            }
        }
    }
}

/// Multiply two values and divide by a third with specified rounding
/// result = (x * y) / denominator
pub fn mul_div(x: U256, y: U256, denominator: U256, rounding: Rounding) -> CoreResult<U256> {
    if denominator == U256::ZERO {
        return Err(CurveError::DivisionByZero);
    }

    let product = x.checked_mul(y).ok_or(CurveError::MathOverflow)?;
    div_rounding(product, denominator, rounding)
}

/// Multiply two u64 values and divide by a third with specified rounding
pub fn mul_div_u64(x: u64, y: u64, denominator: u64, rounding: Rounding) -> CoreResult<u64> {
    if denominator == 0 {
        return Err(CurveError::DivisionByZero);
    }

    let product = (x as u128) * (y as u128);
    let quotient = product / (denominator as u128);
    let remainder = product % (denominator as u128);

    let mut result = quotient;
    if rounding == Rounding::Up && remainder > 0 {
        result = result.checked_add(1).ok_or(CurveError::MathOverflow)?;
    }

    result.try_into().map_err(|_| CurveError::MathOverflow)
}

/// Shift right with rounding, `value / 2^bits`
pub fn shr_rounding(value: U256, bits: u32, rounding: Rounding) -> CoreResult<U256> {
    if bits >= 256 {
        return Err(CurveError::MathOverflow);
    }
    let shifted = value >> bits;
    match rounding {
        Rounding::Down => Ok(shifted),
        Rounding::Up => {
            if shifted << bits != value {
                shifted.checked_add(U256::ONE).ok_or(CurveError::MathOverflow)
            } else {
                Ok(shifted)
            }
        }
    }
}

/// Shift left, failing when bits fall off the top
pub fn checked_shl(value: U256, bits: u32) -> CoreResult<U256> {
    if value == U256::ZERO {
        return Ok(value);
    }
    if bits >= 256 || value.leading_zeros() < bits {
        return Err(CurveError::MathOverflow);
    }
    Ok(value << bits)
}

/// Narrow a U256 to u128
pub fn u256_to_u128(value: U256) -> CoreResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(CurveError::MathOverflow);
    }
    Ok(value.as_u128())
}

/// Narrow a U256 to u64
pub fn u256_to_u64(value: U256) -> CoreResult<u64> {
    if value > U256::from(u64::MAX) {
        return Err(CurveError::MathOverflow);
    }
    Ok(value.as_u64())
}

// ============================================================================
// Arbitrary Precision Helpers
// ============================================================================

/// Divide two arbitrary precision values with the requested rounding
pub fn big_div_rounding(
    numerator: &BigUint,
    denominator: &BigUint,
    rounding: Rounding,
) -> CoreResult<BigUint> {
    if denominator.is_zero() {
        return Err(CurveError::DivisionByZero);
    }
    let (quotient, remainder) = numerator.div_rem(denominator);
    if rounding == Rounding::Up && !remainder.is_zero() {
        Ok(quotient + 1u32)
    } else {
        Ok(quotient)
    }
}

/// Narrow an arbitrary precision value to u128
pub fn big_to_u128(value: &BigUint) -> CoreResult<u128> {
    value.to_u128().ok_or(CurveError::MathOverflow)
}

/// Narrow an arbitrary precision value to u64
pub fn big_to_u64(value: &BigUint) -> CoreResult<u64> {
    value.to_u64().ok_or(CurveError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounding() {
        // Test rounding down
        let result = mul_div_u64(10, 3, 4, Rounding::Down).unwrap();
        assert_eq!(result, 7); // 30 / 4 = 7.5, rounds down to 7

        // Test rounding up
        let result = mul_div_u64(10, 3, 4, Rounding::Up).unwrap();
        assert_eq!(result, 8); // 30 / 4 = 7.5, rounds up to 8

        // Test exact division
        let result = mul_div_u64(10, 4, 5, Rounding::Up).unwrap();
        assert_eq!(result, 8);
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert_eq!(
            mul_div_u64(1, 1, 0, Rounding::Down),
            Err(CurveError::DivisionByZero)
        );
        assert_eq!(
            mul_div(U256::ONE, U256::ONE, U256::ZERO, Rounding::Up),
            Err(CurveError::DivisionByZero)
        );
    }

    #[test]
    fn test_mul_div_large_numbers() {
        // Product needs the full 256 bits
        let max = U256::from(u128::MAX);
        assert_eq!(mul_div(max, max, max, Rounding::Up).unwrap(), max);
        assert_eq!(
            mul_div_u64(u64::MAX, u64::MAX, u64::MAX, Rounding::Down).unwrap(),
            u64::MAX
        );

        assert_eq!(
            mul_div(U256::MAX, U256::from(2u8), U256::ONE, Rounding::Down),
            Err(CurveError::MathOverflow)
        );
    }

    #[test]
    fn test_shr_rounding() {
        let value = U256::from(5u8);
        assert_eq!(shr_rounding(value, 1, Rounding::Down).unwrap(), U256::from(2u8));
        assert_eq!(shr_rounding(value, 1, Rounding::Up).unwrap(), U256::from(3u8));
        assert_eq!(
            shr_rounding(U256::from(4u8), 1, Rounding::Up).unwrap(),
            U256::from(2u8)
        );
    }

    #[test]
    fn test_checked_shl() {
        assert_eq!(checked_shl(U256::ONE, 128).unwrap(), U256::from_words(1, 0));
        assert!(checked_shl(U256::from_words(1, 0), 128).is_err());
        assert_eq!(checked_shl(U256::ZERO, 255).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_big_div_rounding() {
        let n = BigUint::from(30u32);
        let d = BigUint::from(4u32);
        assert_eq!(big_div_rounding(&n, &d, Rounding::Down).unwrap(), BigUint::from(7u32));
        assert_eq!(big_div_rounding(&n, &d, Rounding::Up).unwrap(), BigUint::from(8u32));
        assert_eq!(
            big_div_rounding(&n, &BigUint::zero(), Rounding::Up),
            Err(CurveError::DivisionByZero)
        );
    }

    #[test]
    fn test_narrowing() {
        assert_eq!(u256_to_u128(U256::from(7u8)).unwrap(), 7);
        assert!(u256_to_u128(U256::from_words(1, 0)).is_err());
        assert!(u256_to_u64(U256::from(u128::from(u64::MAX) + 1)).is_err());
    }
}
