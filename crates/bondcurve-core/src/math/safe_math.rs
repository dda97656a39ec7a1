//! # Safe Math Operations
//!
//! Overflow-checked arithmetic for token amounts and fixed-point values.

use crate::errors::{CoreResult, CurveError};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Narrowing cast
    (cast, $fn_name:ident, $from_type:ty, $to_type:ty) => {
        pub fn $fn_name(value: $from_type) -> CoreResult<$to_type> {
            <$to_type>::try_from(value).map_err(|_| CurveError::ConversionError)
        }
    };

    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

safe_arith!(safe_add_u64, u64, checked_add, CurveError::MathOverflow);
safe_arith!(safe_sub_u64, u64, checked_sub, CurveError::MathUnderflow);
safe_arith!(safe_mul_u64, u64, checked_mul, CurveError::MathOverflow);

safe_arith!(safe_sub_u128, u128, checked_sub, CurveError::MathUnderflow);

safe_arith!(cast, safe_cast_u128_to_u64, u128, u64);

/// Apply a basis-point haircut, `amount * (10000 - bps) / 10000` rounded down
pub fn apply_slippage_bps(amount: u64, slippage_bps: u16) -> CoreResult<u64> {
    use crate::constants::BASIS_POINT_MAX;
    use crate::math::big_int::{mul_div_u64, Rounding};

    let slippage = u64::from(slippage_bps);
    if slippage > BASIS_POINT_MAX {
        return Err(CurveError::invalid_parameter(
            "slippage_bps",
            format!("{} exceeds {}", slippage, BASIS_POINT_MAX),
        ));
    }
    mul_div_u64(amount, BASIS_POINT_MAX - slippage, BASIS_POINT_MAX, Rounding::Down)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_arith() {
        assert_eq!(safe_add_u64(100, 200).unwrap(), 300);
        assert_eq!(safe_add_u64(u64::MAX, 1), Err(CurveError::MathOverflow));
        assert_eq!(safe_sub_u64(100, 200), Err(CurveError::MathUnderflow));
        assert_eq!(safe_mul_u64(1 << 32, 1 << 32), Err(CurveError::MathOverflow));
        assert_eq!(safe_sub_u128(100, 1).unwrap(), 99);
    }

    #[test]
    fn test_safe_cast() {
        assert_eq!(safe_cast_u128_to_u64(42).unwrap(), 42);
        assert_eq!(
            safe_cast_u128_to_u64(u64::MAX as u128 + 1),
            Err(CurveError::ConversionError)
        );
    }

    #[test]
    fn test_apply_slippage() {
        assert_eq!(apply_slippage_bps(10_000, 0).unwrap(), 10_000);
        assert_eq!(apply_slippage_bps(10_000, 100).unwrap(), 9_900);
        assert_eq!(apply_slippage_bps(999, 1).unwrap(), 998);
        assert_eq!(apply_slippage_bps(10_000, 10_000).unwrap(), 0);
        assert!(apply_slippage_bps(1, 10_001).is_err());
    }
}
