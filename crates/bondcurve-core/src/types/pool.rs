//! # Pool State
//!
//! Decoded pool accounts handed to the engine by the account layer. The engine
//! reads these, it never mutates them.

use crate::constants::{MAX_SQRT_PRICE, MIN_SQRT_PRICE};
use crate::errors::{CoreResult, CurveError};
use crate::types::fees::VolatilityTracker;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Snapshot of a bonding-curve pool at quote time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PoolSnapshot {
    pub sqrt_price: u128,
    /// Slot or timestamp the fee schedule counts from
    pub activation_point: u64,
    pub quote_reserve: u64,
    /// Quote reserve at which the pool migrates, if it ever does
    pub migration_quote_threshold: Option<u64>,
    pub volatility_tracker: VolatilityTracker,
}

impl PoolSnapshot {
    /// Quote reserve has reached the migration threshold
    pub fn is_completed(&self) -> bool {
        self.migration_quote_threshold
            .map(|threshold| self.quote_reserve >= threshold)
            .unwrap_or(false)
    }
}

/// Concentrated constant-product position range and its current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct ConstantProductPool {
    pub sqrt_price: u128,
    pub liquidity: u128,
    pub sqrt_min_price: u128,
    pub sqrt_max_price: u128,
}

impl ConstantProductPool {
    /// Full-range pool at `sqrt_price`
    pub fn full_range(sqrt_price: u128, liquidity: u128) -> Self {
        Self {
            sqrt_price,
            liquidity,
            sqrt_min_price: MIN_SQRT_PRICE,
            sqrt_max_price: MAX_SQRT_PRICE,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.sqrt_min_price < MIN_SQRT_PRICE
            || self.sqrt_max_price > MAX_SQRT_PRICE
            || self.sqrt_min_price >= self.sqrt_max_price
        {
            return Err(CurveError::invalid_parameter(
                "sqrt_price_range",
                format!("[{}, {}] is not a valid range", self.sqrt_min_price, self.sqrt_max_price),
            ));
        }
        if self.sqrt_price < self.sqrt_min_price || self.sqrt_price > self.sqrt_max_price {
            return Err(CurveError::invalid_parameter(
                "sqrt_price",
                "outside the pool price range",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ONE_Q64;

    #[test]
    fn test_completed_pool() {
        let mut pool = PoolSnapshot {
            sqrt_price: ONE_Q64,
            quote_reserve: 99,
            migration_quote_threshold: Some(100),
            ..Default::default()
        };
        assert!(!pool.is_completed());

        pool.quote_reserve = 100;
        assert!(pool.is_completed());

        pool.migration_quote_threshold = None;
        assert!(!pool.is_completed());
    }

    #[test]
    fn test_constant_product_range() {
        assert!(ConstantProductPool::full_range(ONE_Q64, 1).validate().is_ok());

        let mut pool = ConstantProductPool::full_range(ONE_Q64, 1);
        pool.sqrt_min_price = 2 * ONE_Q64;
        assert!(pool.validate().is_err());

        let mut pool = ConstantProductPool::full_range(ONE_Q64, 1);
        pool.sqrt_max_price = ONE_Q64 - 1;
        assert!(pool.validate().is_err());
    }
}
