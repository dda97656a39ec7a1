//! # Curve Types
//!
//! A bonding curve is a start price plus an ordered list of points. Point `i`
//! closes the segment that starts at point `i - 1` (or at the start price for
//! `i == 0`) and carries that segment's constant liquidity.

use crate::constants::{MAX_CURVE_POINT, MAX_SQRT_PRICE, MIN_SQRT_PRICE};
use crate::errors::{CoreResult, CurveError};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// One curve point, `{ upper_sqrt_price, liquidity }`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct CurveSegment {
    /// Upper bound of the segment (Q64.64)
    pub upper_sqrt_price: u128,
    /// Constant liquidity inside the segment
    pub liquidity: u128,
}

impl CurveSegment {
    pub fn new(upper_sqrt_price: u128, liquidity: u128) -> Self {
        Self {
            upper_sqrt_price,
            liquidity,
        }
    }
}

/// A segment with both bounds resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PriceSegment {
    pub lower_sqrt_price: u128,
    pub upper_sqrt_price: u128,
    pub liquidity: u128,
}

/// Piecewise constant-liquidity bonding curve
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct Curve {
    /// Price the pool opens at (Q64.64)
    pub sqrt_start_price: u128,
    /// Strictly increasing curve points
    pub segments: Vec<CurveSegment>,
}

impl Curve {
    /// Create a validated curve
    pub fn new(sqrt_start_price: u128, segments: Vec<CurveSegment>) -> CoreResult<Self> {
        let curve = Self {
            sqrt_start_price,
            segments,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Check ordering, bounds and point count
    pub fn validate(&self) -> CoreResult<()> {
        if self.segments.is_empty() {
            return Err(CurveError::InvalidCurve("curve has no points"));
        }
        if self.segments.len() > MAX_CURVE_POINT {
            return Err(CurveError::InvalidCurve("curve has too many points"));
        }
        if self.sqrt_start_price < MIN_SQRT_PRICE || self.sqrt_start_price >= MAX_SQRT_PRICE {
            return Err(CurveError::InvalidCurve("start price out of range"));
        }

        let mut previous = self.sqrt_start_price;
        for segment in &self.segments {
            if segment.upper_sqrt_price <= previous {
                return Err(CurveError::InvalidCurve("curve points must be strictly increasing"));
            }
            if segment.upper_sqrt_price > MAX_SQRT_PRICE {
                return Err(CurveError::InvalidCurve("curve point above max sqrt price"));
            }
            if segment.liquidity == 0 {
                return Err(CurveError::InvalidCurve("curve segment has zero liquidity"));
            }
            previous = segment.upper_sqrt_price;
        }

        Ok(())
    }

    /// Highest price reachable on the curve
    pub fn terminal_sqrt_price(&self) -> u128 {
        self.segments
            .last()
            .map(|s| s.upper_sqrt_price)
            .unwrap_or(self.sqrt_start_price)
    }

    /// Whether the last point closes the curve at [`MAX_SQRT_PRICE`]
    pub fn is_terminated(&self) -> bool {
        self.terminal_sqrt_price() == MAX_SQRT_PRICE
    }

    /// Segments with their lower bounds filled in
    pub fn price_segments(&self) -> Vec<PriceSegment> {
        let mut lower = self.sqrt_start_price;
        self.segments
            .iter()
            .map(|segment| {
                let resolved = PriceSegment {
                    lower_sqrt_price: lower,
                    upper_sqrt_price: segment.upper_sqrt_price,
                    liquidity: segment.liquidity,
                };
                lower = segment.upper_sqrt_price;
                resolved
            })
            .collect()
    }
}
