//! # Bonding Curve
//!
//! Multi-segment [`LiquidityCurve`] over a [`Curve`] config.

use crate::curve::LiquidityCurve;
use crate::types::{Curve, PriceSegment};

impl LiquidityCurve for Curve {
    fn segments(&self) -> Vec<PriceSegment> {
        self.price_segments()
    }
}
