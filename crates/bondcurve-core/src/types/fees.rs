//! # Fee Types
//!
//! Fee configuration as stored in a pool config, plus the per-trade fee mode
//! and fee breakdown.

use crate::constants::{PROTOCOL_FEE_PERCENT, REFERRAL_FEE_PERCENT};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Direction of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum TradeDirection {
    /// Sell base for quote, price moves down
    BaseToQuote,
    /// Buy base with quote, price moves up
    QuoteToBase,
}


/// Token the pool collects its fees in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum CollectFeeMode {
    /// Always collect in quote token
    #[default]
    QuoteToken,
    /// Collect in whichever token leaves the pool
    OutputToken,
}

/// Base fee schedule selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum BaseFeeMode {
    #[default]
    FeeSchedulerLinear,
    FeeSchedulerExponential,
    RateLimiter,
}

/// Base fee as stored on chain.
///
/// Factor meaning depends on the mode:
///
/// | mode       | first_factor      | second_factor        | third_factor     |
/// |------------|-------------------|----------------------|------------------|
/// | scheduler  | number_of_period  | period_frequency     | reduction_factor |
/// | limiter    | fee_increment_bps | max_limiter_duration | reference_amount |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct BaseFeeConfig {
    pub cliff_fee_numerator: u64,
    pub first_factor: u16,
    pub second_factor: u64,
    pub third_factor: u64,
    pub base_fee_mode: BaseFeeMode,
}

/// Volatility-based fee parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct DynamicFeeConfig {
    pub bin_step: u16,
    /// Bin step in Q64.64 divided by the basis point scale
    pub bin_step_u128: u128,
    pub filter_period: u16,
    pub decay_period: u16,
    pub reduction_factor: u16,
    pub max_volatility_accumulator: u32,
    pub variable_fee_control: u32,
}

/// Live volatility state kept by the pool.
///
/// Owned and updated by the pool account. The fee engine only reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct VolatilityTracker {
    pub last_update_timestamp: u64,
    pub sqrt_price_reference: u128,
    pub volatility_accumulator: u128,
    pub volatility_reference: u128,
}

/// Full fee configuration of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PoolFeesConfig {
    pub base_fee: BaseFeeConfig,
    pub dynamic_fee: Option<DynamicFeeConfig>,
    /// Share of the trading fee routed to the protocol (percent)
    pub protocol_fee_percent: u8,
    /// Share of the protocol fee paid to a referrer (percent)
    pub referral_fee_percent: u8,
    pub collect_fee_mode: CollectFeeMode,
}

impl Default for PoolFeesConfig {
    fn default() -> Self {
        Self {
            base_fee: BaseFeeConfig::default(),
            dynamic_fee: None,
            protocol_fee_percent: PROTOCOL_FEE_PERCENT,
            referral_fee_percent: REFERRAL_FEE_PERCENT,
            collect_fee_mode: CollectFeeMode::default(),
        }
    }
}

/// Where a trade pays its fee
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct FeeMode {
    /// Fee is taken from the input amount before the swap
    pub fees_on_input: bool,
    /// Fee is denominated in base token
    pub fees_on_base_token: bool,
    pub has_referral: bool,
}

impl FeeMode {
    pub fn resolve(
        collect_fee_mode: CollectFeeMode,
        direction: TradeDirection,
        has_referral: bool,
    ) -> Self {
        let (fees_on_input, fees_on_base_token) = match (collect_fee_mode, direction) {
            (CollectFeeMode::QuoteToken, TradeDirection::QuoteToBase) => (true, false),
            (CollectFeeMode::QuoteToken, TradeDirection::BaseToQuote) => (false, false),
            (CollectFeeMode::OutputToken, TradeDirection::QuoteToBase) => (false, true),
            (CollectFeeMode::OutputToken, TradeDirection::BaseToQuote) => (false, false),
        };

        Self {
            fees_on_input,
            fees_on_base_token,
            has_referral,
        }
    }
}

/// Fee split applied to one amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct FeeOnAmountResult {
    /// Amount left after the fee
    pub amount: u64,
    /// LP share of the fee
    pub trading_fee: u64,
    /// Protocol share, net of the referral cut
    pub protocol_fee: u64,
    pub referral_fee: u64,
}

impl FeeOnAmountResult {
    pub fn total_fee(&self) -> u64 {
        self.trading_fee
            .saturating_add(self.protocol_fee)
            .saturating_add(self.referral_fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_mode_table() {
        let mode = FeeMode::resolve(CollectFeeMode::QuoteToken, TradeDirection::QuoteToBase, false);
        assert!(mode.fees_on_input);
        assert!(!mode.fees_on_base_token);

        let mode = FeeMode::resolve(CollectFeeMode::QuoteToken, TradeDirection::BaseToQuote, true);
        assert!(!mode.fees_on_input);
        assert!(!mode.fees_on_base_token);
        assert!(mode.has_referral);

        let mode = FeeMode::resolve(CollectFeeMode::OutputToken, TradeDirection::QuoteToBase, false);
        assert!(!mode.fees_on_input);
        assert!(mode.fees_on_base_token);

        let mode = FeeMode::resolve(CollectFeeMode::OutputToken, TradeDirection::BaseToQuote, false);
        assert!(!mode.fees_on_input);
        assert!(!mode.fees_on_base_token);
    }

    #[test]
    fn test_default_split() {
        let config = PoolFeesConfig::default();
        assert_eq!(config.protocol_fee_percent, 20);
        assert_eq!(config.referral_fee_percent, 20);
        assert!(config.dynamic_fee.is_none());
    }
}
