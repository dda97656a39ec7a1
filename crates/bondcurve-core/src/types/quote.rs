//! # Quote Types

use fixed::types::U64F64;

use crate::types::fees::TradeDirection;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Inputs of a single exact-in swap quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct SwapQuoteParams {
    pub amount_in: u64,
    pub direction: TradeDirection,
    /// Slot or timestamp, matching the pool's activation type
    pub current_point: u64,
    pub slippage_bps: u16,
    pub has_referral: bool,
}

/// Result of walking a curve, before fees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct SwapAmount {
    pub output_amount: u64,
    pub next_sqrt_price: u128,
}

/// Complete swap quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct QuoteResult {
    pub amount_out: u64,
    pub minimum_amount_out: u64,
    pub next_sqrt_price: u128,
    pub trading_fee: u64,
    pub protocol_fee: u64,
    pub referral_fee: u64,
    /// Fee numerator applied to this trade
    pub fee_numerator: u64,
    /// `|execution - spot| / spot`
    pub price_impact: U64F64,
}

/// Liquidity deposit sized from one side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct DepositQuote {
    pub liquidity_delta: u128,
    pub base_amount: u64,
    pub quote_amount: u64,
    /// Most base the depositor accepts to pay after slippage
    pub base_amount_threshold: u64,
    /// Most quote the depositor accepts to pay after slippage
    pub quote_amount_threshold: u64,
}

/// Liquidity withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct WithdrawQuote {
    pub liquidity_delta: u128,
    pub base_amount: u64,
    pub quote_amount: u64,
    pub min_base_amount: u64,
    pub min_quote_amount: u64,
}
