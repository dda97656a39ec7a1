//! # Fee Engine
//!
//! Resolves the fee numerator for a trade (base schedule plus optional
//! volatility surcharge, capped at [`MAX_FEE_NUMERATOR`]) and splits the
//! resulting fee between LPs, protocol and referrer.

pub mod dynamic;
pub mod params;
pub mod rate_limiter;
pub mod scheduler;

pub use dynamic::get_variable_fee_numerator;
pub use params::{get_base_fee_params, get_dynamic_fee_params, get_rate_limiter_params};
pub use rate_limiter::FeeRateLimiter;
pub use scheduler::{FeeScheduler, SchedulerMode};

use ethnum::U256;

use crate::constants::{FEE_DENOMINATOR, MAX_FEE_NUMERATOR};
use crate::errors::{CoreResult, CurveError};
use crate::math::big_int::{mul_div_u64, Rounding};
use crate::math::safe_math::safe_sub_u64;
use crate::types::{
    BaseFeeConfig, BaseFeeMode, CollectFeeMode, FeeOnAmountResult, PoolFeesConfig,
    TradeDirection, VolatilityTracker,
};

/// A base fee schedule
pub trait BaseFeeHandler {
    fn validate(&self, collect_fee_mode: CollectFeeMode) -> CoreResult<()>;

    fn get_base_fee_numerator(
        &self,
        current_point: u64,
        activation_point: u64,
        direction: TradeDirection,
        amount_in: u64,
    ) -> CoreResult<u64>;
}

impl BaseFeeConfig {
    pub fn get_base_fee_handler(&self) -> Box<dyn BaseFeeHandler> {
        match self.base_fee_mode {
            BaseFeeMode::FeeSchedulerLinear | BaseFeeMode::FeeSchedulerExponential => {
                let mode = if self.base_fee_mode == BaseFeeMode::FeeSchedulerLinear {
                    SchedulerMode::Linear
                } else {
                    SchedulerMode::Exponential
                };
                Box::new(FeeScheduler {
                    cliff_fee_numerator: self.cliff_fee_numerator,
                    number_of_period: self.first_factor,
                    period_frequency: self.second_factor,
                    reduction_factor: self.third_factor,
                    mode,
                })
            }
            BaseFeeMode::RateLimiter => Box::new(FeeRateLimiter {
                cliff_fee_numerator: self.cliff_fee_numerator,
                fee_increment_bps: self.first_factor,
                max_limiter_duration: self.second_factor,
                reference_amount: self.third_factor,
            }),
        }
    }

    pub fn validate(&self, collect_fee_mode: CollectFeeMode) -> CoreResult<()> {
        self.get_base_fee_handler().validate(collect_fee_mode)
    }
}

impl PoolFeesConfig {
    pub fn validate(&self) -> CoreResult<()> {
        self.base_fee.validate(self.collect_fee_mode)?;
        if let Some(dynamic_fee) = &self.dynamic_fee {
            dynamic_fee.validate()?;
        }
        if self.protocol_fee_percent > 100 {
            return Err(CurveError::invalid_parameter(
                "protocol_fee_percent",
                "exceeds 100",
            ));
        }
        if self.referral_fee_percent > 100 {
            return Err(CurveError::invalid_parameter(
                "referral_fee_percent",
                "exceeds 100",
            ));
        }
        Ok(())
    }
}

/// Fee computation over one pool's fee configuration
#[derive(Debug, Clone, Copy)]
pub struct FeeEngine<'a> {
    config: &'a PoolFeesConfig,
}

impl<'a> FeeEngine<'a> {
    pub fn new(config: &'a PoolFeesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PoolFeesConfig {
        self.config
    }

    pub fn get_base_fee_numerator(
        &self,
        current_point: u64,
        activation_point: u64,
        direction: TradeDirection,
        amount_in: u64,
    ) -> CoreResult<u64> {
        self.config.base_fee.get_base_fee_handler().get_base_fee_numerator(
            current_point,
            activation_point,
            direction,
            amount_in,
        )
    }

    /// Base plus variable fee, capped at [`MAX_FEE_NUMERATOR`]
    pub fn get_total_fee_numerator(
        &self,
        tracker: &VolatilityTracker,
        current_point: u64,
        activation_point: u64,
        direction: TradeDirection,
        amount_in: u64,
    ) -> CoreResult<u64> {
        let base_fee_numerator =
            self.get_base_fee_numerator(current_point, activation_point, direction, amount_in)?;

        let variable_fee_numerator = match &self.config.dynamic_fee {
            Some(dynamic_fee) => get_variable_fee_numerator(dynamic_fee, tracker)?,
            None => U256::ZERO,
        };

        let total = U256::from(base_fee_numerator).saturating_add(variable_fee_numerator);
        Ok(total.min(U256::from(MAX_FEE_NUMERATOR)).as_u64())
    }

    /// Take the fee out of `amount` and split it.
    ///
    /// The trading fee rounds up, the protocol and referral cuts round down.
    pub fn get_fee_on_amount(
        &self,
        amount: u64,
        fee_numerator: u64,
        has_referral: bool,
    ) -> CoreResult<FeeOnAmountResult> {
        if fee_numerator > FEE_DENOMINATOR {
            return Err(CurveError::invalid_parameter(
                "fee_numerator",
                format!("{} exceeds {}", fee_numerator, FEE_DENOMINATOR),
            ));
        }

        let trading_fee = mul_div_u64(amount, fee_numerator, FEE_DENOMINATOR, Rounding::Up)?;
        let amount_after_fee = safe_sub_u64(amount, trading_fee)?;

        let protocol_fee = mul_div_u64(
            trading_fee,
            u64::from(self.config.protocol_fee_percent),
            100,
            Rounding::Down,
        )?;
        let trading_fee = trading_fee - protocol_fee;

        let referral_fee = if has_referral {
            mul_div_u64(
                protocol_fee,
                u64::from(self.config.referral_fee_percent),
                100,
                Rounding::Down,
            )?
        } else {
            0
        };
        let protocol_fee = protocol_fee - referral_fee;

        Ok(FeeOnAmountResult {
            amount: amount_after_fee,
            trading_fee,
            protocol_fee,
            referral_fee,
        })
    }
}
