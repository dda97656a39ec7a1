//! # Core Error Types
//!
//! Every failure in the engine is a returned value. Variants are grouped by the
//! four outcome classes callers care about, see [`ErrorKind`].

use thiserror::Error;

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize))]
pub enum CurveError {
    // ========================================================================
    // Arithmetic Errors
    // ========================================================================
    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Square root of a negative value")]
    NegativeSquareRoot,

    #[error("Conversion error")]
    ConversionError,

    #[error("Sqrt price or liquidity is zero")]
    ZeroPriceOrLiquidity,

    #[error("Next sqrt price denominator is not positive")]
    NonPositiveDenominator,

    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Invalid curve: {0}")]
    InvalidCurve(&'static str),

    #[error("Pool has already reached its migration threshold")]
    PoolCompleted,

    // ========================================================================
    // Trading Errors
    // ========================================================================
    #[error("Insufficient liquidity: {amount_left} units could not be absorbed")]
    InsufficientLiquidity { amount_left: u128 },

    // ========================================================================
    // Construction Errors
    // ========================================================================
    #[error("Reconciliation failure: {0}")]
    ReconciliationFailure(String),

    #[cfg(feature = "client")]
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Outcome classes every [`CurveError`] falls into.
///
/// None of them is transient: retrying the same call yields the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParameter,
    Arithmetic,
    InsufficientLiquidity,
    ReconciliationFailure,
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, CurveError>;

impl CurveError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Create a reconciliation failure with reason
    pub fn reconciliation(reason: impl Into<String>) -> Self {
        Self::ReconciliationFailure(reason.into())
    }

    /// Create an insufficient liquidity error for an unconsumed remainder
    pub fn insufficient_liquidity(amount_left: impl Into<u128>) -> Self {
        Self::InsufficientLiquidity {
            amount_left: amount_left.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MathOverflow
            | Self::MathUnderflow
            | Self::DivisionByZero
            | Self::NegativeSquareRoot
            | Self::ConversionError
            | Self::ZeroPriceOrLiquidity
            | Self::NonPositiveDenominator => ErrorKind::Arithmetic,
            Self::InvalidParameter { .. } | Self::InvalidCurve(_) | Self::PoolCompleted => {
                ErrorKind::InvalidParameter
            }
            #[cfg(feature = "client")]
            Self::Config(_) => ErrorKind::InvalidParameter,
            Self::InsufficientLiquidity { .. } => ErrorKind::InsufficientLiquidity,
            Self::ReconciliationFailure(_) => ErrorKind::ReconciliationFailure,
        }
    }
}
