//! Error types for the core crate.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Raw amount is too large to be represented as a `Decimal` after scaling.
    #[error("Amount {raw} with {decimals} decimals overflows the decimal range")]
    AmountOverflow {
        /// Raw on-chain integer, rendered in base 10.
        raw: String,
        /// Decimal scale of the token.
        decimals: u8,
    },

    /// Decimal scale outside the supported range.
    #[error("Invalid token decimals: {0} (must be at most 77)")]
    InvalidDecimals(u8),
}

/// Result type alias for CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
