//! Raw token amount to human-scale conversion.
//!
//! Converts an on-chain `uint256` amount into a `Decimal` by splitting it into
//! an integer quotient and a remainder over `10^decimals`, so no binary
//! floating point is involved at any step.

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::constants::{MAX_DECIMAL_SCALE, MAX_TOKEN_DECIMALS};
use crate::error::{CoreError, Result};

/// Convert a raw token amount to its human-scale value, `raw / 10^decimals`.
///
/// The result is exact whenever it fits in a `Decimal` (96-bit mantissa,
/// at most 28 fractional digits). Fractional digits beyond the 28th are
/// truncated.
///
/// # Errors
///
/// - `CoreError::InvalidDecimals` if `decimals` exceeds 77.
/// - `CoreError::AmountOverflow` if the integer part does not fit a `Decimal`.
///
/// # Example
///
/// ```
/// use flowstat_core::{to_human, Decimal, U256};
///
/// let human = to_human(U256::from(5_000_000u64), 6).unwrap();
/// assert_eq!(human, Decimal::from(5));
///
/// let human = to_human(U256::from(1u64), 6).unwrap();
/// assert_eq!(human, Decimal::new(1, 6));
/// ```
pub fn to_human(raw: U256, decimals: u8) -> Result<Decimal> {
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(CoreError::InvalidDecimals(decimals));
    }

    let overflow = || CoreError::AmountOverflow {
        raw: raw.to_string(),
        decimals,
    };

    let divisor = pow10(decimals as u32);
    let (quotient, remainder) = raw.div_rem(divisor);

    let whole = i128::try_from(quotient).map_err(|_| overflow())?;
    let whole = Decimal::try_from_i128_with_scale(whole, 0).map_err(|_| overflow())?;

    if remainder.is_zero() {
        return Ok(whole);
    }

    // Keep at most 28 fractional digits; anything past that is truncated.
    let scale = (decimals as u32).min(MAX_DECIMAL_SCALE);
    let fraction = remainder / pow10(decimals as u32 - scale);
    let fraction = i128::try_from(fraction).map_err(|_| overflow())?;
    let fraction = Decimal::try_from_i128_with_scale(fraction, scale).map_err(|_| overflow())?;

    whole.checked_add(fraction).ok_or_else(overflow)
}

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}
