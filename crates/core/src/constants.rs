//! Shared constants.

/// Blocks re-scanned behind the chain head when no checkpoint exists yet.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 5;

/// Largest decimal scale whose divisor `10^d` still fits in a `U256`.
pub const MAX_TOKEN_DECIMALS: u8 = 77;

/// Largest scale a `Decimal` can carry.
pub const MAX_DECIMAL_SCALE: u32 = 28;

/// Fractional digits shown for the effective fee rate.
pub const FEE_RATE_DISPLAY_DP: u32 = 4;
