//! Fixed-point scaling between raw on-chain integers and decimal amounts.

use super::decimal::Decimal;
use alloy_primitives::U256;
use rust_decimal::Decimal as RustDecimal;
use thiserror::Error;

/// Largest precision `rust_decimal` can hold as a scale.
pub const MAX_DECIMALS: u32 = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("unsupported decimal precision {0} (max 28)")]
    UnsupportedDecimals(u32),
    #[error("raw amount {raw} with {decimals} decimals does not fit a decimal")]
    Overflow { raw: U256, decimals: u32 },
}

/// Returns 10^decimals as an exact decimal.
///
/// Exposed for callers that scale decimal amounts. [`to_decimal_amount`] does not
/// divide by it: raw values wider than 96 bits are scaled on their digit string.
pub fn decimal_divisor(decimals: u32) -> Result<Decimal, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::UnsupportedDecimals(decimals));
    }
    RustDecimal::try_from_i128_with_scale(10i128.pow(decimals), 0)
        .map(Decimal::new)
        .map_err(|_| UnitsError::UnsupportedDecimals(decimals))
}

/// One whole token unit in raw on-chain representation (10^decimals).
pub fn one_unit(decimals: u32) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Converts a raw on-chain integer into a decimal amount: `raw / 10^decimals`.
///
/// The division is done on the digit string rather than through a 96-bit
/// intermediate, so raw values larger than `rust_decimal` can hold still convert
/// as long as the scaled result fits.
pub fn to_decimal_amount(raw: U256, decimals: u32) -> Result<Decimal, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::UnsupportedDecimals(decimals));
    }

    let digits = raw.to_string();
    let scale = decimals as usize;
    let formatted = if scale == 0 {
        digits
    } else if digits.len() > scale {
        let (whole, frac) = digits.split_at(digits.len() - scale);
        format!("{}.{}", whole, frac)
    } else {
        format!("0.{}{}", "0".repeat(scale - digits.len()), digits)
    };

    Decimal::from_str_canonical(&formatted).map_err(|_| UnitsError::Overflow { raw, decimals })
}

/// Converts a share-denominated amount into underlying-token units.
///
/// `None` when the product does not fit a decimal.
pub fn shares_to_underlying(shares: Decimal, share_to_token_rate: Decimal) -> Option<Decimal> {
    shares.checked_mul(share_to_token_rate)
}
