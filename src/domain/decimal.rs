//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Every token amount, conversion rate and USD figure in the ledger flows through
//! this type so that repeated accumulation never drifts the way `f64` would.

use rust_decimal::Decimal as RustDecimal;
use std::fmt;
use std::str::FromStr;

/// Lossless decimal numeric type for ledger amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(RustDecimal);

impl Decimal {
    pub const fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// Inputs with more than 28 significant digits are rounded in the fractional part.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number or the integer part
    /// does not fit into 96 bits.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `None` when the sum does not fit in 96 bits of mantissa.
    pub fn checked_add(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_add(rhs.0).map(Decimal)
    }

    /// `None` when the product does not fit in 96 bits of mantissa.
    ///
    /// Excess fractional digits are rounded, only integer overflow fails.
    pub fn checked_mul(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_canonical_string_strips_trailing_zeros() {
        assert_eq!(d("4.8450").to_canonical_string(), "4.845");
        assert_eq!(d("1000.000000000000000000").to_canonical_string(), "1000");
        assert_eq!(d("0").to_canonical_string(), "0");
    }

    #[test]
    fn test_canonical_string_never_uses_exponent() {
        let tiny = d("0.000000000000000001");
        let formatted = tiny.to_canonical_string();
        assert!(!formatted.contains('e'));
        assert_eq!(formatted, "0.000000000000000001");
    }

    #[test]
    fn test_equality_ignores_scale() {
        assert_eq!(d("1.10"), d("1.1"));
        assert_eq!(d("104.50"), d("104.5"));
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = d("4.75");
        let b = d("1.02");
        assert_eq!(a.checked_mul(b).unwrap().to_canonical_string(), "4.845");
        assert_eq!(a.checked_add(b).unwrap().to_canonical_string(), "5.77");
    }

    #[test]
    fn test_checked_mul_overflow_is_none() {
        let large = d("100000000000000000000000");
        assert_eq!(large.checked_mul(d("1000000000")), None);
        assert_eq!(d("79228162514264337593543950335").checked_add(Decimal::one()), None);
    }

    #[test]
    fn test_checked_add_accumulates() {
        let total = Decimal::zero()
            .checked_add(d("0.255"))
            .and_then(|t| t.checked_add(d("4.845")))
            .unwrap();
        assert_eq!(total, d("5.1"));
    }
}
