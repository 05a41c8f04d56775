//! Currency unit conversion
//!
//! Amounts travel as integers in the smallest unit. Display strings are
//! exact: no floating point is involved in either direction.

use crate::{Error, Result};
use ethereum_types::U256;

/// Fractional digits of the native currency
pub const ETHER_DECIMALS: u32 = 18;

/// Largest `decimals` a `U256` can represent (10^77 < 2^256 < 10^78)
const MAX_DECIMALS: u32 = 77;

/// Render a smallest-unit amount as a decimal string.
///
/// Trailing fractional zeros are trimmed but at least one fractional digit
/// is kept, so `10^16` with 18 decimals is `"0.01"` and `10^18` is `"1.0"`.
pub fn format_units(value: U256, decimals: u32) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return format!("{digits}.0");
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    let frac = if frac.is_empty() { "0" } else { frac };
    format!("{whole}.{frac}")
}

/// [`format_units`] with the native 18 decimals
pub fn format_ether(value: U256) -> String {
    format_units(value, ETHER_DECIMALS)
}

/// Parse a decimal string into a smallest-unit amount.
///
/// Rejects signs, exponents, and more fractional digits than the unit has.
pub fn parse_units(amount: &str, decimals: u32) -> Result<U256> {
    let invalid = |why: &str| Error::InvalidAmount(format!("{amount:?}: {why}"));

    if decimals > MAX_DECIMALS {
        return Err(invalid("too many decimals"));
    }

    let trimmed = amount.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("empty"));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("not a decimal number"));
    }
    if frac.len() > decimals as usize {
        return Err(invalid("too many fractional digits"));
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(if whole.is_empty() { "0" } else { whole });
    digits.push_str(frac);
    digits.push_str(&"0".repeat(decimals as usize - frac.len()));

    U256::from_dec_str(&digits).map_err(|_| invalid("out of range"))
}

/// [`parse_units`] with the native 18 decimals
pub fn parse_ether(amount: &str) -> Result<U256> {
    parse_units(amount, ETHER_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pow10(n: usize) -> U256 {
        U256::exp10(n)
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_ether(U256::from(10_000_000_000_000_000u64)), "0.01");
        assert_eq!(format_ether(pow10(18)), "1.0");
        assert_eq!(format_ether(U256::zero()), "0.0");
        assert_eq!(format_ether(U256::one()), "0.000000000000000001");
        assert_eq!(format_ether(pow10(18) * 1234 + pow10(15) * 5), "1234.005");
    }

    #[test]
    fn test_format_other_decimals() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(42u64), 0), "42.0");
    }

    #[test]
    fn test_format_keeps_full_precision() {
        let value = U256::from_dec_str("123456789012345678901234567890").unwrap();
        assert_eq!(format_ether(value), "123456789012.34567890123456789");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_ether("0.01").unwrap(), pow10(16));
        assert_eq!(parse_ether("1").unwrap(), pow10(18));
        assert_eq!(parse_ether(".5").unwrap(), pow10(17) * 5);
        assert_eq!(parse_ether("2.").unwrap(), pow10(18) * 2);
        assert_eq!(parse_units("1.5", 6).unwrap(), U256::from(1_500_000u64));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", ".", "-1", "1e18", "abc", "1.2.3", "0.0000000000000000001"] {
            assert!(parse_ether(bad).is_err(), "{bad} should not parse");
        }
        assert!(parse_units("1", 78).is_err());
    }

    #[test]
    fn test_parse_inverts_format() {
        for v in [0u64, 1, 999, 10_000_000_000_000_000, u64::MAX] {
            let value = U256::from(v);
            assert_eq!(parse_ether(&format_ether(value)).unwrap(), value);
        }
    }
}
