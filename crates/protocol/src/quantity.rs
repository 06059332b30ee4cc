//! Normalisation of on-chain quantities to decimal strings.
//!
//! Providers report balances and block numbers either as `0x`-prefixed hex
//! or as decimal strings. Consumers always see the decimal form.

/// Parses a hex (`0x...`) or decimal quantity and renders it in decimal.
///
/// Returns `None` for empty, negative or out-of-range input.
pub fn normalize_quantity(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some("") => return None,
        Some(hex) => u128::from_str_radix(hex, 16).ok()?,
        None => raw.parse::<u128>().ok()?,
    };
    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_quantities() {
        assert_eq!(normalize_quantity("0x0").as_deref(), Some("0"));
        assert_eq!(normalize_quantity("0x10").as_deref(), Some("16"));
        assert_eq!(
            normalize_quantity("0x1bc16d674ec80000").as_deref(),
            Some("2000000000000000000")
        );
    }

    #[test]
    fn decimal_quantities() {
        assert_eq!(normalize_quantity("12345").as_deref(), Some("12345"));
        assert_eq!(normalize_quantity(" 7 ").as_deref(), Some("7"));
    }

    #[test]
    fn balances_beyond_u64() {
        // 100 000 KLAY in peb.
        assert_eq!(
            normalize_quantity("0x152d02c7e14af6800000").as_deref(),
            Some("100000000000000000000000")
        );
    }

    #[test]
    fn invalid_quantities() {
        assert_eq!(normalize_quantity(""), None);
        assert_eq!(normalize_quantity("0x"), None);
        assert_eq!(normalize_quantity("-1"), None);
        assert_eq!(normalize_quantity("0xzz"), None);
    }
}
