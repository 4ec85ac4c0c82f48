//! Hex number parsing for resource ids

/// Parse a hex number with an optional `0x`/`0X` prefix into any unsigned
/// integer type it fits in.
///
/// # Errors
/// Returns a message if the text is empty, not hex, or too large for `T`.
pub fn parse_hex<T: TryFrom<u64>>(text: &str) -> Result<T, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return Err(format!("empty hex value '{text}'"));
    }
    let value = u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{text}': {e}"))?;
    T::try_from(value).map_err(|_| format!("hex value '{text}' is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_prefixes() {
        assert_eq!(parse_hex::<u32>("0x545AC67A"), Ok(0x545AC67A));
        assert_eq!(parse_hex::<u32>("545ac67a"), Ok(0x545AC67A));
        assert_eq!(parse_hex::<u64>("0XFFFFFFFFFFFFFFFF"), Ok(u64::MAX));
    }

    #[test]
    fn test_parse_hex_rejects() {
        assert!(parse_hex::<u32>("").is_err());
        assert!(parse_hex::<u32>("0x").is_err());
        assert!(parse_hex::<u32>("xyz").is_err());
        assert!(parse_hex::<u32>("100000000").is_err());
    }
}
