// Byte-order helpers over hex-encoded values

use crate::error::{CodecError, Result};

fn check_hex(hex_str: &str, what: &str) -> Result<()> {
    if hex_str.len() % 2 != 0 {
        return Err(CodecError::decoding(format!(
            "unable to {}: odd-length hex string ({} chars)",
            what,
            hex_str.len()
        )));
    }
    if !hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CodecError::decoding(format!(
            "unable to {}: non-hex character in {:?}",
            what, hex_str
        )));
    }
    Ok(())
}

/// Reverse the byte order of a hex string, keeping the digits' case.
///
/// `"00000001"` becomes `"01000000"`.
pub fn reverse_bytes(hex_str: &str) -> Result<String> {
    check_hex(hex_str, "reverse bytes")?;

    let mut reversed = String::with_capacity(hex_str.len());
    for pair in hex_str.as_bytes().chunks(2).rev() {
        reversed.push(pair[0] as char);
        reversed.push(pair[1] as char);
    }
    Ok(reversed)
}

/// Encode `value` as a little-endian field of `width_bytes` bytes.
///
/// The natural hex form is left-padded to an even length, byte-reversed and
/// then right-padded with zero bytes up to the field width.
pub fn encode_little_endian(value: u128, width_bytes: usize) -> Result<String> {
    let mut natural = format!("{:x}", value);
    if natural.len() % 2 != 0 {
        natural.insert(0, '0');
    }
    if natural.len() > width_bytes * 2 {
        return Err(CodecError::encoding(format!(
            "value {} does not fit in {} bytes",
            value, width_bytes
        )));
    }

    let mut encoded = reverse_bytes(&natural)?;
    while encoded.len() < width_bytes * 2 {
        encoded.push('0');
    }
    Ok(encoded)
}

fn parse_le_digits(hex_str: &str, max_bytes: usize) -> Result<String> {
    check_hex(hex_str, "parse little-endian integer")?;
    if hex_str.is_empty() {
        return Err(CodecError::decoding("unable to parse little-endian integer: empty input"));
    }
    if hex_str.len() > max_bytes * 2 {
        return Err(CodecError::decoding(format!(
            "little-endian integer wider than {} bytes",
            max_bytes
        )));
    }
    reverse_bytes(hex_str)
}

/// Parse a little-endian hex field of up to 8 bytes
pub fn parse_little_endian(hex_str: &str) -> Result<u64> {
    let big_endian = parse_le_digits(hex_str, 8)?;
    u64::from_str_radix(&big_endian, 16)
        .map_err(|e| CodecError::decoding(format!("invalid little-endian integer: {}", e)))
}

/// Parse a little-endian hex field of up to 16 bytes.
///
/// Satoshi amounts use this path so callers never truncate an 8-byte value.
pub fn parse_little_endian_wide(hex_str: &str) -> Result<u128> {
    let big_endian = parse_le_digits(hex_str, 16)?;
    u128::from_str_radix(&big_endian, 16)
        .map_err(|e| CodecError::decoding(format!("invalid little-endian integer: {}", e)))
}
