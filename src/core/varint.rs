// CompactSize variable-length integers
//
// - value <= 0xfc: single byte
// - value <= 0xffff: 0xfd + 2 bytes little-endian
// - value <= 0xffffffff: 0xfe + 4 bytes little-endian
// - otherwise: 0xff + 8 bytes little-endian

use crate::core::endian::encode_little_endian;
use crate::error::{CodecError, Result};
use std::io::{Cursor, Read};

/// Encode a CompactSize integer as hex.
///
/// Takes a `u128` so that out-of-range values (anything above `u64::MAX`) are
/// reported instead of being unrepresentable at the call site.
pub fn encode_compact_size(value: u128) -> Result<String> {
    match value {
        0..=0xfc => encode_little_endian(value, 1),
        0xfd..=0xffff => Ok(format!("fd{}", encode_little_endian(value, 2)?)),
        0x1_0000..=0xffff_ffff => Ok(format!("fe{}", encode_little_endian(value, 4)?)),
        0x1_0000_0000..=0xffff_ffff_ffff_ffff => {
            Ok(format!("ff{}", encode_little_endian(value, 8)?))
        }
        _ => Err(CodecError::encoding(format!(
            "CompactSize value {} exceeds maximum 0xffffffffffffffff",
            value
        ))),
    }
}

/// Decode a CompactSize integer from a hex string.
///
/// `offset` counts bytes, not hex characters. Returns the value and the byte
/// offset just past it.
pub fn decode_compact_size(hex_str: &str, offset: usize) -> Result<(u64, usize)> {
    if hex_str.is_empty() || hex_str.len() % 2 != 0 {
        return Err(CodecError::decoding(
            "unable to decode CompactSize: invalid bytes string",
        ));
    }
    let bytes = hex::decode(hex_str)
        .map_err(|e| CodecError::decoding(format!("unable to decode CompactSize: {}", e)))?;
    if offset >= bytes.len() {
        return Err(CodecError::decoding(format!(
            "unable to decode CompactSize: offset {} past end of {} bytes",
            offset,
            bytes.len()
        )));
    }

    let mut cursor = Cursor::new(&bytes[offset..]);
    let value = read_compact_size(&mut cursor)?;
    Ok((value, offset + cursor.position() as usize))
}

/// Number of bytes the CompactSize encoding of `value` occupies
pub fn compact_size_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Append a CompactSize integer to a byte buffer
pub fn write_compact_size(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => {
            buf.push(value as u8);
        }
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

fn read_prefixed<const N: usize, R: Read + ?Sized>(reader: &mut R) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    reader.read_exact(&mut bytes).map_err(|_| {
        CodecError::decoding(format!(
            "unable to decode CompactSize: expected {} bytes after prefix",
            N
        ))
    })?;
    Ok(bytes)
}

fn non_canonical(value: u64) -> CodecError {
    CodecError::decoding(format!(
        "non-canonical CompactSize encoding of {}",
        value
    ))
}

/// Read a CompactSize integer from a byte stream.
///
/// Rejects encodings that use a longer form than the value needs.
pub fn read_compact_size<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut first_byte = [0u8; 1];
    reader
        .read_exact(&mut first_byte)
        .map_err(|_| CodecError::decoding("unable to decode CompactSize: no bytes left"))?;

    match first_byte[0] {
        0xfd => {
            let value = u16::from_le_bytes(read_prefixed(reader)?) as u64;
            if value < 0xfd {
                return Err(non_canonical(value));
            }
            Ok(value)
        }
        0xfe => {
            let value = u32::from_le_bytes(read_prefixed(reader)?) as u64;
            if value <= 0xffff {
                return Err(non_canonical(value));
            }
            Ok(value)
        }
        0xff => {
            let value = u64::from_le_bytes(read_prefixed(reader)?);
            if value <= 0xffff_ffff {
                return Err(non_canonical(value));
            }
            Ok(value)
        }
        b => Ok(b as u64),
    }
}
