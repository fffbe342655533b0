// Byte-level serialization helpers for wire structures

use crate::core::varint::{read_compact_size, write_compact_size};
use crate::error::{CodecError, Result};
use std::io::Read;

/// Types that append their wire form to a buffer
pub trait Encodable {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<()>;
}

/// Types that read their wire form from a byte stream
pub trait Decodable: Sized {
    fn decode_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self>;
}

/// Read exactly `N` bytes, naming the field on failure
pub fn read_array<const N: usize, R: Read + ?Sized>(reader: &mut R, field: &str) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    reader
        .read_exact(&mut bytes)
        .map_err(|_| CodecError::decoding(format!("truncated {}: expected {} bytes", field, N)))?;
    Ok(bytes)
}

/// Write bytes with a CompactSize length prefix
pub fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_compact_size(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

/// Read CompactSize-prefixed bytes.
///
/// Reads through `take` so a corrupt length never triggers a huge allocation.
pub fn read_var_bytes<R: Read + ?Sized>(reader: &mut R, field: &str) -> Result<Vec<u8>> {
    let len = read_compact_size(reader)?;
    let mut data = Vec::new();
    reader
        .take(len)
        .read_to_end(&mut data)
        .map_err(|e| CodecError::decoding(format!("failed to read {}: {}", field, e)))?;
    if data.len() as u64 != len {
        return Err(CodecError::decoding(format!(
            "truncated {}: expected {} bytes, found {}",
            field,
            len,
            data.len()
        )));
    }
    Ok(data)
}
