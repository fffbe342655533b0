// Compact difficulty target expansion

use crate::core::types::HexBytes;
use crate::error::{CodecError, Result};

/// Difficulty target representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Compact representation (bits field in block header)
    pub bits: u32,
}

impl Target {
    /// Create a new target from bits (compact format)
    pub fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Parse the 4-byte display-order `bits` hex reported by RPC ("1d00ffff")
    pub fn from_bits_hex(bits_hex: &str) -> Result<Self> {
        let bytes = HexBytes::from_hex(bits_hex)?;
        let bits: [u8; 4] = bytes.as_bytes().try_into().map_err(|_| {
            CodecError::decoding(format!("bits must be 4 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_bits(u32::from_be_bytes(bits)))
    }

    /// Convert compact bits to the full 256-bit target, big-endian.
    /// Formula: target = coefficient * 2^(8 * (exponent - 3))
    pub fn to_bytes(&self) -> Result<[u8; 32]> {
        let exponent = (self.bits >> 24) as isize;
        let coefficient = self.bits & 0x007f_ffff;

        if self.bits & 0x0080_0000 != 0 && coefficient != 0 {
            return Err(CodecError::decoding(format!(
                "negative compact target {:08x}",
                self.bits
            )));
        }

        let mut target = [0u8; 32];
        let coefficient_bytes = coefficient.to_be_bytes();
        // coefficient occupies the three bytes ending at position 34 - exponent
        for (i, byte) in coefficient_bytes[1..].iter().enumerate() {
            let position = 32 - exponent + i as isize;
            if position >= 32 {
                continue;
            }
            if position < 0 {
                if *byte != 0 {
                    return Err(CodecError::decoding(format!(
                        "compact target {:08x} overflows 256 bits",
                        self.bits
                    )));
                }
                continue;
            }
            target[position as usize] = *byte;
        }

        Ok(target)
    }

    /// 64-character big-endian hex of the expanded target
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_bytes()?))
    }
}

/// Expected target for a block's `bits` field, as 64 hex characters
pub fn expected_target(bits_hex: &str) -> Result<String> {
    Target::from_bits_hex(bits_hex)?.to_hex()
}
