// Basic types shared by the codec

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque byte string carried as hex on the wire boundary.
///
/// Scripts, witness fields and hashes arrive from collaborators as hex text.
/// Parsing into `HexBytes` rejects odd lengths and non-hex digits up front, so
/// every length prefix computed later is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexBytes(Vec<u8>);

impl HexBytes {
    /// Parse a hex string (either case). Empty input is a valid empty byte string.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() % 2 != 0 {
            return Err(CodecError::decoding(format!(
                "odd-length hex string ({} chars)",
                hex_str.len()
            )));
        }
        let bytes = hex::decode(hex_str)
            .map_err(|e| CodecError::decoding(format!("invalid hex string: {}", e)))?;
        Ok(Self(bytes))
    }

    /// Wrap raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes (half the hex length)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Fails unless the value is exactly `expected` bytes long
    pub fn expect_len(&self, expected: usize, field: &str) -> Result<&Self> {
        if self.0.len() != expected {
            return Err(CodecError::encoding(format!(
                "{} must be {} bytes, got {}",
                field,
                expected,
                self.0.len()
            )));
        }
        Ok(self)
    }
}

impl TryFrom<String> for HexBytes {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl TryFrom<&str> for HexBytes {
    type Error = CodecError;

    fn try_from(value: &str) -> Result<Self> {
        Self::from_hex(value)
    }
}

impl From<HexBytes> for String {
    fn from(value: HexBytes) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
