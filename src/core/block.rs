// Block header assembly

use crate::core::endian::reverse_bytes;
use crate::core::hash::{hash256, to_display_hex};
use crate::core::types::HexBytes;
use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Serialized header size in bytes
pub const HEADER_SIZE: usize = 80;

/// Header metadata as reported by a block explorer or `getblock` RPC.
///
/// Hash-like fields are in display (big-endian) order; `time` and `nonce` are
/// plain integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeaderFields {
    /// Block version, 4 bytes
    pub version_hex: HexBytes,
    /// Hash of the previous block
    #[serde(alias = "previousblockhash")]
    pub previous_block_hash: HexBytes,
    /// Merkle root of all transactions in the block
    #[serde(alias = "merkleroot")]
    pub merkle_root: HexBytes,
    /// Block timestamp (Unix epoch)
    pub time: u32,
    /// Difficulty target (compact format), 4 bytes
    pub bits: HexBytes,
    /// Nonce for proof-of-work
    pub nonce: u32,
}

impl BlockHeaderFields {
    /// Serialize to the 160-character hex header.
    ///
    /// Each field is byte-swapped on its own and the results are
    /// concatenated as version, prev hash, merkle root, time, bits, nonce.
    pub fn encode(&self) -> Result<String> {
        self.version_hex.expect_len(4, "versionHex")?;
        self.previous_block_hash.expect_len(32, "previousBlockHash")?;
        self.merkle_root.expect_len(32, "merkleRoot")?;
        self.bits.expect_len(4, "bits")?;

        let mut header = String::with_capacity(HEADER_SIZE * 2);
        header.push_str(&reverse_bytes(&self.version_hex.to_hex())?);
        header.push_str(&reverse_bytes(&self.previous_block_hash.to_hex())?);
        header.push_str(&reverse_bytes(&self.merkle_root.to_hex())?);
        header.push_str(&reverse_bytes(&format!("{:08x}", self.time))?);
        header.push_str(&reverse_bytes(&self.bits.to_hex())?);
        header.push_str(&reverse_bytes(&format!("{:08x}", self.nonce))?);

        if header.len() != HEADER_SIZE * 2 {
            return Err(CodecError::encoding(format!(
                "block header must be {} hex characters, got {}",
                HEADER_SIZE * 2,
                header.len()
            )));
        }
        Ok(header)
    }

    /// Block hash: double SHA256 of the serialized header, display order
    pub fn block_hash(&self) -> Result<String> {
        let header = HexBytes::from_hex(&self.encode()?)?;
        Ok(to_display_hex(&hash256(header.as_bytes())))
    }
}

/// Encode block header fields as hex
pub fn encode_block_header(fields: &BlockHeaderFields) -> Result<String> {
    fields.encode()
}
