// Merkle inclusion proofs and proof bundle assembly

mod generator;

pub use generator::{
    concat_headers, DecodedBlock, DecodedTransaction, HeaderRange, HeaderSource, MerklePath,
    MerklePathProvider, ProofBundle, ProofGenerator, ProofOptions,
};

use crate::core::{hash256, to_display_hex, HexBytes};
use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Concatenate sibling hashes in order. An empty list is an error, not "".
pub fn concat_siblings(siblings: &[String]) -> Result<String> {
    if siblings.is_empty() {
        return Err(CodecError::EmptySequence("merkle sibling list"));
    }
    Ok(siblings.concat())
}

/// Merkle inclusion proof for one transaction.
///
/// Built once from collaborator output and never modified; fields are only
/// reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProofRecord")]
pub struct Proof {
    tx_id: String,
    tx_index: u32,
    sibling: Vec<String>,
    concatenated_siblings: String,
}

/// Wire shape accepted when deserializing; the concatenation is recomputed
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofRecord {
    tx_id: String,
    tx_index: u32,
    sibling: Vec<String>,
}

impl TryFrom<ProofRecord> for Proof {
    type Error = CodecError;

    fn try_from(record: ProofRecord) -> Result<Self> {
        Proof::new(record.tx_id, record.tx_index, record.sibling)
    }
}

fn internal_order(hash_hex: &str, what: &str) -> Result<[u8; 32]> {
    let bytes = HexBytes::from_hex(hash_hex)?;
    let mut hash: [u8; 32] = bytes.as_bytes().try_into().map_err(|_| {
        CodecError::decoding(format!("{} must be 32 bytes, got {}", what, bytes.len()))
    })?;
    hash.reverse();
    Ok(hash)
}

impl Proof {
    pub fn new(tx_id: impl Into<String>, tx_index: u32, sibling: Vec<String>) -> Result<Self> {
        let concatenated_siblings = concat_siblings(&sibling)?;
        Ok(Self {
            tx_id: tx_id.into(),
            tx_index,
            sibling,
            concatenated_siblings,
        })
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Position of the transaction in the block
    pub fn tx_index(&self) -> u32 {
        self.tx_index
    }

    /// Sibling hashes from leaf level up, display order
    pub fn sibling(&self) -> &[String] {
        &self.sibling
    }

    pub fn concatenated_siblings(&self) -> &str {
        &self.concatenated_siblings
    }

    /// Fold the transaction id up the sibling path.
    ///
    /// Bit `n` of the index selects whether the running hash is the left (0) or
    /// right (1) child at level `n`. Ids and the returned root are display order.
    pub fn compute_merkle_root(&self) -> Result<String> {
        let depth = self.sibling.len() as u32;
        if self.tx_index.checked_shr(depth).unwrap_or(0) != 0 {
            return Err(CodecError::decoding(format!(
                "index {} does not fit a tree of depth {}",
                self.tx_index, depth
            )));
        }

        let mut current = internal_order(&self.tx_id, "transaction id")?;
        let mut index = self.tx_index;
        for sibling_hex in &self.sibling {
            let sibling = internal_order(sibling_hex, "sibling hash")?;
            let mut combined = [0u8; 64];
            if index & 1 == 0 {
                combined[..32].copy_from_slice(&current);
                combined[32..].copy_from_slice(&sibling);
            } else {
                combined[..32].copy_from_slice(&sibling);
                combined[32..].copy_from_slice(&current);
            }
            current = hash256(&combined);
            index >>= 1;
        }

        Ok(to_display_hex(&current))
    }

    /// Whether the path folds to `merkle_root` (display order, any case)
    pub fn verify(&self, merkle_root: &str) -> Result<bool> {
        Ok(self.compute_merkle_root()?.eq_ignore_ascii_case(merkle_root))
    }
}
