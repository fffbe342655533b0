// Hashing utilities for Bitcoin

use sha2::{Digest, Sha256};

/// SHA256 double hash (Bitcoin convention)
/// hash256 = SHA256(SHA256(data))
pub fn hash256(data: &[u8]) -> [u8; 32] {
    let first_hash = Sha256::digest(data);
    Sha256::digest(first_hash).into()
}

/// Hex in display order (byte-reversed), as block explorers and RPC show ids
pub fn to_display_hex(hash: &[u8; 32]) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}
