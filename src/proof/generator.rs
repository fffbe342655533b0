// Assembling {blockHeader, proof, rawTx} from collaborator data

use crate::core::block::HEADER_SIZE;
use crate::core::{BlockHeaderFields, HexBytes, Transaction, TxInput, TxOutput};
use crate::error::ProofError;
use crate::proof::Proof;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Block as decoded by the data provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedBlock {
    #[serde(flatten)]
    pub header: BlockHeaderFields,
    /// Transaction ids in block order, display hex
    #[serde(alias = "tx")]
    pub transaction_id_list: Vec<String>,
}

/// Transaction as decoded by the data provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTransaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    #[serde(default)]
    pub witness_fields: Vec<HexBytes>,
    pub lock_time: u32,
    /// Raw serialization reported by the provider, if any
    #[serde(default)]
    pub raw_hex: Option<HexBytes>,
}

impl DecodedTransaction {
    pub fn to_transaction(&self) -> Transaction {
        Transaction {
            version: self.version,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            witness_fields: self.witness_fields.clone(),
            lock_time: self.lock_time,
        }
    }
}

/// Sibling hashes and leaf index computed by the merkle-path collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerklePath {
    pub sibling_hashes: Vec<String>,
    pub index: u32,
}

/// Computes the merkle path for a transaction id within a block's id list
pub trait MerklePathProvider {
    fn merkle_path(&self, tx_id: &str, tx_ids: &[String]) -> Result<MerklePath, ProofError>;
}

/// A path computed ahead of time answers for any request
impl MerklePathProvider for MerklePath {
    fn merkle_path(&self, _tx_id: &str, _tx_ids: &[String]) -> Result<MerklePath, ProofError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProofOptions {
    /// Emit rawTx with segwit framing when the transaction has witness data.
    /// Off by default so rawTx hashes to the txid.
    pub include_witness: bool,
}

/// Everything a verifier needs to check inclusion of one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub block_header: String,
    pub proof: Proof,
    pub raw_tx: String,
}

/// Builds proof bundles using a merkle-path collaborator
pub struct ProofGenerator<P> {
    provider: P,
    options: ProofOptions,
}

impl<P: MerklePathProvider> ProofGenerator<P> {
    pub fn new(provider: P, options: ProofOptions) -> Self {
        Self { provider, options }
    }

    /// Build the bundle for `tx_id`.
    ///
    /// Checks that the structured transaction hashes to `tx_id`, that any raw
    /// hex from the provider decodes to the same transaction, that the block
    /// lists the id, and that the returned path folds to the block's root.
    pub fn generate(
        &self,
        tx_id: &str,
        block: &DecodedBlock,
        decoded_tx: &DecodedTransaction,
    ) -> Result<ProofBundle, ProofError> {
        let tx = decoded_tx.to_transaction();

        if let Some(raw) = &decoded_tx.raw_hex {
            let reported = Transaction::deserialize(raw.as_bytes())?;
            if reported != tx {
                return Err(ProofError::Provider(format!(
                    "raw hex for {} does not match the decoded transaction",
                    tx_id
                )));
            }
        }

        let computed = tx.txid()?;
        if !computed.eq_ignore_ascii_case(tx_id) {
            return Err(ProofError::TxIdMismatch {
                expected: tx_id.to_string(),
                actual: computed,
            });
        }

        if !block
            .transaction_id_list
            .iter()
            .any(|id| id.eq_ignore_ascii_case(tx_id))
        {
            return Err(ProofError::TxNotInBlock(tx_id.to_string()));
        }

        let block_header = block.header.encode()?;
        let raw_tx = tx.to_hex(self.options.include_witness && tx.has_witness())?;

        let path = self
            .provider
            .merkle_path(tx_id, &block.transaction_id_list)?;
        log::debug!(
            "merkle path for {}: index {}, {} siblings",
            tx_id,
            path.index,
            path.sibling_hashes.len()
        );

        let proof = Proof::new(tx_id, path.index, path.sibling_hashes)?;
        let merkle_root = block.header.merkle_root.to_hex();
        if !proof.verify(&merkle_root)? {
            return Err(ProofError::Provider(format!(
                "merkle path for {} does not fold to root {}",
                tx_id, merkle_root
            )));
        }

        log::info!("Generated inclusion proof for {}", tx_id);

        Ok(ProofBundle {
            block_header,
            proof,
            raw_tx,
        })
    }
}

/// Serialized headers for a height range, concatenated in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRange {
    pub start: u32,
    pub headers: String,
}

/// Supplies serialized block headers by height
pub trait HeaderSource {
    /// 160-character hex header at `height`
    fn header_at(&self, height: u32) -> Result<String, ProofError>;

    /// Height of the best known block
    fn tip_height(&self) -> Result<u32, ProofError>;
}

/// Headers known ahead of time, keyed by height
impl HeaderSource for BTreeMap<u32, BlockHeaderFields> {
    fn header_at(&self, height: u32) -> Result<String, ProofError> {
        let fields = self
            .get(&height)
            .ok_or_else(|| ProofError::Provider(format!("no header at height {}", height)))?;
        Ok(fields.encode()?)
    }

    fn tip_height(&self) -> Result<u32, ProofError> {
        self.keys()
            .next_back()
            .copied()
            .ok_or_else(|| ProofError::Provider("no headers available".to_string()))
    }
}

/// Concatenate headers from `from` through `to` inclusive; `to` defaults to the tip
pub fn concat_headers<S: HeaderSource + ?Sized>(
    source: &S,
    from: u32,
    to: Option<u32>,
) -> Result<HeaderRange, ProofError> {
    let to = match to {
        Some(to) => to,
        None => source.tip_height()?,
    };
    if to < from {
        return Err(ProofError::InvalidRange { from, to });
    }

    let mut headers = String::new();
    for height in from..=to {
        let header = source.header_at(height)?;
        let parsed = HexBytes::from_hex(&header)?;
        if parsed.len() != HEADER_SIZE {
            return Err(ProofError::Provider(format!(
                "header at height {} is {} bytes, expected {}",
                height,
                parsed.len(),
                HEADER_SIZE
            )));
        }
        headers.push_str(&parsed.to_hex());
    }
    log::debug!("Concatenated {} headers from height {}", u64::from(to - from) + 1, from);

    Ok(HeaderRange {
        start: from,
        headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{hash256, to_display_hex, Outpoint};
    use crate::error::CodecError;

    fn hex(s: &str) -> HexBytes {
        HexBytes::from_hex(s).unwrap()
    }

    fn spend(tag: u8, witness_fields: Vec<HexBytes>) -> DecodedTransaction {
        DecodedTransaction {
            version: 2,
            inputs: vec![TxInput {
                previous_output: Outpoint {
                    hash: HexBytes::from_bytes([tag; 32]),
                    index: 1,
                },
                script: hex(""),
                sequence: 0xffff_fffe,
            }],
            outputs: vec![TxOutput {
                value: 42_000,
                script: hex("0014aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            }],
            witness_fields,
            lock_time: 800_000,
            raw_hex: None,
        }
    }

    fn internal(id: &str) -> Vec<u8> {
        let mut bytes = hex::decode(id).unwrap();
        bytes.reverse();
        bytes
    }

    /// Two-transaction block whose root is computed from the pair of ids
    fn fixture() -> (DecodedBlock, DecodedTransaction, String, String) {
        let first = spend(0x01, vec![]);
        let second = spend(0x02, vec![hex("3044"), hex("02ab")]);
        let first_id = first.to_transaction().txid().unwrap();
        let second_id = second.to_transaction().txid().unwrap();

        let mut pair = internal(&first_id);
        pair.extend(internal(&second_id));
        let root = to_display_hex(&hash256(&pair));

        let block = DecodedBlock {
            header: BlockHeaderFields {
                version_hex: hex("20000000"),
                previous_block_hash: HexBytes::from_bytes([0x33u8; 32]),
                merkle_root: hex(&root),
                time: 1_700_000_000,
                bits: hex("17053894"),
                nonce: 12345,
            },
            transaction_id_list: vec![first_id.clone(), second_id.clone()],
        };
        (block, second, second_id, first_id)
    }

    #[test]
    fn test_generate_bundle() {
        let (block, tx, tx_id, sibling) = fixture();
        let path = MerklePath {
            sibling_hashes: vec![sibling.clone()],
            index: 1,
        };
        let generator = ProofGenerator::new(path, ProofOptions::default());

        let bundle = generator.generate(&tx_id, &block, &tx).unwrap();
        assert_eq!(bundle.block_header, block.header.encode().unwrap());
        assert_eq!(bundle.block_header.len(), 160);
        assert_eq!(bundle.proof.tx_id(), tx_id);
        assert_eq!(bundle.proof.tx_index(), 1);
        assert_eq!(bundle.proof.concatenated_siblings(), sibling);

        // default rawTx omits witness framing and hashes to the txid
        let raw = Transaction::from_hex(&bundle.raw_tx).unwrap();
        assert_eq!(raw.txid().unwrap(), tx_id);
        assert!(raw.witness_fields.is_empty());
    }

    #[test]
    fn test_generate_with_witness() {
        let (block, tx, tx_id, sibling) = fixture();
        let path = MerklePath {
            sibling_hashes: vec![sibling],
            index: 1,
        };
        let generator = ProofGenerator::new(path, ProofOptions { include_witness: true });

        let bundle = generator.generate(&tx_id, &block, &tx).unwrap();
        assert_eq!(&bundle.raw_tx[8..12], "0001");
        assert_eq!(Transaction::from_hex(&bundle.raw_tx).unwrap(), tx.to_transaction());
    }

    #[test]
    fn test_generate_txid_mismatch() {
        let (block, tx, _, sibling) = fixture();
        let path = MerklePath {
            sibling_hashes: vec![sibling.clone()],
            index: 1,
        };
        let generator = ProofGenerator::new(path, ProofOptions::default());

        let result = generator.generate(&sibling, &block, &tx);
        assert!(matches!(result, Err(ProofError::TxIdMismatch { .. })));
    }

    #[test]
    fn test_generate_tx_not_in_block() {
        let (mut block, tx, tx_id, sibling) = fixture();
        block.transaction_id_list.truncate(1);
        let path = MerklePath {
            sibling_hashes: vec![sibling],
            index: 1,
        };
        let generator = ProofGenerator::new(path, ProofOptions::default());

        let result = generator.generate(&tx_id, &block, &tx);
        assert!(matches!(result, Err(ProofError::TxNotInBlock(_))));
    }

    #[test]
    fn test_generate_wrong_path() {
        let (block, tx, tx_id, sibling) = fixture();
        let path = MerklePath {
            sibling_hashes: vec![sibling],
            index: 0,
        };
        let generator = ProofGenerator::new(path, ProofOptions::default());

        let result = generator.generate(&tx_id, &block, &tx);
        assert!(matches!(result, Err(ProofError::Provider(_))));
    }

    #[test]
    fn test_generate_empty_path() {
        let (block, tx, tx_id, _) = fixture();
        let path = MerklePath {
            sibling_hashes: vec![],
            index: 0,
        };
        let generator = ProofGenerator::new(path, ProofOptions::default());

        let result = generator.generate(&tx_id, &block, &tx);
        assert!(matches!(
            result,
            Err(ProofError::Codec(CodecError::EmptySequence(_)))
        ));
    }

    #[test]
    fn test_generate_raw_hex_mismatch() {
        let (block, mut tx, tx_id, sibling) = fixture();
        let mut other = tx.to_transaction();
        other.lock_time += 1;
        tx.raw_hex = Some(HexBytes::from_bytes(other.serialize(true).unwrap()));

        let path = MerklePath {
            sibling_hashes: vec![sibling],
            index: 1,
        };
        let generator = ProofGenerator::new(path, ProofOptions::default());
        assert!(matches!(
            generator.generate(&tx_id, &block, &tx),
            Err(ProofError::Provider(_))
        ));
    }

    #[test]
    fn test_decoded_block_json() {
        let (block, _, _, _) = fixture();
        let json = serde_json::to_value(&block).unwrap();
        assert!(json["versionHex"].is_string());
        assert!(json["transactionIdList"].is_array());

        let back: DecodedBlock = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    fn header_map() -> BTreeMap<u32, BlockHeaderFields> {
        let (block, _, _, _) = fixture();
        let mut headers = BTreeMap::new();
        for height in 100..=103 {
            let mut fields = block.header.clone();
            fields.nonce = height;
            headers.insert(height, fields);
        }
        headers
    }

    #[test]
    fn test_concat_headers_range() {
        let headers = header_map();
        let range = concat_headers(&headers, 101, Some(102)).unwrap();
        assert_eq!(range.start, 101);
        assert_eq!(range.headers.len(), 320);
        assert_eq!(&range.headers[..160], headers[&101].encode().unwrap());
        assert_eq!(&range.headers[160..], headers[&102].encode().unwrap());
    }

    #[test]
    fn test_concat_headers_to_tip() {
        let headers = header_map();
        let range = concat_headers(&headers, 100, None).unwrap();
        assert_eq!(range.headers.len(), 4 * 160);
    }

    #[test]
    fn test_concat_headers_invalid_range() {
        let headers = header_map();
        assert!(matches!(
            concat_headers(&headers, 103, Some(101)),
            Err(ProofError::InvalidRange { from: 103, to: 101 })
        ));
    }

    #[test]
    fn test_concat_headers_missing_height() {
        let headers = header_map();
        assert!(matches!(
            concat_headers(&headers, 103, Some(104)),
            Err(ProofError::Provider(_))
        ));
    }
}
