// Transaction data structures and their wire codec

use crate::core::hash::{hash256, to_display_hex};
use crate::core::serialize::{read_array, read_var_bytes, write_var_bytes, Decodable, Encodable};
use crate::core::types::HexBytes;
use crate::core::varint::{read_compact_size, write_compact_size};
use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};

/// Segwit marker (0x00) and flag (0x01) following the version
pub const WITNESS_MARKER_FLAG: [u8; 2] = [0x00, 0x01];

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outpoint {
    /// 32-byte hash, serialized exactly as given (no byte swap)
    pub hash: HexBytes,
    /// Index of the output in the previous transaction
    pub index: u32,
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInput {
    pub previous_output: Outpoint,
    /// Signature script (scriptSig)
    pub script: HexBytes,
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in satoshis
    pub value: u64,
    /// Public key script (scriptPubKey)
    pub script: HexBytes,
}

/// Transaction
///
/// Witness data is kept as one flat list of fields rather than a stack per
/// input. For single-input transactions this is byte-identical to BIP144
/// serialization; multi-input witness transactions are not representable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Serialized as its 32-bit two's complement pattern
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    #[serde(default)]
    pub witness_fields: Vec<HexBytes>,
    pub lock_time: u32,
}

impl Encodable for Outpoint {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.hash.expect_len(32, "previous output hash")?;
        buf.extend_from_slice(self.hash.as_bytes());
        buf.extend_from_slice(&self.index.to_le_bytes());
        Ok(())
    }
}

impl Decodable for Outpoint {
    fn decode_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let hash: [u8; 32] = read_array(reader, "previous output hash")?;
        let index = u32::from_le_bytes(read_array(reader, "previous output index")?);
        Ok(Self {
            hash: HexBytes::from_bytes(hash),
            index,
        })
    }
}

impl Encodable for TxInput {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.previous_output.encode_to(buf)?;
        write_var_bytes(buf, self.script.as_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        Ok(())
    }
}

impl Decodable for TxInput {
    fn decode_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let previous_output = Outpoint::decode_from(reader)?;
        let script = HexBytes::from_bytes(read_var_bytes(reader, "input script")?);
        let sequence = u32::from_le_bytes(read_array(reader, "input sequence")?);
        Ok(Self {
            previous_output,
            script,
            sequence,
        })
    }
}

impl Encodable for TxOutput {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.value.to_le_bytes());
        write_var_bytes(buf, self.script.as_bytes());
        Ok(())
    }
}

impl Decodable for TxOutput {
    fn decode_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let value = u64::from_le_bytes(read_array(reader, "output value")?);
        let script = HexBytes::from_bytes(read_var_bytes(reader, "output script")?);
        Ok(Self { value, script })
    }
}

fn decode_list<T: Decodable>(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<Vec<T>> {
    let count = read_compact_size(cursor)?;
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    // every element takes at least one byte
    if count > remaining {
        return Err(CodecError::decoding(format!(
            "{} count {} exceeds remaining {} bytes",
            what, count, remaining
        )));
    }
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(T::decode_from(cursor)?);
    }
    Ok(items)
}

impl Transaction {
    /// Whether the transaction carries witness fields
    pub fn has_witness(&self) -> bool {
        !self.witness_fields.is_empty()
    }

    /// Serialize to bytes, with or without segwit framing
    pub fn serialize(&self, include_witness: bool) -> Result<Vec<u8>> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&self.version.to_le_bytes());

        if include_witness {
            buf.extend_from_slice(&WITNESS_MARKER_FLAG);
        }

        write_compact_size(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode_to(&mut buf)?;
        }

        write_compact_size(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode_to(&mut buf)?;
        }

        if include_witness {
            write_compact_size(&mut buf, self.witness_fields.len() as u64);
            for field in &self.witness_fields {
                write_var_bytes(&mut buf, field.as_bytes());
            }
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());

        Ok(buf)
    }

    /// Deserialize from bytes, detecting segwit framing
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        let version = i32::from_le_bytes(read_array(&mut cursor, "version")?);

        // Legacy transactions leave the cursor on the input count
        let after_version = &data[cursor.position() as usize..];
        let is_witness = after_version.starts_with(&WITNESS_MARKER_FLAG);
        if is_witness {
            cursor.set_position(cursor.position() + WITNESS_MARKER_FLAG.len() as u64);
        }

        let inputs = decode_list::<TxInput>(&mut cursor, "input")?;
        let outputs = decode_list::<TxOutput>(&mut cursor, "output")?;

        let mut witness_fields = Vec::new();
        if is_witness {
            let count = read_compact_size(&mut cursor)?;
            for _ in 0..count {
                let field = read_var_bytes(&mut cursor, "witness field")?;
                witness_fields.push(HexBytes::from_bytes(field));
            }
        }

        let trailing = &data[cursor.position() as usize..];
        if trailing.len() != 4 {
            return Err(CodecError::decoding(format!(
                "expected 4 lock time bytes at end of transaction, found {}",
                trailing.len()
            )));
        }
        let lock_time = u32::from_le_bytes([trailing[0], trailing[1], trailing[2], trailing[3]]);

        log::trace!(
            "decoded transaction: {} inputs, {} outputs, {} witness fields",
            inputs.len(),
            outputs.len(),
            witness_fields.len()
        );

        Ok(Self {
            version,
            inputs,
            outputs,
            witness_fields,
            lock_time,
        })
    }

    /// Canonical hex encoding
    pub fn to_hex(&self, include_witness: bool) -> Result<String> {
        Ok(hex::encode(self.serialize(include_witness)?))
    }

    /// Parse a raw hex transaction
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = HexBytes::from_hex(hex_str)?;
        Self::deserialize(bytes.as_bytes())
    }

    /// Transaction id: double SHA256 of the non-witness serialization, display order
    pub fn txid(&self) -> Result<String> {
        Ok(to_display_hex(&hash256(&self.serialize(false)?)))
    }

    /// Witness transaction id; equals the txid when there is no witness data
    pub fn wtxid(&self) -> Result<String> {
        Ok(to_display_hex(&hash256(&self.serialize(self.has_witness())?)))
    }
}

/// Encode a transaction as hex
pub fn encode_transaction(tx: &Transaction, include_witness: bool) -> Result<String> {
    tx.to_hex(include_witness)
}

/// Decode a hex transaction
pub fn decode_transaction(hex_str: &str) -> Result<Transaction> {
    Transaction::from_hex(hex_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GENESIS_COINBASE: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

    const SEGWIT_TX: &str = "0200000000010111111111111111111111111111111111111111111111111111111111111111110000000000fdffffff01a0860100000000001600140000000000000000000000000000000000000000020201ab03cdcdcd00000000";

    fn hex(s: &str) -> HexBytes {
        HexBytes::from_hex(s).unwrap()
    }

    fn sample_tx(witness_fields: Vec<HexBytes>) -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![TxInput {
                previous_output: Outpoint {
                    hash: HexBytes::from_bytes([0x11u8; 32]),
                    index: 0,
                },
                script: hex(""),
                sequence: 0xffff_fffd,
            }],
            outputs: vec![TxOutput {
                value: 100_000,
                script: hex("00140000000000000000000000000000000000000000"),
            }],
            witness_fields,
            lock_time: 0,
        }
    }

    #[test]
    fn test_decode_genesis_coinbase() {
        let tx = decode_transaction(GENESIS_COINBASE).unwrap();

        assert_eq!(tx.version, 1);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.inputs[0].previous_output.index, 0xffff_ffff);
        assert_eq!(tx.inputs[0].script.len(), 77);
        assert_eq!(tx.inputs[0].sequence, 0xffff_ffff);
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 5_000_000_000);
        assert_eq!(tx.outputs[0].script.len(), 67);
        assert!(tx.witness_fields.is_empty());
        assert_eq!(tx.lock_time, 0);

        assert_eq!(encode_transaction(&tx, false).unwrap(), GENESIS_COINBASE);
    }

    #[test]
    fn test_genesis_coinbase_txid() {
        let tx = decode_transaction(GENESIS_COINBASE).unwrap();
        assert_eq!(
            tx.txid().unwrap(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
        assert_eq!(tx.wtxid().unwrap(), tx.txid().unwrap());
    }

    #[test]
    fn test_encode_segwit_layout() {
        let tx = sample_tx(vec![hex("01ab"), hex("cdcdcd")]);
        assert_eq!(encode_transaction(&tx, true).unwrap(), SEGWIT_TX);
    }

    #[test]
    fn test_decode_segwit() {
        let tx = decode_transaction(SEGWIT_TX).unwrap();
        assert_eq!(tx, sample_tx(vec![hex("01ab"), hex("cdcdcd")]));
        assert!(tx.has_witness());
        assert_ne!(tx.wtxid().unwrap(), tx.txid().unwrap());
    }

    #[test]
    fn test_legacy_encoding_drops_witness() {
        let tx = sample_tx(vec![hex("01ab")]);
        let legacy = encode_transaction(&tx, false).unwrap();
        assert_eq!(&legacy[8..10], "01");

        let decoded = decode_transaction(&legacy).unwrap();
        assert!(decoded.witness_fields.is_empty());
        assert_eq!(decoded.inputs, tx.inputs);
    }

    #[test]
    fn test_negative_version_round_trip() {
        let mut tx = sample_tx(vec![]);
        tx.version = -1;
        let encoded = encode_transaction(&tx, false).unwrap();
        assert!(encoded.starts_with("ffffffff"));
        assert_eq!(decode_transaction(&encoded).unwrap(), tx);
    }

    #[test]
    fn test_encode_rejects_short_outpoint_hash() {
        let mut tx = sample_tx(vec![]);
        tx.inputs[0].previous_output.hash = hex("abcd");
        assert!(matches!(
            encode_transaction(&tx, false),
            Err(CodecError::Encoding(_))
        ));
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let padded = format!("{}00", GENESIS_COINBASE);
        assert!(matches!(decode_transaction(&padded), Err(CodecError::Decoding(_))));
    }

    #[test]
    fn test_decode_truncated_lock_time() {
        let truncated = &GENESIS_COINBASE[..GENESIS_COINBASE.len() - 2];
        assert!(matches!(
            decode_transaction(truncated),
            Err(CodecError::Decoding(_))
        ));
    }

    #[test]
    fn test_decode_script_past_end() {
        // version, 1 input, hash, index, script length 0x4d with only a few bytes left
        let truncated = &GENESIS_COINBASE[..100 + 12];
        assert!(matches!(
            decode_transaction(truncated),
            Err(CodecError::Decoding(_))
        ));
    }

    #[test]
    fn test_decode_rejects_odd_hex() {
        assert!(matches!(decode_transaction("010"), Err(CodecError::Decoding(_))));
        assert!(matches!(decode_transaction(""), Err(CodecError::Decoding(_))));
    }

    #[test]
    fn test_serde_field_names() {
        let tx = sample_tx(vec![hex("01ab")]);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["lockTime"], 0);
        assert_eq!(json["witnessFields"][0], "01ab");
        assert_eq!(json["inputs"][0]["previousOutput"]["index"], 0);
        assert_eq!(json["outputs"][0]["value"], 100_000);

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    fn arb_hex(max: usize) -> impl Strategy<Value = HexBytes> {
        proptest::collection::vec(any::<u8>(), 0..max).prop_map(HexBytes::from_bytes)
    }

    fn arb_input() -> impl Strategy<Value = TxInput> {
        (any::<[u8; 32]>(), any::<u32>(), arb_hex(80), any::<u32>()).prop_map(
            |(hash, index, script, sequence)| TxInput {
                previous_output: Outpoint {
                    hash: HexBytes::from_bytes(hash),
                    index,
                },
                script,
                sequence,
            },
        )
    }

    fn arb_output() -> impl Strategy<Value = TxOutput> {
        (any::<u64>(), arb_hex(80)).prop_map(|(value, script)| TxOutput { value, script })
    }

    proptest! {
        #[test]
        fn prop_legacy_round_trip(
            version in any::<i32>(),
            inputs in proptest::collection::vec(arb_input(), 1..4),
            outputs in proptest::collection::vec(arb_output(), 0..4),
            lock_time in any::<u32>(),
        ) {
            let tx = Transaction { version, inputs, outputs, witness_fields: vec![], lock_time };
            let encoded = encode_transaction(&tx, false).unwrap();
            prop_assert_eq!(decode_transaction(&encoded).unwrap(), tx);
        }

        #[test]
        fn prop_witness_round_trip(
            version in any::<i32>(),
            inputs in proptest::collection::vec(arb_input(), 0..4),
            outputs in proptest::collection::vec(arb_output(), 0..4),
            witness_fields in proptest::collection::vec(arb_hex(300), 0..5),
            lock_time in any::<u32>(),
        ) {
            let tx = Transaction { version, inputs, outputs, witness_fields, lock_time };
            let encoded = encode_transaction(&tx, true).unwrap();
            prop_assert_eq!(decode_transaction(&encoded).unwrap(), tx);
        }
    }
}
