// Wire-format codec for transactions and block headers

mod types;
mod serialize;
mod hash;
pub mod endian;
pub mod varint;
pub mod transaction;
pub mod block;
pub mod target;

pub use types::HexBytes;
pub use serialize::{Encodable, Decodable};
pub use hash::{hash256, to_display_hex};
pub use endian::{reverse_bytes, encode_little_endian, parse_little_endian, parse_little_endian_wide};
pub use varint::{encode_compact_size, decode_compact_size};
pub use transaction::{Transaction, TxInput, TxOutput, Outpoint, encode_transaction, decode_transaction};
pub use block::{BlockHeaderFields, encode_block_header};
pub use target::{Target, expected_target};
