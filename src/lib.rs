// Bitcoin transaction and block header codec with SPV proof assembly

pub mod core;
pub mod proof;
pub mod config;
pub mod error;
mod cli;

// Re-exports for convenience
pub use crate::core::{
    BlockHeaderFields, HexBytes, Outpoint, Transaction, TxInput, TxOutput, decode_transaction,
    encode_block_header, encode_transaction,
};
pub use crate::proof::{Proof, ProofBundle, ProofGenerator, ProofOptions, concat_siblings};
pub use crate::config::{Config, Network};
pub use crate::error::{CodecError, ConfigError, ProofError};
pub use crate::cli::{Cli, CliHandler, Commands};
