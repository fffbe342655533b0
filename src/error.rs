// Error types for the codec and proof assembly

use thiserror::Error;

/// Errors raised by the wire-format codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Value cannot be represented in the target encoding
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Input bytes are truncated, malformed or have trailing data
    #[error("Decoding failed: {0}")]
    Decoding(String),

    /// Reduction over a sequence that must not be empty
    #[error("Empty sequence: {0}")]
    EmptySequence(&'static str),
}

impl CodecError {
    pub(crate) fn encoding(msg: impl Into<String>) -> Self {
        CodecError::Encoding(msg.into())
    }

    pub(crate) fn decoding(msg: impl Into<String>) -> Self {
        CodecError::Decoding(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while assembling an inclusion proof bundle
#[derive(Error, Debug)]
pub enum ProofError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Transaction {0} is not listed in the block")]
    TxNotInBlock(String),

    #[error("Transaction id mismatch: expected {expected}, encoded transaction hashes to {actual}")]
    TxIdMismatch { expected: String, actual: String },

    #[error("Invalid block range: to {to} is less than from {from}")]
    InvalidRange { from: u32, to: u32 },

    #[error("Collaborator failure: {0}")]
    Provider(String),
}

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}
