// CLI commands

use crate::config::Config;
use crate::core::{expected_target, BlockHeaderFields, Transaction};
use crate::proof::{concat_headers, DecodedBlock, DecodedTransaction, MerklePath, ProofGenerator};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "btc-proof")]
#[command(about = "Bitcoin transaction/header codec and SPV proof assembly", long_about = None)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a raw hex transaction to JSON
    DecodeTx {
        /// Raw transaction hex
        hex: String,
    },

    /// Encode a JSON transaction to hex
    EncodeTx {
        /// JSON file holding the transaction
        file: PathBuf,
        /// Include segwit marker, flag and witness fields
        #[arg(short, long)]
        witness: bool,
    },

    /// Print the txid of a raw hex transaction
    Txid {
        /// Raw transaction hex
        hex: String,
    },

    /// Serialize block header fields and print the header and block hash
    Header {
        /// JSON file holding the block fields
        file: PathBuf,
    },

    /// Expand compact bits to the full target
    Target {
        /// Bits in display order, e.g. 1d00ffff
        bits: String,
    },

    /// Build {blockHeader, proof, rawTx} from a JSON fixture
    Proof {
        /// JSON file with txId, block, transaction and merklePath
        file: PathBuf,
    },

    /// Concatenate serialized headers for a height range
    Headers {
        /// JSON file mapping height to block fields
        file: PathBuf,
        #[arg(long)]
        from: u32,
        /// Defaults to the highest height in the file
        #[arg(long)]
        to: Option<u32>,
    },

    /// Show the resolved configuration
    Config,
}

/// Input for the `proof` command, as a data provider would hand it over
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofFixture {
    tx_id: String,
    block: DecodedBlock,
    transaction: DecodedTransaction,
    merkle_path: MerklePath,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

/// CLI handler
pub struct CliHandler {
    config: Config,
}

impl CliHandler {
    /// Create a new CLI handler
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build a handler from the `--config` option, falling back to defaults
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => {
                log::debug!("No config file given, using defaults");
                Config::default()
            }
        };
        Ok(Self::new(config))
    }

    /// Handle CLI command
    pub fn handle(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Commands::DecodeTx { hex } => self.decode_tx(&hex),
            Commands::EncodeTx { file, witness } => self.encode_tx(&file, witness),
            Commands::Txid { hex } => {
                let tx = Transaction::from_hex(&hex)?;
                println!("{}", tx.txid()?);
                Ok(())
            }
            Commands::Header { file } => self.header(&file),
            Commands::Target { bits } => {
                println!("{}", expected_target(&bits)?);
                Ok(())
            }
            Commands::Proof { file } => self.proof(&file),
            Commands::Headers { file, from, to } => self.headers(&file, from, to),
            Commands::Config => {
                println!("{}", serde_json::to_string_pretty(&self.config)?);
                println!("Resolved API endpoint: {}", self.config.api_base_url());
                Ok(())
            }
        }
    }

    fn decode_tx(&self, hex: &str) -> Result<()> {
        let tx = Transaction::from_hex(hex)?;
        println!("{}", serde_json::to_string_pretty(&tx)?);
        Ok(())
    }

    fn encode_tx(&self, file: &Path, witness: bool) -> Result<()> {
        let tx: Transaction = read_json(file)?;
        if !witness && tx.has_witness() {
            log::warn!("Transaction has witness fields; encoding without them");
        }
        println!("{}", tx.to_hex(witness)?);
        Ok(())
    }

    fn header(&self, file: &Path) -> Result<()> {
        let fields: BlockHeaderFields = read_json(file)?;
        println!("Header: {}", fields.encode()?);
        println!("Hash:   {}", fields.block_hash()?);
        Ok(())
    }

    fn proof(&self, file: &Path) -> Result<()> {
        let fixture: ProofFixture = read_json(file)?;
        let generator = ProofGenerator::new(fixture.merkle_path, self.config.proof);
        let bundle = generator.generate(&fixture.tx_id, &fixture.block, &fixture.transaction)?;
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        Ok(())
    }

    fn headers(&self, file: &Path, from: u32, to: Option<u32>) -> Result<()> {
        let blocks: BTreeMap<u32, BlockHeaderFields> = read_json(file)?;
        let range = concat_headers(&blocks, from, to)?;
        println!("{}", serde_json::to_string_pretty(&range)?);
        Ok(())
    }
}
