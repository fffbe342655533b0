// Runtime configuration for the data-provider side

use crate::error::ConfigError;
use crate::proof::ProofOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Bitcoin network the data provider serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Default REST endpoint for the network
    pub fn default_api_base_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mempool.space/api",
            Network::Testnet => "https://mempool.space/testnet/api",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Configuration built by the caller and handed to whatever needs it.
///
/// The codec itself takes no configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub network: Network,
    /// Overrides the network's default endpoint
    pub api_base_url: Option<String>,
    /// Delay between successive provider requests when walking header ranges
    pub throttle_ms: u64,
    pub proof: ProofOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            api_base_url: None,
            throttle_ms: 50,
            proof: ProofOptions::default(),
        }
    }
}

impl Config {
    /// Load a JSON config file; missing keys take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&json)?;
        log::info!(
            "Loaded config from {} (network: {})",
            path.as_ref().display(),
            config.network
        );
        Ok(config)
    }

    /// Endpoint to use: the explicit override, else the network default
    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_api_base_url())
    }
}
