//! Runtime configuration: an optional JSON file overlaid by environment variables.
//!
//! ```json
//! {
//!   "network": "turing",
//!   "chain": { "max_app_data_length": 524288, "block": { "rows": 256, "cols": 256, "chunk_size": 32 } },
//!   "price": { "symbol": "AVAIL", "cache_ttl_secs": 3600 }
//! }
//! ```

use crate::capacity::BlockDimensions;
use crate::chain::{Network, OfflineChain, DEFAULT_SENDER};
use crate::economics::{FeePolicy, TOKEN_SYMBOL};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default price quote endpoint.
pub const DEFAULT_PRICE_ENDPOINT: &str =
    "https://pro-api.coinmarketcap.com/v1/cryptocurrency/quotes/latest";
/// Default app-data ceiling per transaction, in bytes.
pub const DEFAULT_MAX_APP_DATA_LENGTH: u64 = 512 * 1024;
const DEFAULT_PRICE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_PRICE_TTL_SECS: u64 = 3_600;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    /// The file could not be read.
    Io(String),
    #[error("config parse error: {0}")]
    /// The file was not valid JSON for this schema.
    Parse(String),
    #[error("unknown network `{0}` (expected turing or mainnet)")]
    /// The network name matched no preset.
    UnknownNetwork(String),
    #[error("invalid value for {key}: {value}")]
    /// An environment variable held an unparsable value.
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Parameters for the offline chain client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineChainConfig {
    /// App-data ceiling per transaction.
    pub max_app_data_length: u64,
    /// Block grid.
    pub block: BlockDimensions,
    /// Fee model.
    pub fee: FeePolicy,
}

impl Default for OfflineChainConfig {
    fn default() -> Self {
        Self {
            max_app_data_length: DEFAULT_MAX_APP_DATA_LENGTH,
            block: BlockDimensions::default(),
            fee: FeePolicy::default(),
        }
    }
}

/// Price upstream settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceConfig {
    /// API key; without one no request is made.
    pub api_key: Option<String>,
    /// Quote endpoint.
    pub endpoint: String,
    /// Token ticker to quote.
    pub symbol: String,
    /// Request timeout.
    pub timeout: Duration,
    /// How long a fetched price is reused.
    pub cache_ttl: Duration,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_PRICE_ENDPOINT.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            timeout: Duration::from_millis(DEFAULT_PRICE_TIMEOUT_MS),
            cache_ttl: Duration::from_secs(DEFAULT_PRICE_TTL_SECS),
        }
    }
}

/// Complete calculator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculatorConfig {
    /// Selected network.
    pub network: Network,
    /// Sender identity for quotes.
    pub sender: Option<String>,
    /// Offline chain parameters.
    pub chain: OfflineChainConfig,
    /// Price upstream.
    pub price: PriceConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    network: Option<String>,
    sender: Option<String>,
    #[serde(default)]
    chain: ChainSection,
    #[serde(default)]
    price: PriceSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChainSection {
    max_app_data_length: Option<u64>,
    block: Option<BlockDimensions>,
    base_fee: Option<u128>,
    fee_per_byte: Option<u128>,
    min_fee: Option<u128>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PriceSection {
    endpoint: Option<String>,
    symbol: Option<String>,
    timeout_ms: Option<u64>,
    cache_ttl_secs: Option<u64>,
}

impl CalculatorConfig {
    /// Defaults overlaid by the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Load a JSON file, then overlay the environment.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let mut cfg = Self::from_json(&contents)?;
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Parse JSON without consulting the environment.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_json::from_str(contents).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let mut cfg = Self::default();
        if let Some(name) = file.network {
            cfg.network = parse_network(&name)?;
        }
        cfg.sender = file.sender;
        let chain = file.chain;
        if let Some(v) = chain.max_app_data_length {
            cfg.chain.max_app_data_length = v;
        }
        if let Some(block) = chain.block {
            cfg.chain.block = block;
        }
        if let Some(v) = chain.base_fee {
            cfg.chain.fee.base_fee = v;
        }
        if let Some(v) = chain.fee_per_byte {
            cfg.chain.fee.fee_per_byte = v;
        }
        if let Some(v) = chain.min_fee {
            cfg.chain.fee.min_fee = v;
        }
        let price = file.price;
        if let Some(v) = price.endpoint {
            cfg.price.endpoint = v;
        }
        if let Some(v) = price.symbol {
            cfg.price.symbol = v;
        }
        if let Some(v) = price.timeout_ms {
            cfg.price.timeout = Duration::from_millis(v);
        }
        if let Some(v) = price.cache_ttl_secs {
            cfg.price.cache_ttl = Duration::from_secs(v);
        }
        Ok(cfg)
    }

    /// Overlay recognised environment variables onto `self`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    fn apply_vars<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(name) = var("DACALC_NETWORK") {
            self.network = parse_network(&name)?;
        }
        if let Some(sender) = var("DACALC_SENDER") {
            self.sender = Some(sender);
        }
        if let Some(v) = parse_var(&var, "DACALC_MAX_APP_DATA_LENGTH")? {
            self.chain.max_app_data_length = v;
        }
        if let Some(v) = parse_var(&var, "DACALC_BLOCK_ROWS")? {
            self.chain.block.rows = v;
        }
        if let Some(v) = parse_var(&var, "DACALC_BLOCK_COLS")? {
            self.chain.block.cols = v;
        }
        if let Some(v) = parse_var(&var, "DACALC_CHUNK_SIZE")? {
            self.chain.block.chunk_size = v;
        }
        if let Some(v) = parse_var(&var, "DACALC_BASE_FEE")? {
            self.chain.fee.base_fee = v;
        }
        if let Some(v) = parse_var(&var, "DACALC_FEE_PER_BYTE")? {
            self.chain.fee.fee_per_byte = v;
        }
        if let Some(v) = parse_var(&var, "DACALC_MIN_FEE")? {
            self.chain.fee.min_fee = v;
        }
        if let Some(key) = var("CMC_KEY") {
            self.price.api_key = Some(key);
        }
        if let Some(endpoint) = var("DACALC_PRICE_ENDPOINT") {
            self.price.endpoint = endpoint;
        }
        if let Some(symbol) = var("DACALC_PRICE_SYMBOL") {
            self.price.symbol = symbol;
        }
        if let Some(ms) = parse_var(&var, "DACALC_PRICE_TIMEOUT_MS")? {
            self.price.timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var(&var, "DACALC_PRICE_TTL_SECS")? {
            self.price.cache_ttl = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Sender for quotes, falling back to [`DEFAULT_SENDER`].
    pub fn sender(&self) -> &str {
        self.sender.as_deref().unwrap_or(DEFAULT_SENDER)
    }

    /// Offline chain client for the configured network.
    pub fn offline_chain(&self) -> OfflineChain {
        OfflineChain::new(
            self.network.clone(),
            self.chain.max_app_data_length,
            self.chain.block,
            self.chain.fee,
        )
    }
}

fn parse_network(name: &str) -> Result<Network, ConfigError> {
    Network::from_name(name).ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
}

fn parse_var<F, T>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
    }
}
