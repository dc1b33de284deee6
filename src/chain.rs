//! Contract between the calculator and a data-availability chain client.
//!
//! The calculator never speaks a chain protocol itself. A client supplies the
//! capacity limits and per-transaction fee quotes, and brackets each
//! calculation with `open`/`close`. [`OfflineChain`] is a deterministic client
//! driven by configured parameters, used when no live node is wired in.

use crate::capacity::{BlockDimensions, CapacityLimits};
use crate::economics::{compute_fee, FeePolicy, FeeQuote};
use crate::error::CalcError;
use crate::projector::FeeQuoter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder sender used for fee quotes; quotes do not depend on the sender's balance.
pub const DEFAULT_SENDER: &str = "5CDGXH8Q9DzD3TnATTG6qm6f4yR1kbECBGUmh2XbEBQ8Jfa5";

/// RPC endpoint of the Turing test network.
pub const TURING_ENDPOINT: &str = "wss://turing-rpc.avail.so/ws";
/// RPC endpoint of mainnet.
pub const MAINNET_ENDPOINT: &str = "wss://mainnet-rpc.avail.so/ws";

/// A selectable chain network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Network {
    name: String,
    endpoint: String,
}

impl Network {
    /// Arbitrary named network.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Turing test network.
    pub fn turing() -> Self {
        Self::new("Turing", TURING_ENDPOINT)
    }

    /// Mainnet.
    pub fn mainnet() -> Self {
        Self::new("Mainnet", MAINNET_ENDPOINT)
    }

    /// Look up a preset by case-insensitive name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "turing" => Some(Self::turing()),
            "mainnet" => Some(Self::mainnet()),
            _ => None,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// RPC endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::turing()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Operations the calculator needs from a chain client.
///
/// Every method except [`network`](ChainClient::network) may suspend on I/O.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Network this client is connected to; used as the capacity cache key.
    fn network(&self) -> &Network;

    /// Open a session before a calculation.
    async fn open(&self) -> Result<(), CalcError>;

    /// Current protocol capacity limits.
    async fn capacity_limits(&self) -> Result<CapacityLimits, CalcError>;

    /// Fee, in smallest units, for submitting a `payload_len`-byte payload from `sender`.
    async fn quote_fee(&self, payload_len: u64, sender: &str) -> Result<FeeQuote, CalcError>;

    /// Close the session opened by [`open`](ChainClient::open).
    async fn close(&self) -> Result<(), CalcError>;
}

/// Adapts a [`ChainClient`] and sender identity into a [`FeeQuoter`].
pub struct ChainQuoter<'a, C: ?Sized> {
    client: &'a C,
    sender: &'a str,
}

impl<'a, C: ChainClient + ?Sized> ChainQuoter<'a, C> {
    /// Quote through `client` on behalf of `sender`.
    pub fn new(client: &'a C, sender: &'a str) -> Self {
        Self { client, sender }
    }
}

#[async_trait]
impl<'a, C: ChainClient + ?Sized> FeeQuoter for ChainQuoter<'a, C> {
    async fn quote(&self, chunk_bytes: u64) -> Result<FeeQuote, CalcError> {
        self.client.quote_fee(chunk_bytes, self.sender).await
    }
}

/// Deterministic in-process chain client.
#[derive(Debug, Clone)]
pub struct OfflineChain {
    network: Network,
    max_app_data_length: u64,
    block: BlockDimensions,
    fee: FeePolicy,
}

impl OfflineChain {
    /// Client reporting the given parameters for `network`.
    pub fn new(
        network: Network,
        max_app_data_length: u64,
        block: BlockDimensions,
        fee: FeePolicy,
    ) -> Self {
        Self {
            network,
            max_app_data_length,
            block,
            fee,
        }
    }
}

#[async_trait]
impl ChainClient for OfflineChain {
    fn network(&self) -> &Network {
        &self.network
    }

    async fn open(&self) -> Result<(), CalcError> {
        Ok(())
    }

    async fn capacity_limits(&self) -> Result<CapacityLimits, CalcError> {
        CapacityLimits::from_block_dimensions(self.max_app_data_length, self.block)
    }

    async fn quote_fee(&self, payload_len: u64, _sender: &str) -> Result<FeeQuote, CalcError> {
        Ok(compute_fee(&self.fee, payload_len))
    }

    async fn close(&self) -> Result<(), CalcError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(Network::from_name(" TURING "), Some(Network::turing()));
        assert_eq!(Network::from_name("mainnet"), Some(Network::mainnet()));
        assert_eq!(Network::from_name("goldberg"), None);
        assert_eq!(Network::default().endpoint(), TURING_ENDPOINT);
    }

    #[test]
    fn offline_chain_reports_configured_values() {
        let fee = FeePolicy {
            base_fee: 7,
            fee_per_byte: 3,
            min_fee: 0,
        };
        let chain = OfflineChain::new(
            Network::turing(),
            100,
            BlockDimensions {
                rows: 10,
                cols: 10,
                chunk_size: 5,
            },
            fee,
        );
        let limits = block_on(chain.capacity_limits()).unwrap();
        assert_eq!(limits, CapacityLimits::new(100, 450).unwrap());
        let quoter = ChainQuoter::new(&chain, DEFAULT_SENDER);
        assert_eq!(block_on(quoter.quote(10)).unwrap(), FeeQuote::new(37));
    }
}
