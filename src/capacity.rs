//! Protocol capacity limits and the per-session cache that holds them.

use crate::chain::{ChainClient, Network};
use crate::error::CalcError;
use serde::{Deserialize, Serialize};

/// Share of the raw block grid treated as usable, in percent.
pub const BLOCK_FILL_PERCENT: u64 = 90;

/// Maximum bytes accepted per transaction and per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityLimits {
    /// Maximum payload bytes in one transaction.
    pub max_per_transaction: u64,
    /// Maximum payload bytes in one block.
    pub max_per_block: u64,
}

impl CapacityLimits {
    /// Build validated limits.
    pub fn new(max_per_transaction: u64, max_per_block: u64) -> Result<Self, CalcError> {
        let limits = Self {
            max_per_transaction,
            max_per_block,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Derive limits from the chain's app-data ceiling and block grid.
    ///
    /// Only [`BLOCK_FILL_PERCENT`] of the grid counts toward `max_per_block`.
    pub fn from_block_dimensions(
        max_app_data_length: u64,
        dims: BlockDimensions,
    ) -> Result<Self, CalcError> {
        let usable = dims.raw_bytes() * u128::from(BLOCK_FILL_PERCENT) / 100;
        let max_per_block = u64::try_from(usable).unwrap_or(u64::MAX);
        Self::new(max_app_data_length, max_per_block)
    }

    /// Reject zero limits.
    pub fn validate(&self) -> Result<(), CalcError> {
        if self.max_per_transaction == 0 || self.max_per_block == 0 {
            return Err(CalcError::InvalidCapacity {
                max_per_transaction: self.max_per_transaction,
                max_per_block: self.max_per_block,
            });
        }
        Ok(())
    }

    /// Number of full transactions grouped into one block-sized batch.
    pub fn transactions_per_batch(&self) -> u64 {
        self.max_per_block.div_ceil(self.max_per_transaction.max(1))
    }
}

/// Dynamic block layout reported by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDimensions {
    /// Grid rows.
    pub rows: u64,
    /// Grid columns.
    pub cols: u64,
    /// Bytes per grid cell.
    pub chunk_size: u64,
}

impl BlockDimensions {
    fn raw_bytes(&self) -> u128 {
        u128::from(self.rows) * u128::from(self.cols) * u128::from(self.chunk_size)
    }
}

impl Default for BlockDimensions {
    fn default() -> Self {
        Self {
            rows: 256,
            cols: 256,
            chunk_size: 32,
        }
    }
}

/// Caller-owned cache of the limits for the currently selected network.
///
/// Limits only change with chain upgrades, so they are fetched once per
/// network and reused until the network changes or [`invalidate`] is called.
///
/// [`invalidate`]: CapacityCache::invalidate
#[derive(Debug, Clone, Default)]
pub struct CapacityCache {
    entry: Option<(Network, CapacityLimits)>,
}

impl CapacityCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached limits for `network`, if present.
    pub fn cached(&self, network: &Network) -> Option<CapacityLimits> {
        match &self.entry {
            Some((cached, limits)) if cached == network => Some(*limits),
            _ => None,
        }
    }

    /// Return cached limits for the client's network, fetching them on a miss.
    pub async fn resolve<C>(&mut self, client: &C) -> Result<CapacityLimits, CalcError>
    where
        C: ChainClient + ?Sized,
    {
        let network = client.network();
        if let Some(limits) = self.cached(network) {
            return Ok(limits);
        }
        let limits = client.capacity_limits().await?;
        limits.validate()?;
        log::debug!(
            "QSYS|mod=CAPACITY|evt=FETCH|network={}|max_tx={}|max_block={}",
            network.name(),
            limits.max_per_transaction,
            limits.max_per_block
        );
        self.entry = Some((network.clone(), limits));
        Ok(limits)
    }

    /// Drop any cached limits.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
