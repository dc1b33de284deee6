//! One calculation from raw input to a rendered estimate.
//!
//! [`Calculator`] holds the only state that survives between calculations:
//! the capacity cache and the sender used for quotes. Callers own it and pass
//! it the chain client for each run.

use crate::capacity::{CapacityCache, CapacityLimits};
use crate::chain::{ChainClient, ChainQuoter, DEFAULT_SENDER};
use crate::economics::{format_usd, NATIVE_DISPLAY_PLACES, TOKEN_SYMBOL};
use crate::error::CalcError;
use crate::projector::{project, ProjectionResult};
use crate::size::resolve_payload;
use serde::Serialize;

/// Session state for repeated calculations.
#[derive(Debug, Clone)]
pub struct Calculator {
    cache: CapacityCache,
    sender: String,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    /// Calculator quoting on behalf of [`DEFAULT_SENDER`].
    pub fn new() -> Self {
        Self::with_sender(DEFAULT_SENDER)
    }

    /// Calculator quoting on behalf of `sender`.
    pub fn with_sender(sender: impl Into<String>) -> Self {
        Self {
            cache: CapacityCache::new(),
            sender: sender.into(),
        }
    }

    /// Forget cached capacity limits, e.g. after switching networks.
    pub fn invalidate_capacity(&mut self) {
        self.cache.invalidate();
    }

    /// Estimate the cost of submitting `input` through `client`.
    ///
    /// Input is validated before the client is touched. Once the session is
    /// opened it is closed on every exit path; a failure during the
    /// calculation takes precedence over a failure to close.
    pub async fn calculate<C>(&mut self, client: &C, input: &str) -> Result<Estimate, CalcError>
    where
        C: ChainClient + ?Sized,
    {
        self.calculate_bytes(client, input.as_bytes()).await
    }

    /// Like [`calculate`](Calculator::calculate), for raw bytes that need not be UTF-8.
    pub async fn calculate_bytes<C>(
        &mut self,
        client: &C,
        input: &[u8],
    ) -> Result<Estimate, CalcError>
    where
        C: ChainClient + ?Sized,
    {
        let byte_size = resolve_payload(input)?;
        client.open().await?;
        let outcome = self.run(client, byte_size).await;
        let closed = client.close().await;
        let estimate = outcome?;
        closed?;
        log::info!(
            "QSYS|mod=CALC|evt=ESTIMATE|network={}|bytes={}|txs={}|blocks={}|cost={}",
            estimate.network,
            estimate.byte_size,
            estimate.projection.transaction_count,
            estimate.projection.block_count,
            estimate.total_cost_display()
        );
        Ok(estimate)
    }

    async fn run<C>(&mut self, client: &C, byte_size: u64) -> Result<Estimate, CalcError>
    where
        C: ChainClient + ?Sized,
    {
        let limits = self.cache.resolve(client).await?;
        let quoter = ChainQuoter::new(client, &self.sender);
        let projection = project(byte_size, &limits, &quoter).await?;
        Ok(Estimate {
            network: client.network().name().to_string(),
            byte_size,
            limits,
            projection,
        })
    }
}

/// Result of one calculation, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    /// Network the estimate was computed against.
    pub network: String,
    /// Resolved payload size in bytes.
    pub byte_size: u64,
    /// Capacity limits in force.
    pub limits: CapacityLimits,
    /// Projection outcome.
    pub projection: ProjectionResult,
}

impl Estimate {
    /// Total cost in whole tokens at display precision.
    pub fn total_cost_display(&self) -> String {
        self.projection
            .total_cost
            .to_native_string(NATIVE_DISPLAY_PLACES)
    }

    /// USD equivalent, when a price is known.
    pub fn usd_display(&self, price: Option<f64>) -> Option<String> {
        price.map(|price| format_usd(self.projection.total_cost.amount(), price))
    }

    /// Human readable summary, one sentence per line.
    pub fn summary_lines(&self, price: Option<f64>) -> Vec<String> {
        let p = &self.projection;
        let mut cost = format!(
            "Sending this data will cost {} {TOKEN_SYMBOL}",
            self.total_cost_display()
        );
        if let Some(usd) = self.usd_display(price) {
            cost.push_str(&format!(" (~${usd})"));
        }
        let mut lines = vec![
            cost,
            format!(
                "Your data will be split in {} {} / {}",
                p.transaction_count,
                plural(p.transaction_count, "blob", "blobs"),
                plural(p.transaction_count, "transaction", "transactions")
            ),
        ];
        if p.batch_count > 0 {
            lines.push(format!(
                "The blobs will be grouped in {} {}",
                p.batch_count,
                plural(p.batch_count, "batch", "batches")
            ));
        }
        lines.push(format!(
            "The blobs will be sent in {} {}",
            p.block_count,
            plural(p.block_count, "block", "blocks")
        ));
        lines
    }

    /// Machine-readable view of the estimate.
    pub fn report(&self, price: Option<f64>) -> EstimateReport {
        EstimateReport {
            network: self.network.clone(),
            byte_size: self.byte_size,
            max_per_transaction: self.limits.max_per_transaction,
            max_per_block: self.limits.max_per_block,
            transaction_count: self.projection.transaction_count,
            batch_count: self.projection.batch_count,
            block_count: self.projection.block_count,
            total_cost: self.total_cost_display(),
            total_cost_base_units: self.projection.total_cost.amount().to_string(),
            symbol: TOKEN_SYMBOL,
            usd_price: price,
            total_cost_usd: self.usd_display(price),
        }
    }
}

fn plural<'a>(count: u64, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// Serialisable estimate; the base-unit total is a string to keep full precision.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    /// Network name.
    pub network: String,
    /// Payload size in bytes.
    pub byte_size: u64,
    /// Capacity limit per transaction.
    pub max_per_transaction: u64,
    /// Capacity limit per block.
    pub max_per_block: u64,
    /// Number of transactions.
    pub transaction_count: u64,
    /// Number of batches.
    pub batch_count: u64,
    /// Number of blocks.
    pub block_count: u64,
    /// Total cost in whole tokens.
    pub total_cost: String,
    /// Total cost in smallest units.
    pub total_cost_base_units: String,
    /// Token ticker.
    pub symbol: &'static str,
    /// USD price per token used for conversion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_price: Option<f64>,
    /// Total cost in USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<String>,
}
