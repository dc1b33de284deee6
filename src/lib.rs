#![deny(missing_docs)]

//! # da_calculator
//!
//! **da_calculator** estimates what it costs to submit a data blob to a
//! data-availability chain. A payload (or a shorthand size such as `512kb`)
//! is split into transaction-sized chunks, grouped into blocks against the
//! chain's capacity limits, and priced from at most two fee quotes supplied by
//! a chain client.
//!
//! ## Features
//!
//! * **Size resolution**: the [`size`](size/index.html) module turns raw input
//!   into a byte count, accepting `<n>kb` / `<n>mb` tokens or literal payloads.
//! * **Cost projection**: the [`projector`](projector/index.html) module
//!   partitions a payload and aggregates fee quotes with exact integer
//!   arithmetic.
//! * **Chain contract**: [`ChainClient`] abstracts the chain; [`OfflineChain`]
//!   is a deterministic implementation driven by configuration.
//! * **Sessions**: [`Calculator`] caches capacity limits per network and
//!   brackets each calculation with the client's session lifecycle.
//! * **Price lookup** (feature `net`): the `net::price` module fetches a USD
//!   price and degrades to "unknown" on any failure.
//!
//! ## Usage
//!
//! ```rust
//! use da_calculator::{project, quote_fn, CapacityLimits, FeeQuote};
//!
//! let limits = CapacityLimits::new(100, 1_000).unwrap();
//! let quoter = quote_fn(|bytes| Ok(FeeQuote::new(u128::from(bytes) / 10)));
//! let result = futures::executor::block_on(project(250, &limits, &quoter)).unwrap();
//! assert_eq!(result.transaction_count, 3);
//! assert_eq!(result.total_cost, FeeQuote::new(25));
//! ```

pub mod calculator;
pub mod capacity;
pub mod chain;
pub mod config;
pub mod economics;
mod error;
pub mod net;
pub mod projector;
pub mod size;
#[cfg(test)]
mod testing;

pub use calculator::{Calculator, Estimate, EstimateReport};
pub use capacity::{BlockDimensions, CapacityCache, CapacityLimits, BLOCK_FILL_PERCENT};
pub use chain::{ChainClient, ChainQuoter, Network, OfflineChain, DEFAULT_SENDER};
pub use config::{CalculatorConfig, ConfigError, OfflineChainConfig, PriceConfig};
pub use economics::{compute_fee, format_native, format_usd, FeePolicy, FeeQuote, TOKEN_SYMBOL};
pub use error::CalcError;
pub use projector::{aggregate, project, quote_fn, ChunkPlan, FeeQuoter, ProjectionResult, QuoteFn};
pub use size::{check_input_length, resolve_byte_size, resolve_payload, SizeSpec, MAX_INPUT_CHARS};
