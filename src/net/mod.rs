//! HTTP collaborators of the calculator.
//!
//! Gated behind the `net` Cargo feature: the reqwest-based price client used
//! by `dacalc price` and the `price_service` proxy.

#![cfg(feature = "net")]

/// Token price lookup with fallback-to-unknown semantics.
pub mod price;

pub use price::{extract_price, CachedPrice, PriceClient, PriceError, PriceResponse};
