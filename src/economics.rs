//! Fee amounts and their conversion to display units.
//!
//! Amounts stay in the chain's smallest denomination (`u128`) until they are
//! rendered, so aggregation never touches floating point.

use std::fmt;

/// Decimal places of the native token.
pub const NATIVE_DECIMALS: u32 = 18;
/// Smallest-denomination units per whole token.
pub const NATIVE_DECIMAL_FACTOR: u128 = 1_000_000_000_000_000_000;
/// Ticker of the native token.
pub const TOKEN_SYMBOL: &str = "AVAIL";
/// Places shown for native amounts.
pub const NATIVE_DISPLAY_PLACES: u32 = 6;
/// Places shown for USD amounts.
pub const USD_DISPLAY_PLACES: usize = 3;

/// A fee in smallest-denomination units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeeQuote(u128);

impl FeeQuote {
    /// Wrap a raw smallest-denomination amount.
    pub const fn new(amount: u128) -> Self {
        Self(amount)
    }

    /// Raw smallest-denomination amount.
    pub const fn amount(self) -> u128 {
        self.0
    }

    /// `self * count`, or `None` on overflow.
    pub fn checked_mul(self, count: u64) -> Option<Self> {
        self.0.checked_mul(u128::from(count)).map(Self)
    }

    /// `self + other`, or `None` on overflow.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Whole-token string rounded to `places` decimals.
    pub fn to_native_string(self, places: u32) -> String {
        format_native(self.0, places)
    }
}

impl fmt::Display for FeeQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {TOKEN_SYMBOL}",
            format_native(self.0, NATIVE_DISPLAY_PLACES)
        )
    }
}

/// Render `amount` smallest units as a whole-token decimal, rounding half up.
pub fn format_native(amount: u128, places: u32) -> String {
    let places = places.min(NATIVE_DECIMALS);
    let divisor = 10u128.pow(NATIVE_DECIMALS - places);
    let mut scaled = amount / divisor;
    if (amount % divisor) * 2 >= divisor && divisor > 1 {
        scaled += 1;
    }
    if places == 0 {
        return scaled.to_string();
    }
    let unit = 10u128.pow(places);
    format!(
        "{}.{:0width$}",
        scaled / unit,
        scaled % unit,
        width = places as usize
    )
}

/// USD value of `amount` smallest units at `price` dollars per token.
pub fn format_usd(amount: u128, price: f64) -> String {
    let tokens = amount as f64 / NATIVE_DECIMAL_FACTOR as f64;
    format!("{:.*}", USD_DISPLAY_PLACES, tokens * price)
}

/// Linear fee model used by the offline chain client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    /// Flat fee charged per transaction.
    pub base_fee: u128,
    /// Fee per payload byte.
    pub fee_per_byte: u128,
    /// Minimum fee.
    pub min_fee: u128,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            base_fee: 124_000_000_000_000_000,
            fee_per_byte: 1_000_000_000_000,
            min_fee: 0,
        }
    }
}

/// Compute the fee for a transaction carrying `size` payload bytes.
pub fn compute_fee(policy: &FeePolicy, size: u64) -> FeeQuote {
    let variable = policy
        .fee_per_byte
        .saturating_mul(u128::from(size))
        .saturating_add(policy.base_fee);
    FeeQuote(std::cmp::max(variable, policy.min_fee))
}
