//! Error type shared by the size resolver, the projector and the session layer.

use thiserror::Error;

/// Failures surfaced to callers of the calculator.
///
/// Every variant carries a message suitable for direct display; the core
/// never retries, so each error reaches the caller exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("You need to paste something to calculate the cost.")]
    /// No payload was given, or a size token resolved to zero bytes.
    EmptyInput,
    #[error("input is {actual} characters long, the limit is {max}")]
    /// The raw input exceeded the accepted length at the input boundary.
    InputTooLong {
        /// Maximum number of characters accepted.
        max: usize,
        /// Number of characters supplied.
        actual: usize,
    },
    #[error("size token is too large to express in bytes")]
    /// A `kb`/`mb` token resolved to more bytes than a `u64` holds.
    SizeTooLarge,
    #[error(
        "chain reported invalid capacity limits (max per transaction {max_per_transaction}, max per block {max_per_block})"
    )]
    /// The chain reported a zero capacity limit.
    InvalidCapacity {
        /// Reported maximum bytes per transaction.
        max_per_transaction: u64,
        /// Reported maximum bytes per block.
        max_per_block: u64,
    },
    #[error("Error getting data, please try again later ({0})")]
    /// The chain client or price upstream was unreachable or returned malformed data.
    CollaboratorUnavailable(String),
    #[error("projected cost does not fit in the fee representation")]
    /// Exact fee aggregation overflowed `u128`.
    CostOverflow,
}

impl CalcError {
    /// Wraps any collaborator failure into [`CalcError::CollaboratorUnavailable`].
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::CollaboratorUnavailable(reason.to_string())
    }
}
