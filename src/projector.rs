//! Cost projection: partition a payload into transactions and blocks, then
//! aggregate fee quotes into a total.
//!
//! At most two quotes are requested regardless of payload size: one for a
//! full transaction-sized chunk and one for the final chunk. Every non-final
//! transaction is assumed to cost the same as the first, which is exact only
//! when the chain's fee depends on nothing but chunk size. A fee model that
//! varies per transaction in other ways is not captured.

use crate::capacity::CapacityLimits;
use crate::economics::FeeQuote;
use crate::error::CalcError;
use async_trait::async_trait;
use serde::Serialize;

/// Source of fee quotes for a chunk of a given size.
#[async_trait]
pub trait FeeQuoter: Send + Sync {
    /// Fee for one transaction carrying `chunk_bytes` payload bytes.
    async fn quote(&self, chunk_bytes: u64) -> Result<FeeQuote, CalcError>;
}

/// Wraps a synchronous closure as a [`FeeQuoter`].
pub struct QuoteFn<F>(pub F);

/// Build a [`QuoteFn`], pinning the closure's signature.
pub fn quote_fn<F>(f: F) -> QuoteFn<F>
where
    F: Fn(u64) -> Result<FeeQuote, CalcError> + Send + Sync,
{
    QuoteFn(f)
}

#[async_trait]
impl<F> FeeQuoter for QuoteFn<F>
where
    F: Fn(u64) -> Result<FeeQuote, CalcError> + Send + Sync,
{
    async fn quote(&self, chunk_bytes: u64) -> Result<FeeQuote, CalcError> {
        (self.0)(chunk_bytes)
    }
}

/// How a payload splits into transactions, batches and blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    /// Payload size in bytes.
    pub byte_size: u64,
    /// `ceil(byte_size / max_per_transaction)`.
    pub transaction_count: u64,
    /// One for a single transaction, otherwise `ceil(byte_size / max_per_block)`.
    pub block_count: u64,
    /// Number of block-sized batches; zero when a single transaction suffices.
    pub batch_count: u64,
    /// Transactions grouped per batch.
    pub transactions_per_batch: u64,
    /// Size of every non-final chunk.
    pub full_chunk: u64,
    /// Size of the final chunk; equals `full_chunk` when the payload divides evenly.
    pub last_chunk: u64,
}

impl ChunkPlan {
    /// Partition `byte_size` bytes under `limits`.
    pub fn new(byte_size: u64, limits: &CapacityLimits) -> Result<Self, CalcError> {
        if byte_size == 0 {
            return Err(CalcError::EmptyInput);
        }
        limits.validate()?;
        let max_tx = limits.max_per_transaction;
        let transaction_count = byte_size.div_ceil(max_tx);
        if transaction_count == 1 {
            return Ok(Self {
                byte_size,
                transaction_count,
                block_count: 1,
                batch_count: 0,
                transactions_per_batch: limits.transactions_per_batch(),
                full_chunk: byte_size,
                last_chunk: byte_size,
            });
        }
        let block_count = byte_size.div_ceil(limits.max_per_block).max(1);
        let remainder = byte_size % max_tx;
        Ok(Self {
            byte_size,
            transaction_count,
            block_count,
            batch_count: block_count,
            transactions_per_batch: limits.transactions_per_batch(),
            full_chunk: max_tx,
            last_chunk: if remainder == 0 { max_tx } else { remainder },
        })
    }

    /// Whether the payload fits in one transaction.
    pub fn is_single(&self) -> bool {
        self.transaction_count == 1
    }

    /// Size of each chunk in submission order.
    pub fn chunk_sizes(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.transaction_count).map(move |idx| {
            if idx + 1 == self.transaction_count {
                self.last_chunk
            } else {
                self.full_chunk
            }
        })
    }
}

/// Outcome of one projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionResult {
    /// Total projected fee.
    pub total_cost: FeeQuote,
    /// Number of transactions.
    pub transaction_count: u64,
    /// Number of blocks, at least one.
    pub block_count: u64,
    /// Number of batches; zero for a single transaction.
    pub batch_count: u64,
}

/// `first * (transaction_count - 1) + last`, exactly.
pub fn aggregate(
    first: FeeQuote,
    transaction_count: u64,
    last: FeeQuote,
) -> Result<FeeQuote, CalcError> {
    first
        .checked_mul(transaction_count.saturating_sub(1))
        .and_then(|body| body.checked_add(last))
        .ok_or(CalcError::CostOverflow)
}

/// Project the cost of submitting `byte_size` bytes.
///
/// Input and limits are validated before any quote is requested. Quote
/// failures are returned as-is.
pub async fn project<Q>(
    byte_size: u64,
    limits: &CapacityLimits,
    quoter: &Q,
) -> Result<ProjectionResult, CalcError>
where
    Q: FeeQuoter + ?Sized,
{
    let plan = ChunkPlan::new(byte_size, limits)?;
    log::debug!(
        "QSYS|mod=PROJECT|evt=PLAN|bytes={}|txs={}|blocks={}|last_chunk={}",
        plan.byte_size,
        plan.transaction_count,
        plan.block_count,
        plan.last_chunk
    );
    let total_cost = if plan.is_single() {
        quoter.quote(byte_size).await?
    } else {
        let first = quoter.quote(plan.full_chunk).await?;
        let last = quoter.quote(plan.last_chunk).await?;
        aggregate(first, plan.transaction_count, last)?
    };
    Ok(ProjectionResult {
        total_cost,
        transaction_count: plan.transaction_count,
        block_count: plan.block_count,
        batch_count: plan.batch_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use proptest::prelude::*;
    use std::sync::Mutex;

    struct Recorder {
        calls: Mutex<Vec<u64>>,
        per_byte: u128,
    }

    impl Recorder {
        fn new(per_byte: u128) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                per_byte,
            }
        }

        fn calls(&self) -> Vec<u64> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeeQuoter for Recorder {
        async fn quote(&self, chunk_bytes: u64) -> Result<FeeQuote, CalcError> {
            self.calls.lock().unwrap().push(chunk_bytes);
            Ok(FeeQuote::new(u128::from(chunk_bytes) * self.per_byte))
        }
    }

    fn limits(tx: u64, block: u64) -> CapacityLimits {
        CapacityLimits::new(tx, block).unwrap()
    }

    #[test]
    fn remainder_chunk_is_quoted_separately() {
        let quoter = quote_fn(|bytes| match bytes {
            100 => Ok(FeeQuote::new(10)),
            50 => Ok(FeeQuote::new(5)),
            other => panic!("unexpected quote for {other} bytes"),
        });
        let result = block_on(project(250, &limits(100, 1000), &quoter)).unwrap();
        assert_eq!(result.transaction_count, 3);
        assert_eq!(result.total_cost, FeeQuote::new(25));
        assert_eq!(result.block_count, 1);
        assert_eq!(result.batch_count, 1);
    }

    #[test]
    fn exact_multiple_quotes_full_last_chunk() {
        let quoter = Recorder::new(1);
        let result = block_on(project(200, &limits(100, 1000), &quoter)).unwrap();
        assert_eq!(result.transaction_count, 2);
        assert_eq!(quoter.calls(), vec![100, 100]);
        assert_eq!(result.total_cost, FeeQuote::new(200));
    }

    #[test]
    fn single_transaction_quotes_whole_payload() {
        let quoter = Recorder::new(3);
        let result = block_on(project(42, &limits(100, 1000), &quoter)).unwrap();
        assert_eq!(quoter.calls(), vec![42]);
        assert_eq!(result.total_cost, FeeQuote::new(126));
        assert_eq!(result.transaction_count, 1);
        assert_eq!(result.block_count, 1);
        assert_eq!(result.batch_count, 0);
    }

    #[test]
    fn single_transaction_occupies_one_block() {
        let plan = ChunkPlan::new(150, &limits(200, 100)).unwrap();
        assert_eq!(plan.transaction_count, 1);
        assert_eq!(plan.block_count, 1);
        assert_eq!(plan.batch_count, 0);
    }

    #[test]
    fn payload_spanning_blocks() {
        let quoter = Recorder::new(1);
        let result = block_on(project(1_050, &limits(100, 300), &quoter)).unwrap();
        assert_eq!(result.transaction_count, 11);
        assert_eq!(result.block_count, 4);
        assert_eq!(result.batch_count, 4);
        assert_eq!(quoter.calls(), vec![100, 50]);
        assert_eq!(result.total_cost, FeeQuote::new(1_050));
    }

    #[test]
    fn empty_payload_requests_no_quotes() {
        let quoter = Recorder::new(1);
        assert_eq!(
            block_on(project(0, &limits(100, 1000), &quoter)),
            Err(CalcError::EmptyInput)
        );
        assert!(quoter.calls().is_empty());
    }

    #[test]
    fn invalid_capacity_requests_no_quotes() {
        let quoter = Recorder::new(1);
        let zero = CapacityLimits {
            max_per_transaction: 0,
            max_per_block: 1000,
        };
        assert!(matches!(
            block_on(project(10, &zero, &quoter)),
            Err(CalcError::InvalidCapacity { .. })
        ));
        assert!(quoter.calls().is_empty());
    }

    #[test]
    fn quote_failure_propagates_unchanged() {
        let quoter = quote_fn(|_| Err(CalcError::unavailable("node offline")));
        assert_eq!(
            block_on(project(500, &limits(100, 1000), &quoter)),
            Err(CalcError::CollaboratorUnavailable(
                "node offline".to_string()
            ))
        );
    }

    #[test]
    fn aggregation_overflow_is_reported() {
        let quoter = quote_fn(|_| Ok(FeeQuote::new(u128::MAX / 2)));
        assert_eq!(
            block_on(project(300, &limits(100, 1000), &quoter)),
            Err(CalcError::CostOverflow)
        );
    }

    #[test]
    fn chunk_sizes_cover_payload() {
        let plan = ChunkPlan::new(250, &limits(100, 1000)).unwrap();
        assert_eq!(plan.chunk_sizes().collect::<Vec<_>>(), vec![100, 100, 50]);
        let single = ChunkPlan::new(7, &limits(100, 1000)).unwrap();
        assert_eq!(single.chunk_sizes().collect::<Vec<_>>(), vec![7]);
    }

    proptest! {
        #[test]
        fn transaction_count_is_ceiling(byte_size in 1u64..10_000_000, max_tx in 1u64..1_000_000, max_block in 1u64..5_000_000) {
            let plan = ChunkPlan::new(byte_size, &limits(max_tx, max_block)).unwrap();
            prop_assert_eq!(plan.transaction_count, (byte_size + max_tx - 1) / max_tx);
            prop_assert_eq!(plan.is_single(), byte_size <= max_tx);
            prop_assert!(plan.block_count >= 1);
            prop_assert_eq!(plan.chunk_sizes().sum::<u64>(), byte_size);
        }

        #[test]
        fn never_more_than_two_quotes(byte_size in 1u64..10_000_000, max_tx in 1u64..1_000_000) {
            let quoter = Recorder::new(2);
            let result = block_on(project(byte_size, &limits(max_tx, max_tx * 4), &quoter)).unwrap();
            let calls = quoter.calls();
            prop_assert!(calls.len() <= 2);
            prop_assert_eq!(calls.len() == 1, result.transaction_count == 1);
            // A per-byte fee makes the two-quote approximation exact.
            prop_assert_eq!(result.total_cost, FeeQuote::new(u128::from(byte_size) * 2));
        }
    }
}
