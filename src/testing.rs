//! Recording chain client shared by unit tests.

use crate::capacity::CapacityLimits;
use crate::chain::{ChainClient, Network};
use crate::economics::FeeQuote;
use crate::error::CalcError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) struct MockChain {
    network: Network,
    limits: CapacityLimits,
    per_byte: u128,
    fail_quotes: bool,
    fail_open: bool,
    fail_close: bool,
    capacity_calls: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
    quotes: Mutex<Vec<u64>>,
}

impl MockChain {
    pub(crate) fn new(limits: CapacityLimits) -> Self {
        Self {
            network: Network::turing(),
            limits,
            per_byte: 1,
            fail_quotes: false,
            fail_open: false,
            fail_close: false,
            capacity_calls: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            quotes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub(crate) fn per_byte(mut self, per_byte: u128) -> Self {
        self.per_byte = per_byte;
        self
    }

    pub(crate) fn failing_quotes(mut self) -> Self {
        self.fail_quotes = true;
        self
    }

    pub(crate) fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn capacity_calls(&self) -> usize {
        self.capacity_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn quotes(&self) -> Vec<u64> {
        self.quotes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn network(&self) -> &Network {
        &self.network
    }

    async fn open(&self) -> Result<(), CalcError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(CalcError::unavailable("node refused connection"));
        }
        Ok(())
    }

    async fn capacity_limits(&self) -> Result<CapacityLimits, CalcError> {
        self.capacity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.limits)
    }

    async fn quote_fee(&self, payload_len: u64, _sender: &str) -> Result<FeeQuote, CalcError> {
        self.quotes.lock().unwrap().push(payload_len);
        if self.fail_quotes {
            return Err(CalcError::unavailable("quote endpoint unreachable"));
        }
        Ok(FeeQuote::new(u128::from(payload_len) * self.per_byte))
    }

    async fn close(&self) -> Result<(), CalcError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(CalcError::unavailable("session already closed"));
        }
        Ok(())
    }
}
