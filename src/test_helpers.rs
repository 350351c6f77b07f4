#![allow(clippy::unwrap_used, missing_docs, clippy::missing_docs_in_private_items)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use eyre::{bail, eyre, Result};

use crate::arb::test_helpers::addr;
use crate::bootstrap::MarketSettings;
use crate::chain::{ChainClient, ReservesQuery};
use crate::execution::relay::{BundleRelay, SignedBundle, Simulation, SimulationReport};
use crate::utils::constants::{FEE_TIERS, PAIRS_BATCH_SIZE, RESERVES_CHUNK_SIZE};

/// Settings for the in-memory chain: native is `addr(0xEE)`
pub fn settings(factories: Vec<Address>) -> MarketSettings {
    MarketSettings {
        native: addr(0xEE),
        factories,
        v3_factory: addr(0xF3),
        quoter: addr(0xDD),
        fee_tiers: FEE_TIERS.to_vec(),
        batch_size: PAIRS_BATCH_SIZE,
        batch_start: 0,
        batch_limit: None,
        chunk_size: RESERVES_CHUNK_SIZE,
        blacklist: HashSet::new(),
    }
}

/// In-memory chain: lookup pages per factory, one reserves row per pair,
/// scripted gas estimates.
pub struct MockChain {
    pairs: HashMap<Address, Vec<Vec<Address>>>,
    reserves: HashMap<Address, Vec<U256>>,
    failing_reserves: HashSet<Address>,
    estimates: Mutex<VecDeque<Result<u64, String>>>,
    default_estimate: u64,
    gas_price: u128,
    pair_calls: Mutex<Vec<(u64, u64)>>,
    reserve_calls: Mutex<Vec<ReservesQuery>>,
    estimate_calls: Mutex<Vec<TransactionRequest>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            pairs: HashMap::new(),
            reserves: HashMap::new(),
            failing_reserves: HashSet::new(),
            estimates: Mutex::new(VecDeque::new()),
            default_estimate: 200_000,
            gas_price: 10_000_000_000,
            pair_calls: Mutex::new(Vec::new()),
            reserve_calls: Mutex::new(Vec::new()),
            estimate_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockChain {
    pub fn with_pairs(mut self, factory: Address, rows: Vec<Vec<Address>>) -> Self {
        self.pairs.insert(factory, rows);
        self
    }

    pub fn with_reserves(mut self, pair: Address, row: &[u128]) -> Self {
        self.reserves
            .insert(pair, row.iter().map(|value| U256::from(*value)).collect());
        self
    }

    /// Any reserves query touching `pair` fails
    pub fn failing_reserves_for(mut self, pair: Address) -> Self {
        self.failing_reserves.insert(pair);
        self
    }

    /// Answers for successive `estimate_gas` calls, then the default
    pub fn with_estimates(self, estimates: Vec<Result<u64, &str>>) -> Self {
        *self.estimates.lock().unwrap() = estimates
            .into_iter()
            .map(|estimate| estimate.map_err(ToString::to_string))
            .collect();
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn pair_calls(&self) -> Vec<(u64, u64)> {
        self.pair_calls.lock().unwrap().clone()
    }

    pub fn reserve_calls(&self) -> Vec<ReservesQuery> {
        self.reserve_calls.lock().unwrap().clone()
    }

    pub fn estimate_calls(&self) -> Vec<TransactionRequest> {
        self.estimate_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn pairs_by_index_range(
        &self,
        factory: Address,
        _v3_factory: Address,
        _fee_tiers: &[u32],
        start: U256,
        stop: U256,
    ) -> Result<Vec<Vec<Address>>> {
        let (start, stop) = (start.to::<u64>(), stop.to::<u64>());
        self.pair_calls.lock().unwrap().push((start, stop));
        let rows = self.pairs.get(&factory).cloned().unwrap_or_default();
        let end = usize::try_from(stop).unwrap().min(rows.len());
        let begin = usize::try_from(start).unwrap().min(end);
        Ok(rows[begin..end].to_vec())
    }

    /// Pairs without a configured row are left out of the answer
    async fn reserves_by_pairs(&self, query: ReservesQuery) -> Result<Vec<Vec<U256>>> {
        self.reserve_calls.lock().unwrap().push(query.clone());
        if query
            .pairs
            .iter()
            .any(|pair| self.failing_reserves.contains(pair))
        {
            bail!("execution reverted");
        }
        Ok(query
            .pairs
            .iter()
            .filter_map(|pair| self.reserves.get(pair).cloned())
            .collect())
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        self.estimate_calls.lock().unwrap().push(tx.clone());
        match self.estimates.lock().unwrap().pop_front() {
            Some(Ok(estimate)) => Ok(estimate),
            Some(Err(message)) => Err(eyre!(message)),
            None => Ok(self.default_estimate),
        }
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.gas_price)
    }
}

/// In-memory relay with scripted simulations
pub struct MockRelay {
    simulations: Mutex<VecDeque<Result<Simulation, String>>>,
    fail_send: bool,
    signed: Mutex<Vec<Vec<TransactionRequest>>>,
    simulated: Mutex<Vec<u64>>,
    sent: Mutex<Vec<u64>>,
}

impl Default for MockRelay {
    fn default() -> Self {
        Self {
            simulations: Mutex::new(VecDeque::new()),
            fail_send: false,
            signed: Mutex::new(Vec::new()),
            simulated: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl MockRelay {
    /// A simulation that pays the block producer and does not revert
    pub fn clean_simulation() -> Simulation {
        Simulation::Completed(SimulationReport {
            coinbase_diff: U256::from(10_000_000_000_000_000_u64),
            total_gas_used: 200_000,
            first_revert: None,
        })
    }

    /// Answers for successive simulations, then a clean one
    pub fn with_simulations(self, simulations: Vec<Result<Simulation, &str>>) -> Self {
        *self.simulations.lock().unwrap() = simulations
            .into_iter()
            .map(|simulation| simulation.map_err(ToString::to_string))
            .collect();
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_send = true;
        self
    }

    pub fn signed(&self) -> Vec<Vec<TransactionRequest>> {
        self.signed.lock().unwrap().clone()
    }

    pub fn simulated(&self) -> Vec<u64> {
        self.simulated.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<u64> {
        let mut sent = self.sent.lock().unwrap().clone();
        sent.sort_unstable();
        sent
    }
}

#[async_trait]
impl BundleRelay for MockRelay {
    async fn sign_bundle(&self, txs: Vec<TransactionRequest>) -> Result<SignedBundle> {
        let bundle = SignedBundle {
            txs: (0..txs.len())
                .map(|index| Bytes::from(vec![u8::try_from(index).unwrap()]))
                .collect(),
        };
        self.signed.lock().unwrap().push(txs);
        Ok(bundle)
    }

    async fn simulate(&self, _bundle: &SignedBundle, block: u64) -> Result<Simulation> {
        self.simulated.lock().unwrap().push(block);
        match self.simulations.lock().unwrap().pop_front() {
            Some(Ok(simulation)) => Ok(simulation),
            Some(Err(message)) => Err(eyre!(message)),
            None => Ok(Self::clean_simulation()),
        }
    }

    async fn send_raw_bundle(&self, _bundle: &SignedBundle, block: u64) -> Result<Option<B256>> {
        self.sent.lock().unwrap().push(block);
        if self.fail_send {
            bail!("relay unavailable");
        }
        Ok(Some(B256::with_last_byte(u8::try_from(block % 256).unwrap())))
    }
}
