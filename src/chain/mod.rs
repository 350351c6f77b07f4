//! Chain access the searcher depends on.
//!
//! The trait is the seam between the engine and the network: the engine only
//! ever talks to a [`ChainClient`], the alloy-backed [`AlloyChainClient`] is
//! what the binary plugs in.

mod alloy_client;

pub use alloy_client::AlloyChainClient;

use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use eyre::Result;

/// Arguments of one `getReservesByPairs` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservesQuery {
    /// Quoter used for the tier quotes
    pub quoter: Address,
    /// Pairs to read
    pub pairs: Vec<Address>,
    /// Native-wrapped token
    pub native: Address,
    /// Non-native token of every pair
    pub tokens: Vec<Address>,
    /// Fee tiers, same for every pair
    pub fee_tiers: Vec<u32>,
    /// Active flag of every tier of every pair
    pub tiers_on: Vec<Vec<bool>>,
    /// Native input each tier is quoted for
    pub amount_in: U256,
}

/// Reads and estimates against the chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Pairs `start..stop` of `factory`, each row
    /// `[token0, token1, pair, tier_pool...]` with one tier pool per fee tier
    /// (zero address when the tier has no pool).
    async fn pairs_by_index_range(
        &self,
        factory: Address,
        v3_factory: Address,
        fee_tiers: &[u32],
        start: U256,
        stop: U256,
    ) -> Result<Vec<Vec<Address>>>;

    /// One row per pair: `[reserve0, reserve1, tier_quote...]`
    async fn reserves_by_pairs(&self, query: ReservesQuery) -> Result<Vec<Vec<U256>>>;

    /// Gas the transaction would use; errors if it would revert
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64>;

    /// Current gas price in wei
    async fn gas_price(&self) -> Result<u128>;
}
