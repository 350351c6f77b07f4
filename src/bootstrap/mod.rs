//! Pool discovery and the initial registry snapshot.

/// Lookup contract row types
pub mod types;

use std::collections::HashSet;

use alloy::primitives::{Address, U256};
use eyre::Result;
use futures_util::future::try_join_all;
use itertools::Itertools;
use log::{debug, info};

use crate::arb::market::MarketRegistry;
use crate::arb::pool::{FeeTier, Pool, PoolId};
use crate::arb::token::TokenId;
use crate::bootstrap::types::PairInfo;
use crate::chain::ChainClient;
use crate::config::Config;
use crate::sync::reserves::refresh_reserves;
use crate::utils::constants::{
    BOOTSTRAP_PROBE_AMOUNT_IN, FEE_TIERS, LIQUIDITY_FLOOR, PAIRS_BATCH_SIZE, RESERVES_CHUNK_SIZE,
};

/// Where and how to look for pools, and how to read their state.
#[derive(Clone, Debug)]
pub struct MarketSettings {
    /// Native-wrapped token every pool must trade against
    pub native: Address,
    /// Constant-product factories to page
    pub factories: Vec<Address>,
    /// Factory of the fee-tier pools
    pub v3_factory: Address,
    /// Quoter used for tier quotes
    pub quoter: Address,
    /// Fee tiers, in the order the lookup contract reports them
    pub fee_tiers: Vec<u32>,
    /// Pairs per lookup page
    pub batch_size: u64,
    /// First page to request
    pub batch_start: u64,
    /// Page to stop before, `None` to page until a short page
    pub batch_limit: Option<u64>,
    /// Pools per reserves query
    pub chunk_size: usize,
    /// Tokens never traded
    pub blacklist: HashSet<Address>,
}

impl MarketSettings {
    /// Settings for the configured chain
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            native: config.weth,
            factories: config.factories.clone(),
            v3_factory: config.v3_factory,
            quoter: config.quoter,
            fee_tiers: FEE_TIERS.to_vec(),
            batch_size: PAIRS_BATCH_SIZE,
            batch_start: config.batch_count_start,
            batch_limit: config.batch_count_limit,
            chunk_size: RESERVES_CHUNK_SIZE,
            blacklist: config.blacklist.iter().copied().collect(),
        }
    }
}

/// Turns a lookup row into a pool, dropping pairs that do not trade against the
/// native asset, trade a blacklisted token, or have no active fee tier.
fn pool_from_pair(pair: &PairInfo, settings: &MarketSettings) -> Option<Pool> {
    let token = pair.token_against(settings.native)?;
    if settings.blacklist.contains(&token) {
        debug!("bootstrap::pool_from_pair: skipping blacklisted token {token}");
        return None;
    }
    let tiers: Vec<FeeTier> = settings
        .fee_tiers
        .iter()
        .zip(&pair.tier_pools)
        .map(|(fee, tier_pool)| FeeTier::new(*fee, *tier_pool))
        .collect();
    match Pool::new(
        PoolId::from(pair.address),
        TokenId::from(pair.token0),
        TokenId::from(pair.token1),
        TokenId::from(settings.native),
        tiers,
    ) {
        Ok(pool) if pool.has_active_tier() => Some(pool),
        Ok(_) => None,
        Err(e) => {
            debug!("bootstrap::pool_from_pair: skipping {}: {e}", pair.address);
            None
        }
    }
}

/// Retrieves one page of pairs from `factory` and keeps the tradeable ones
///
/// # Returns
/// The pools on the page and the number of rows the page held
///
/// # Errors
/// * If the lookup call fails
/// * If a row is malformed
pub async fn fetch_pools_by_range<C: ChainClient>(
    chain: &C,
    settings: &MarketSettings,
    factory: Address,
    from: u64,
    to: u64,
) -> Result<(Vec<Pool>, usize)> {
    let rows = chain
        .pairs_by_index_range(
            factory,
            settings.v3_factory,
            &settings.fee_tiers,
            U256::from(from),
            U256::from(to),
        )
        .await?;
    let mut pools = Vec::with_capacity(rows.len());
    for row in &rows {
        let pair = PairInfo::from_row(row, settings.fee_tiers.len())?;
        if let Some(pool) = pool_from_pair(&pair, settings) {
            pools.push(pool);
        }
    }
    Ok((pools, rows.len()))
}

/// Pages `factory` from the configured start until a short page
///
/// # Errors
/// * If any lookup call fails
pub async fn fetch_all_pools_by_factory<C: ChainClient>(
    chain: &C,
    settings: &MarketSettings,
    factory: Address,
) -> Result<Vec<Pool>> {
    let mut pools = Vec::new();
    let mut batch = settings.batch_start;
    loop {
        if settings.batch_limit.is_some_and(|limit| batch >= limit) {
            break;
        }
        let from = batch * settings.batch_size;
        let to = from + settings.batch_size;
        info!("bootstrap::fetch_all_pools_by_factory: {factory} pairs {from} to {to}");

        let (page, rows) = fetch_pools_by_range(chain, settings, factory, from, to).await?;
        pools.extend(page);

        if (rows as u64) < settings.batch_size {
            break;
        }
        batch += 1;
    }
    info!(
        "bootstrap::fetch_all_pools_by_factory: {factory} has {} tradeable pools",
        pools.len()
    );
    Ok(pools)
}

/// Discovers the pool universe across all factories, each paged concurrently.
/// Pools are deduplicated by address, keeping the first one seen.
///
/// # Errors
/// * If any factory fails to page
pub async fn discover<C: ChainClient>(chain: &C, settings: &MarketSettings) -> Result<Vec<Pool>> {
    let per_factory = try_join_all(
        settings
            .factories
            .iter()
            .map(|factory| fetch_all_pools_by_factory(chain, settings, *factory)),
    )
    .await?;

    let pools: Vec<Pool> = per_factory
        .into_iter()
        .flatten()
        .unique_by(|pool| pool.id)
        .collect();
    info!(
        "bootstrap::discover: {} pools across {} factories",
        pools.len(),
        settings.factories.len()
    );
    Ok(pools)
}

/// Discovers pools, reads their state once with a one-native probe, and keeps
/// only the liquid ones for evaluation.
///
/// # Errors
/// * If discovery or the first refresh fails
pub async fn bootstrap_registry<C: ChainClient>(
    chain: &C,
    settings: &MarketSettings,
) -> Result<MarketRegistry> {
    let pools = discover(chain, settings).await?;
    let mut registry = MarketRegistry::new(pools);
    refresh_reserves(chain, &mut registry, settings, BOOTSTRAP_PROBE_AMOUNT_IN).await?;
    registry.retain_liquid(LIQUIDITY_FLOOR);
    Ok(registry)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::{addr, native, token};
    use crate::test_helpers::{settings, MockChain};

    fn row(token0: u8, token1: u8, pair: u8, tiers: [u8; 4]) -> Vec<Address> {
        let mut row = vec![addr(token0), addr(token1), addr(pair)];
        row.extend(tiers.iter().map(|byte| addr(*byte)));
        row
    }

    #[tokio::test]
    async fn test_filters_pairs() {
        let chain = MockChain::default().with_pairs(
            addr(0xFA),
            vec![
                // token/native with one tier
                row(0x0A, 0xEE, 0xA1, [0, 0xC1, 0, 0]),
                // no native side
                row(0x0A, 0x0B, 0xA2, [0xC2, 0, 0, 0]),
                // no active tier
                row(0x0C, 0xEE, 0xA3, [0, 0, 0, 0]),
                // blacklisted token
                row(0x0D, 0xEE, 0xA4, [0xC4, 0, 0, 0]),
                // native is token0
                row(0xEE, 0xFB, 0xA5, [0xC5, 0xC6, 0, 0]),
            ],
        );
        let mut settings = settings(vec![addr(0xFA)]);
        settings.blacklist.insert(addr(0x0D));

        let pools = discover(&chain, &settings).await.unwrap();
        let ids: Vec<Address> = pools.iter().map(|pool| pool.id.address()).collect();
        assert_eq!(ids, vec![addr(0xA1), addr(0xA5)]);
        assert_eq!(pools[0].token(), token(0x0A));
        assert_eq!(pools[1].token(), token(0xFB));
        assert_eq!(pools[1].native(), native());
        assert_eq!(pools[1].tier_flags(), vec![true, true, false, false]);
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let rows: Vec<Vec<Address>> = (0..7_u8)
            .map(|i| row(i + 1, 0xEE, 0x80 + i, [0xC1, 0, 0, 0]))
            .collect();
        let chain = MockChain::default().with_pairs(addr(0xFA), rows);
        let mut settings = settings(vec![addr(0xFA)]);
        settings.batch_size = 3;

        let pools = discover(&chain, &settings).await.unwrap();
        assert_eq!(pools.len(), 7);
        // 0..3, 3..6, 6..9 (short)
        assert_eq!(chain.pair_calls(), vec![(0, 3), (3, 6), (6, 9)]);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_an_empty_page() {
        let rows: Vec<Vec<Address>> = (0..6_u8)
            .map(|i| row(i + 1, 0xEE, 0x80 + i, [0xC1, 0, 0, 0]))
            .collect();
        let chain = MockChain::default().with_pairs(addr(0xFA), rows);
        let mut settings = settings(vec![addr(0xFA)]);
        settings.batch_size = 3;

        assert_eq!(discover(&chain, &settings).await.unwrap().len(), 6);
        assert_eq!(chain.pair_calls(), vec![(0, 3), (3, 6), (6, 9)]);
    }

    #[tokio::test]
    async fn test_batch_window() {
        let rows: Vec<Vec<Address>> = (0..9_u8)
            .map(|i| row(i + 1, 0xEE, 0x80 + i, [0xC1, 0, 0, 0]))
            .collect();
        let chain = MockChain::default().with_pairs(addr(0xFA), rows);
        let mut settings = settings(vec![addr(0xFA)]);
        settings.batch_size = 3;
        settings.batch_start = 1;
        settings.batch_limit = Some(2);

        let pools = discover(&chain, &settings).await.unwrap();
        assert_eq!(pools.len(), 3);
        assert_eq!(pools[0].id.address(), addr(0x83));
        assert_eq!(chain.pair_calls(), vec![(3, 6)]);
    }

    #[tokio::test]
    async fn test_dedups_across_factories() {
        let chain = MockChain::default()
            .with_pairs(addr(0xFA), vec![row(0x0A, 0xEE, 0xA1, [0xC1, 0, 0, 0])])
            .with_pairs(
                addr(0xFB),
                vec![
                    row(0x0A, 0xEE, 0xA1, [0xC1, 0, 0, 0]),
                    row(0x0A, 0xEE, 0xA2, [0xC1, 0, 0, 0]),
                ],
            );
        let pools = discover(&chain, &settings(vec![addr(0xFA), addr(0xFB)]))
            .await
            .unwrap();
        let ids: Vec<Address> = pools.iter().map(|pool| pool.id.address()).collect();
        assert_eq!(ids, vec![addr(0xA1), addr(0xA2)]);
    }

    #[tokio::test]
    async fn test_bootstrap_keeps_liquid_pools() {
        let one = 1_000_000_000_000_000_000_u128;
        let chain = MockChain::default()
            .with_pairs(
                addr(0xFA),
                vec![
                    row(0x0A, 0xEE, 0xA1, [0xC1, 0, 0, 0]),
                    row(0x0A, 0xEE, 0xA2, [0xC2, 0, 0, 0]),
                ],
            )
            .with_reserves(addr(0xA1), &[1_000, 2 * one, 5, 0, 0, 0])
            .with_reserves(addr(0xA2), &[1_000, one, 5, 0, 0, 0]);

        let registry = bootstrap_registry(&chain, &settings(vec![addr(0xFA)]))
            .await
            .unwrap();
        assert_eq!(registry.pools().len(), 2);
        let markets = registry.markets_by_token();
        let pools = markets.pools(token(0x0A)).unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].id.address(), addr(0xA1));
        assert_eq!(chain.reserve_calls()[0].amount_in, BOOTSTRAP_PROBE_AMOUNT_IN);
    }
}
