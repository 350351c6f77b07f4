use alloy::primitives::{Address, U256};
use eyre::{bail, Result};
use futures_util::future::try_join_all;
use log::debug;

use crate::arb::market::{MarketRegistry, PoolReserves};
use crate::arb::pool::Pool;
use crate::bootstrap::MarketSettings;
use crate::chain::{ChainClient, ReservesQuery};

/// Builds the lookup query for one chunk of pools
fn chunk_query(pools: &[Pool], settings: &MarketSettings, amount_in: U256) -> ReservesQuery {
    ReservesQuery {
        quoter: settings.quoter,
        pairs: pools.iter().map(|pool| pool.id.address()).collect(),
        native: settings.native,
        tokens: pools.iter().map(|pool| pool.token().address()).collect::<Vec<Address>>(),
        fee_tiers: settings.fee_tiers.clone(),
        tiers_on: pools.iter().map(Pool::tier_flags).collect(),
        amount_in,
    }
}

/// Reads one chunk and checks it answers every pool it asked for
async fn fetch_chunk<C: ChainClient>(
    chain: &C,
    pools: &[Pool],
    settings: &MarketSettings,
    amount_in: U256,
) -> Result<Vec<PoolReserves>> {
    let rows = chain
        .reserves_by_pairs(chunk_query(pools, settings, amount_in))
        .await?;
    if rows.len() != pools.len() {
        bail!(
            "Reserves query for {} pools returned {} rows",
            pools.len(),
            rows.len()
        );
    }
    rows.into_iter().map(PoolReserves::try_from).collect()
}

/// Refreshes reserves and tier quotes of every pool in the registry
///
/// Pools are read in chunks of `settings.chunk_size`, all chunks in flight at
/// once. Nothing is written unless every chunk succeeds.
///
/// # Arguments
/// * `chain` - Chain client
/// * `registry` - Registry to update
/// * `settings` - Quoter, native token and chunking
/// * `amount_in` - Native input the tier quotes are taken for
///
/// # Returns
/// Number of pools refreshed
///
/// # Errors
/// * If any chunk's call fails
/// * If any chunk returns the wrong number of rows or a malformed row
pub async fn refresh_reserves<C: ChainClient>(
    chain: &C,
    registry: &mut MarketRegistry,
    settings: &MarketSettings,
    amount_in: U256,
) -> Result<usize> {
    let chunk_size = settings.chunk_size.max(1);
    let chunks = try_join_all(
        registry
            .pools()
            .chunks(chunk_size)
            .map(|chunk| fetch_chunk(chain, chunk, settings, amount_in)),
    )
    .await?;

    let reserves: Vec<PoolReserves> = chunks.into_iter().flatten().collect();
    let count = reserves.len();
    registry.apply_reserves(reserves)?;
    debug!("sync::reserves: refreshed {count} pools");
    Ok(count)
}
