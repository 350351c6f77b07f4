use std::collections::{HashMap, HashSet};

use alloy::primitives::U256;
use eyre::{bail, Result};
use log::{debug, info};

use super::pool::{Pool, PoolId};
use super::token::TokenId;

/// Pools grouped by the non-native token they trade, in first-seen order.
///
/// Borrowed from the registry for the length of one cycle.
#[derive(Debug, Clone, Default)]
pub struct MarketsByToken<'a> {
    /// (token, pools trading it) pairs
    groups: Vec<(TokenId, Vec<&'a Pool>)>,
}

impl<'a> MarketsByToken<'a> {
    /// Iterates tokens and their pools in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &[&'a Pool])> + '_ {
        self.groups
            .iter()
            .map(|(token, pools)| (*token, pools.as_slice()))
    }

    /// Pools trading `token`
    #[must_use]
    pub fn pools(&self, token: TokenId) -> Option<&[&'a Pool]> {
        self.groups
            .iter()
            .find(|(candidate, _)| *candidate == token)
            .map(|(_, pools)| pools.as_slice())
    }

    /// Number of tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no token has a pool
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of pools across all tokens
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.groups.iter().map(|(_, pools)| pools.len()).sum()
    }
}

/// Groups pools by their non-native token, keeping the order tokens are first seen.
/// A token with a single pool is kept; it simply never produces a crossed market.
pub fn group_by_token<'a>(
    pools: impl IntoIterator<Item = &'a Pool>,
) -> MarketsByToken<'a> {
    let mut index: HashMap<TokenId, usize> = HashMap::new();
    let mut groups: Vec<(TokenId, Vec<&'a Pool>)> = Vec::new();
    for pool in pools {
        let token = pool.token();
        match index.get(&token) {
            Some(&position) => groups[position].1.push(pool),
            None => {
                index.insert(token, groups.len());
                groups.push((token, vec![pool]));
            }
        }
    }
    MarketsByToken { groups }
}

/// Pools holding strictly more than `floor` of the native asset
pub fn liquid_pools<'a>(
    pools: impl IntoIterator<Item = &'a Pool>,
    floor: U256,
) -> Vec<&'a Pool> {
    pools
        .into_iter()
        .filter(|pool| pool.native_reserve() > floor)
        .collect()
}

/// Fresh on-chain state for one pool, in the order of [`MarketRegistry::pools`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReserves {
    /// Reserve of `token0`
    pub reserve0: U256,
    /// Reserve of `token1`
    pub reserve1: U256,
    /// Quoted token output per fee tier for the probe input
    pub quotes: Vec<U256>,
}

/// Owner of every discovered pool and the only writer of their cached state.
///
/// All pools are refreshed each block; only the ones that were liquid when the
/// registry was bootstrapped are evaluated. Liquidity is not re-checked later,
/// so the grouping stays fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct MarketRegistry {
    /// Every discovered pool, in discovery order
    pools: Vec<Pool>,
    /// Ids of the pools that are evaluated
    evaluated: HashSet<PoolId>,
}

impl MarketRegistry {
    /// Creates a registry that evaluates every pool it is given
    #[must_use]
    pub fn new(pools: Vec<Pool>) -> Self {
        let evaluated = pools.iter().map(|pool| pool.id).collect();
        Self { pools, evaluated }
    }

    /// Restricts evaluation to pools holding more than `floor` native, using the
    /// reserves cached right now. Meant to run once, after the first refresh.
    pub fn retain_liquid(&mut self, floor: U256) {
        self.evaluated = liquid_pools(&self.pools, floor)
            .into_iter()
            .map(|pool| pool.id)
            .collect();
        info!(
            "market::retain_liquid: {} of {} pools above {floor} native, {} tokens",
            self.evaluated.len(),
            self.pools.len(),
            self.markets_by_token().len()
        );
    }

    /// Every discovered pool, in refresh order
    #[must_use]
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Snapshot of the evaluated pools grouped by token
    #[must_use]
    pub fn markets_by_token(&self) -> MarketsByToken<'_> {
        group_by_token(
            self.pools
                .iter()
                .filter(|pool| self.evaluated.contains(&pool.id)),
        )
    }

    /// Writes fresh reserves and quotes, one entry per pool in [`Self::pools`] order.
    ///
    /// Every entry is checked before the first write, so either all pools are
    /// updated or none is.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of entries does not match the number of
    /// pools, or an entry carries fewer quotes than its pool has tiers.
    pub fn apply_reserves(&mut self, reserves: Vec<PoolReserves>) -> Result<()> {
        if reserves.len() != self.pools.len() {
            bail!(
                "Got reserves for {} pools, registry holds {}",
                reserves.len(),
                self.pools.len()
            );
        }
        for (pool, update) in self.pools.iter().zip(&reserves) {
            if update.quotes.len() < pool.tiers().len() {
                bail!(
                    "Pool {} has {} tiers but only {} quotes",
                    pool.id,
                    pool.tiers().len(),
                    update.quotes.len()
                );
            }
        }
        for (pool, update) in self.pools.iter_mut().zip(reserves) {
            pool.set_reserves(update.reserve0, update.reserve1);
            pool.set_quotes(&update.quotes);
        }
        debug!("market::apply_reserves: updated {} pools", self.pools.len());
        Ok(())
    }
}
