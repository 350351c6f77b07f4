use alloy::primitives::{Address, U256};
use eyre::{bail, Error, Result};

use crate::arb::market::PoolReserves;

/// One row of `getPairsByIndexRange`: the pair and its fee-tier pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairInfo {
    /// Lower-addressed token
    pub token0: Address,
    /// Higher-addressed token
    pub token1: Address,
    /// Address of the pair
    pub address: Address,
    /// One pool per fee tier, zero address when the tier has none
    pub tier_pools: Vec<Address>,
}

impl PairInfo {
    /// Parses a row whose last `tier_count` entries are the tier pools.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is too short to hold the pair and its tiers.
    pub fn from_row(row: &[Address], tier_count: usize) -> Result<Self> {
        if row.len() < 3 + tier_count {
            bail!(
                "Pair row has {} entries, expected at least {}",
                row.len(),
                3 + tier_count
            );
        }
        let tiers_start = row.len() - tier_count;
        Ok(Self {
            token0: row[0],
            token1: row[1],
            address: row[2],
            tier_pools: row[tiers_start..].to_vec(),
        })
    }

    /// The token paired with `native`, `None` if neither side is `native`
    #[must_use]
    pub fn token_against(&self, native: Address) -> Option<Address> {
        if self.token0 == native {
            Some(self.token1)
        } else if self.token1 == native {
            Some(self.token0)
        } else {
            None
        }
    }
}

impl TryFrom<Vec<U256>> for PoolReserves {
    type Error = Error;

    /// `[reserve0, reserve1, tier_quote...]`
    fn try_from(row: Vec<U256>) -> Result<Self> {
        if row.len() < 2 {
            bail!("Reserves row has {} entries, expected at least 2", row.len());
        }
        Ok(Self {
            reserve0: row[0],
            reserve1: row[1],
            quotes: row[2..].to_vec(),
        })
    }
}
