use std::fmt::{self, Display};

use alloy::primitives::{Address, U256};
use eyre::{bail, Result};

use super::pool::Pool;
use super::token::TokenId;

/// Which leg trades against a fee tier and which against the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sell native into a fee tier for the token, sell the token back into the pool
    TierToPool,
    /// Sell native into the pool for the token, sell the token back into a fee tier
    PoolToTier,
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TierToPool => write!(f, "tier>pool"),
            Self::PoolToTier => write!(f, "pool>tier"),
        }
    }
}

/// A profitable round trip found in the current reserve snapshot.
///
/// Borrows the sell-side pool from the registry, so a candidate can never
/// outlive the snapshot it was priced against.
#[derive(Clone, Debug)]
pub struct OpportunityCandidate<'a> {
    /// Token traded through on the way back to the native asset
    pub token: TokenId,
    /// Native amount put in on the buy leg
    pub volume: U256,
    /// Native amount gained, always strictly positive
    pub profit: U256,
    /// Fee-tier pool the token is bought from
    pub buy_from: Address,
    /// Pool the token is sold back into
    pub sell_to: &'a Pool,
    /// Token amount the buy leg is quoted to return
    pub intermediate: U256,
    /// Trade direction
    pub direction: Direction,
}

impl<'a> OpportunityCandidate<'a> {
    /// Creates a candidate from a round trip returning `amount_out` for `volume`.
    ///
    /// # Errors
    ///
    /// Returns an error if the round trip does not gain native, if the sell pool
    /// does not pair `token` with the native asset, or if the buy leg returns nothing.
    pub fn new(
        token: TokenId,
        volume: U256,
        amount_out: U256,
        buy_from: Address,
        sell_to: &'a Pool,
        intermediate: U256,
        direction: Direction,
    ) -> Result<Self> {
        if amount_out <= volume {
            bail!("Round trip through {token} returns {amount_out} for {volume}, no profit");
        }
        if sell_to.token() != token {
            bail!("Pool {} does not pair {token} with the native asset", sell_to.id);
        }
        if intermediate.is_zero() {
            bail!("Buy leg for {token} returns no tokens");
        }
        Ok(Self {
            token,
            volume,
            profit: amount_out - volume,
            buy_from,
            sell_to,
            intermediate,
            direction,
        })
    }
}

impl Display for OpportunityCandidate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: buy {} from {} sell to {} (volume {}, profit {})",
            self.direction,
            self.token,
            self.intermediate,
            self.buy_from,
            self.sell_to.id,
            self.volume,
            self.profit
        )
    }
}
