use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use alloy::primitives::{Address, U256};
use derive_more::Display as DeriveDisplay;
use eyre::{bail, Result};

use super::pricing::{self, PricingError};
use super::token::TokenId;

/// Pool identifier, the pair contract address.
#[derive(Clone, Copy, Debug, DeriveDisplay, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{_0}")]
pub struct PoolId(pub Address);

impl PoolId {
    /// Underlying address of the pair contract
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for PoolId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

/// One fee-tier pool trading the same token against the native asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeTier {
    /// Fee in hundredths of a bip (100 = 0.01%)
    pub fee: u32,
    /// Tier pool address, `None` when the tier has no pool for this pair
    pub address: Option<Address>,
    /// Token amount the tier quoted for the last probe input
    pub quoted_out: U256,
}

impl FeeTier {
    /// Creates a tier with no quote yet. A zero address marks the tier inactive.
    #[must_use]
    pub fn new(fee: u32, address: Address) -> Self {
        Self {
            fee,
            address: (!address.is_zero()).then_some(address),
            quoted_out: U256::ZERO,
        }
    }

    /// Whether the tier has a pool to trade against
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.address.is_some()
    }
}

/// A constant-product pair of a token against the native-wrapped asset,
/// together with the fee-tier pools quoting the same pair.
///
/// Equality and hashing only look at the pool id: reserves and quotes change
/// every block, the identity of the pool does not.
#[derive(Clone)]
pub struct Pool {
    /// Address of the pair
    pub id: PoolId,
    /// Lower-addressed token of the pair
    pub token0: TokenId,
    /// Higher-addressed token of the pair
    pub token1: TokenId,
    /// The native-wrapped side of the pair
    native: TokenId,
    /// Cached reserve of `token0`
    reserve0: U256,
    /// Cached reserve of `token1`
    reserve1: U256,
    /// Fee tiers in the order the lookup contract reports them
    tiers: Vec<FeeTier>,
}

impl PartialEq for Pool {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Pool {}

impl Hash for Pool {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool({}, {} {} / {} {}, tiers: {})",
            self.id,
            self.reserve0,
            self.token0,
            self.reserve1,
            self.token1,
            self.tiers.iter().filter(|tier| tier.is_active()).count()
        )
    }
}

impl Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} => {})", self.id, self.token0, self.token1)
    }
}

impl Pool {
    /// Creates a pool with zero reserves.
    ///
    /// # Errors
    ///
    /// Returns an error if both tokens are the same or neither of them is `native`.
    pub fn new(
        id: PoolId,
        token0: TokenId,
        token1: TokenId,
        native: TokenId,
        tiers: Vec<FeeTier>,
    ) -> Result<Self> {
        if token0 == token1 {
            bail!("Pool token0 and token1 must be different");
        }
        if token0 != native && token1 != native {
            bail!("Pool {id} does not trade against the native asset {native}");
        }
        Ok(Self {
            id,
            token0,
            token1,
            native,
            reserve0: U256::ZERO,
            reserve1: U256::ZERO,
            tiers,
        })
    }

    /// The non-native token of the pair
    #[must_use]
    pub fn token(&self) -> TokenId {
        if self.token0 == self.native {
            self.token1
        } else {
            self.token0
        }
    }

    /// The native-wrapped token of the pair
    #[must_use]
    pub const fn native(&self) -> TokenId {
        self.native
    }

    /// Cached reserve of `token`, `None` if the pool does not trade it
    #[must_use]
    pub fn reserve_of(&self, token: TokenId) -> Option<U256> {
        if token == self.token0 {
            Some(self.reserve0)
        } else if token == self.token1 {
            Some(self.reserve1)
        } else {
            None
        }
    }

    /// Cached reserve of the native side
    #[must_use]
    pub fn native_reserve(&self) -> U256 {
        if self.token0 == self.native {
            self.reserve0
        } else {
            self.reserve1
        }
    }

    /// Fee tiers, active or not
    #[must_use]
    pub fn tiers(&self) -> &[FeeTier] {
        &self.tiers
    }

    /// Active flag of every tier, in tier order
    #[must_use]
    pub fn tier_flags(&self) -> Vec<bool> {
        self.tiers.iter().map(FeeTier::is_active).collect()
    }

    /// Whether at least one tier can be traded
    #[must_use]
    pub fn has_active_tier(&self) -> bool {
        self.tiers.iter().any(FeeTier::is_active)
    }

    /// Overwrites the cached reserves, in `token0`/`token1` order
    pub fn set_reserves(&mut self, reserve0: U256, reserve1: U256) {
        self.reserve0 = reserve0;
        self.reserve1 = reserve1;
    }

    /// Overwrites the cached tier quotes, in tier order. Extra quotes are ignored.
    pub fn set_quotes(&mut self, quotes: &[U256]) {
        for (tier, quote) in self.tiers.iter_mut().zip(quotes) {
            tier.quoted_out = *quote;
        }
    }

    /// Amount of the other token received for selling `amount_in` of `token_in`
    /// against the cached reserves.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool does not trade `token_in` or the quote fails.
    pub fn amount_out(&self, token_in: TokenId, amount_in: U256) -> Result<U256> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in)?;
        Ok(pricing::quote_output(reserve_in, reserve_out, amount_in)?)
    }

    /// Price selling `amount_in` of the non-native token back into the native asset
    ///
    /// # Errors
    ///
    /// Propagates the pricing error.
    pub fn native_out(&self, amount_in: U256) -> Result<U256, PricingError> {
        let (reserve_in, reserve_out) = if self.token0 == self.native {
            (self.reserve1, self.reserve0)
        } else {
            (self.reserve0, self.reserve1)
        };
        pricing::quote_output(reserve_in, reserve_out, amount_in)
    }

    /// (`reserve_in`, `reserve_out`) for a sale of `token_in`
    fn reserves_for(&self, token_in: TokenId) -> Result<(U256, U256)> {
        if token_in == self.token0 {
            Ok((self.reserve0, self.reserve1))
        } else if token_in == self.token1 {
            Ok((self.reserve1, self.reserve0))
        } else {
            bail!("Pool {} does not trade token {token_in}", self.id)
        }
    }
}
