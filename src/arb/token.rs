use alloy::primitives::Address;
use derive_more::Display;

/// Token identifier, the ERC-20 contract address.
///
/// Ordering follows the raw address bytes, which is the same ordering pools use
/// to decide which side of the pair is `token0`.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{_0}")]
pub struct TokenId(pub Address);

impl TokenId {
    /// Underlying address of the token contract
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for TokenId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}
