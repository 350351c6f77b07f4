#![allow(clippy::unwrap_used, missing_docs)]

use alloy::primitives::{Address, U256};

use super::market::{group_by_token, MarketsByToken};
use super::pool::{FeeTier, Pool, PoolId};
use super::token::TokenId;
use crate::utils::constants::FEE_TIERS;

/// Address whose last byte is `byte`, zero address for 0
pub fn addr(byte: u8) -> Address {
    Address::with_last_byte(byte)
}

/// Token at `addr(byte)`
pub fn token(byte: u8) -> TokenId {
    TokenId::from(addr(byte))
}

/// The native-wrapped token used throughout the tests
pub fn native() -> TokenId {
    token(0xEE)
}

/// Pool `id` pairing token `token_byte` with the native token.
/// Tier addresses are `addr(byte)`, a 0 byte leaves the tier inactive.
pub fn pool(
    id: u8,
    token_byte: u8,
    native_reserve: u128,
    token_reserve: u128,
    tiers: &[u8],
) -> Pool {
    let (token0, token1) = if token(token_byte) < native() {
        (token(token_byte), native())
    } else {
        (native(), token(token_byte))
    };
    let tiers = tiers
        .iter()
        .zip(FEE_TIERS)
        .map(|(byte, fee)| FeeTier::new(fee, addr(*byte)))
        .collect();
    let mut pool = Pool::new(PoolId::from(addr(id)), token0, token1, native(), tiers).unwrap();
    if token0 == native() {
        pool.set_reserves(U256::from(native_reserve), U256::from(token_reserve));
    } else {
        pool.set_reserves(U256::from(token_reserve), U256::from(native_reserve));
    }
    pool
}

/// Like [`pool`] with tier quotes, one `(tier address byte, quoted out)` per tier
pub fn quoted_pool(
    id: u8,
    token_byte: u8,
    native_reserve: u128,
    token_reserve: u128,
    quotes: &[(u8, u128)],
) -> Pool {
    let tier_bytes: Vec<u8> = quotes.iter().map(|(byte, _)| *byte).collect();
    let mut pool = pool(id, token_byte, native_reserve, token_reserve, &tier_bytes);
    let quoted: Vec<U256> = quotes.iter().map(|(_, quote)| U256::from(*quote)).collect();
    pool.set_quotes(&quoted);
    pool
}

/// Groups borrowed pools the same way the registry does
pub fn markets(pools: &[Pool]) -> MarketsByToken<'_> {
    group_by_token(pools.iter())
}
