use alloy::primitives::{address, Address, U256};

/// One native unit (10^18 wei)
pub const ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
/// Smallest profit worth executing, 1/1000 native
pub const MIN_PROFIT: U256 = U256::from_limbs([1_000_000_000_000_000, 0, 0, 0]);
/// Pools at or below this native reserve are never evaluated
pub const LIQUIDITY_FLOOR: U256 = ETHER;
/// Probe input used every block: 11/69 of a native unit
pub const PROBE_AMOUNT_IN: U256 = U256::from_limbs([159_420_289_855_072_463, 0, 0, 0]);
/// Probe input for the bootstrap refresh
pub const BOOTSTRAP_PROBE_AMOUNT_IN: U256 = ETHER;

/// Fee tiers quoted for every pair, in hundredths of a bip
pub const FEE_TIERS: [u32; 4] = [100, 500, 3000, 10_000];
/// Pairs requested per lookup page; a shorter page ends discovery
pub const PAIRS_BATCH_SIZE: u64 = 250;
/// Pools per reserves query
pub const RESERVES_CHUNK_SIZE: usize = 30;

/// Gas limit set before the estimate is known
pub const PLACEHOLDER_GAS_LIMIT: u64 = 1_000_000;
/// Estimates above this are treated as a sign the call misbehaves
pub const GAS_ESTIMATE_CEILING: u64 = 1_400_000;

/// Wrapped ether on mainnet
pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
/// Uniswap V3 quoter on mainnet
pub const UNISWAP_V3_QUOTER_ADDRESS: Address =
    address!("0xb27308f9F90D607463bb33eA1BeBb41C27CE5AB6");
/// Uniswap V3 factory on mainnet
pub const UNISWAP_V3_FACTORY_ADDRESS: Address =
    address!("0x1F98431c8aD98523631AE4a59f267346ea31F984");
/// Constant-product factories paged for pairs
pub const FACTORY_ADDRESSES: [Address; 2] = [
    // Uniswap V2
    address!("0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f"),
    // SushiSwap
    address!("0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac"),
];
/// Tokens known to break swaps
pub const BLACKLIST_TOKENS: [Address; 1] = [address!("0xD13c7342e1ef687C5ad21b27c2b65D772cAb5C8c")];
/// Flashbots relay endpoint
pub const FLASHBOTS_RELAY_URL: &str = "https://relay.flashbots.net";
