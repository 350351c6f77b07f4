//! Process configuration read from the environment (and `.env`, if present).

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use eyre::{bail, eyre, Result, WrapErr};
use url::Url;

use crate::utils::constants::{
    BLACKLIST_TOKENS, FACTORY_ADDRESSES, FLASHBOTS_RELAY_URL, UNISWAP_V3_FACTORY_ADDRESS,
    UNISWAP_V3_QUOTER_ADDRESS, WETH,
};

/// Everything the searcher needs to start.
#[derive(Clone)]
pub struct Config {
    /// HTTP JSON-RPC endpoint for reads, estimates and nonces
    pub rpc_url: Url,
    /// Websocket endpoint for new block headers
    pub ws_url: Url,
    /// Key of the searcher account that signs the arbitrage transaction
    pub private_key: String,
    /// Key identifying the searcher to the relay; holds no funds
    pub relay_signing_key: String,
    /// Relay endpoint bundles are simulated on and sent to
    pub relay_url: Url,
    /// Executor contract holding the searcher's WETH
    pub executor: Address,
    /// Lookup contract paging pairs and batching reserves
    pub lookup: Address,
    /// Quoter the lookup contract asks for tier quotes
    pub quoter: Address,
    /// Native-wrapped token
    pub weth: Address,
    /// Chain id stamped on the transaction
    pub chain_id: u64,
    /// Share of the profit paid to the block producer, in percent
    pub miner_reward_percentage: u64,
    /// URL pinged after every completed execution attempt
    pub healthcheck_url: Option<Url>,
    /// First lookup page to request
    pub batch_count_start: u64,
    /// Page to stop before, `None` pages until the factory runs out
    pub batch_count_limit: Option<u64>,
    /// Constant-product factories to page
    pub factories: Vec<Address>,
    /// Factory of the fee-tier pools
    pub v3_factory: Address,
    /// Tokens never traded
    pub blacklist: Vec<Address>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("ws_url", &self.ws_url.as_str())
            .field("private_key", &REDACTED)
            .field("relay_signing_key", &REDACTED)
            .field("relay_url", &self.relay_url.as_str())
            .field("executor", &self.executor)
            .field("lookup", &self.lookup)
            .field("quoter", &self.quoter)
            .field("weth", &self.weth)
            .field("chain_id", &self.chain_id)
            .field("miner_reward_percentage", &self.miner_reward_percentage)
            .field("healthcheck_url", &self.healthcheck_url.as_ref().map(Url::as_str))
            .field("batch_count_start", &self.batch_count_start)
            .field("batch_count_limit", &self.batch_count_limit)
            .field("factories", &self.factories)
            .field("v3_factory", &self.v3_factory)
            .field("blacklist", &self.blacklist)
            .finish()
    }
}

/// Printed in place of the keys
const REDACTED: &str = "<redacted>";

impl Config {
    /// Loads `.env` if present and reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable that is missing or malformed.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable that is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| eyre!("{key} must be set"));

        let miner_reward_percentage =
            parse_or(get("MINER_REWARD_PERCENTAGE"), "MINER_REWARD_PERCENTAGE", 80)?;
        if miner_reward_percentage > 100 {
            bail!("MINER_REWARD_PERCENTAGE must be at most 100, got {miner_reward_percentage}");
        }

        Ok(Self {
            rpc_url: parse_or(
                get("ETH_RPC_URL"),
                "ETH_RPC_URL",
                Url::parse("http://127.0.0.1:8545")?,
            )?,
            ws_url: parse_or(
                get("ETH_WS_URL"),
                "ETH_WS_URL",
                Url::parse("ws://127.0.0.1:8546")?,
            )?,
            private_key: require("PRIVATE_KEY")?,
            relay_signing_key: require("FLASHBOTS_RELAY_SIGNING_KEY")?,
            relay_url: parse_or(
                get("FLASHBOTS_RELAY_URL"),
                "FLASHBOTS_RELAY_URL",
                Url::parse(FLASHBOTS_RELAY_URL)?,
            )?,
            executor: parse(&require("EXECUTOR_ADDR")?, "EXECUTOR_ADDR")?,
            lookup: parse(&require("LOOKUP_ADDR")?, "LOOKUP_ADDR")?,
            quoter: parse_or(get("QUOTER_ADDR"), "QUOTER_ADDR", UNISWAP_V3_QUOTER_ADDRESS)?,
            weth: parse_or(get("WETH_ADDR"), "WETH_ADDR", WETH)?,
            chain_id: parse_or(get("CHAIN_ID"), "CHAIN_ID", 1)?,
            miner_reward_percentage,
            healthcheck_url: get("HEALTHCHECK_URL")
                .map(|value| parse(&value, "HEALTHCHECK_URL"))
                .transpose()?,
            batch_count_start: parse_or(get("BATCH_COUNT_START"), "BATCH_COUNT_START", 0)?,
            batch_count_limit: get("BATCH_COUNT_LIMIT")
                .map(|value| parse(&value, "BATCH_COUNT_LIMIT"))
                .transpose()?,
            factories: match get("FACTORY_ADDRESSES") {
                Some(value) => parse_list(&value, "FACTORY_ADDRESSES")?,
                None => FACTORY_ADDRESSES.to_vec(),
            },
            v3_factory: parse_or(
                get("UNISWAP_V3_FACTORY_ADDRESS"),
                "UNISWAP_V3_FACTORY_ADDRESS",
                UNISWAP_V3_FACTORY_ADDRESS,
            )?,
            blacklist: {
                let mut blacklist = BLACKLIST_TOKENS.to_vec();
                if let Some(value) = get("BLACKLIST_TOKENS") {
                    blacklist.extend(parse_list::<Address>(&value, "BLACKLIST_TOKENS")?);
                }
                blacklist
            },
        })
    }
}

/// Parses `value`, naming `key` in the error
fn parse<T>(value: &str, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .wrap_err_with(|| format!("{key} is malformed: {value}"))
}

/// Parses `value` if present, `default` otherwise
fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.map_or(Ok(default), |value| parse(&value, key))
}

/// Parses a comma separated list
fn parse_list<T>(value: &str, key: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .split(',')
        .filter(|item| !item.trim().is_empty())
        .map(|item| parse(item, key))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("PRIVATE_KEY", "0x01"),
        ("FLASHBOTS_RELAY_SIGNING_KEY", "0x02"),
        ("EXECUTOR_ADDR", "0x00000000000000000000000000000000000000e1"),
        ("LOOKUP_ADDR", "0x00000000000000000000000000000000000000e2"),
    ];

    #[test]
    fn test_defaults() {
        let config = config(&REQUIRED).unwrap();
        assert_eq!(config.miner_reward_percentage, 80);
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.weth, WETH);
        assert_eq!(config.factories, FACTORY_ADDRESSES.to_vec());
        assert_eq!(config.blacklist, BLACKLIST_TOKENS.to_vec());
        assert_eq!(config.batch_count_start, 0);
        assert_eq!(config.batch_count_limit, None);
        assert!(config.healthcheck_url.is_none());
        assert_eq!(config.relay_url.as_str(), "https://relay.flashbots.net/");
    }

    #[test]
    fn test_missing_required_key_is_named() {
        let err = config(&REQUIRED[1..]).unwrap_err();
        assert_eq!(err.to_string(), "PRIVATE_KEY must be set");
    }

    #[test]
    fn test_overrides_and_lists() {
        let blacklist = format!(
            "{}, {}",
            "0x00000000000000000000000000000000000000b1",
            "0x00000000000000000000000000000000000000b2"
        );
        let mut vars: Vec<(&str, &str)> = REQUIRED.to_vec();
        vars.extend([
            ("MINER_REWARD_PERCENTAGE", "95"),
            ("CHAIN_ID", "5"),
            ("BATCH_COUNT_LIMIT", "4"),
            ("HEALTHCHECK_URL", "https://hc-ping.com/abc"),
            ("BLACKLIST_TOKENS", blacklist.as_str()),
        ]);
        let config = config(&vars).unwrap();
        assert_eq!(config.miner_reward_percentage, 95);
        assert_eq!(config.chain_id, 5);
        assert_eq!(config.batch_count_limit, Some(4));
        assert_eq!(config.blacklist.len(), 3);
        assert!(config.healthcheck_url.is_some());
    }

    #[test]
    fn test_debug_hides_keys() {
        let mut vars: Vec<(&str, &str)> = REQUIRED.to_vec();
        vars[0] = ("PRIVATE_KEY", "0xdeadbeefcafe");
        vars[1] = ("FLASHBOTS_RELAY_SIGNING_KEY", "0xfeedfacebabe");
        let printed = format!("{:?}", config(&vars).unwrap());
        assert!(!printed.contains("deadbeefcafe"));
        assert!(!printed.contains("feedfacebabe"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("chain_id: 1"));
    }

    #[test]
    fn test_rejects_reward_above_hundred() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("MINER_REWARD_PERCENTAGE", "101"));
        assert!(config(&vars).is_err());
    }

    #[test]
    fn test_malformed_address() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = ("EXECUTOR_ADDR", "not-an-address");
        let err = config(&vars).unwrap_err();
        assert!(err.to_string().starts_with("EXECUTOR_ADDR is malformed"));
    }
}
