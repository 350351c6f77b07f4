//! Application context for the searcher process.
//!
//! Everything built once from [`Config`] at startup: the chain client, both
//! signing keys, and the factories for the pieces the bot owns.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use eyre::{Error, Result};
use log::info;

use crate::bootstrap::MarketSettings;
use crate::chain::AlloyChainClient;
use crate::config::Config;
use crate::execution::{ExecutionPipeline, FlashbotsRelay};
use crate::notify::HealthCheck;
use crate::utils::providers::{create_http_provider, parse_signer};

/// Application context holding the shared connection and keys.
pub struct AppContext {
    /// Process configuration
    pub config: Config,
    /// Chain access through the lookup contract
    pub chain: AlloyChainClient,
    /// Key signing the bundle transactions
    pub searcher: PrivateKeySigner,
    /// Key authenticating relay requests
    pub relay_signer: PrivateKeySigner,
}

impl AppContext {
    /// Creates the context for `config`.
    ///
    /// # Errors
    /// * If either private key is malformed
    pub fn new(config: Config) -> Result<Self, Error> {
        let searcher = parse_signer(&config.private_key, "PRIVATE_KEY")?;
        let relay_signer = parse_signer(&config.relay_signing_key, "FLASHBOTS_RELAY_SIGNING_KEY")?;
        let provider = create_http_provider(config.rpc_url.clone());
        let chain = AlloyChainClient::new(provider, config.lookup);

        info!("MINER_REWARD_PERCENTAGE: {}", config.miner_reward_percentage);
        info!("Searcher Wallet Address: {}", searcher.address());
        info!("Flashbots Relay Signing Wallet Address: {}", relay_signer.address());

        Ok(Self {
            config,
            chain,
            searcher,
            relay_signer,
        })
    }

    /// Address the bundle transactions are sent from
    #[must_use]
    pub fn searcher_address(&self) -> Address {
        self.searcher.address()
    }

    /// Discovery and refresh parameters
    #[must_use]
    pub fn market_settings(&self) -> MarketSettings {
        MarketSettings::from_config(&self.config)
    }

    /// Relay client signing with the searcher key
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn relay(&self) -> Result<FlashbotsRelay> {
        FlashbotsRelay::new(
            self.config.relay_url.clone(),
            self.relay_signer.clone(),
            self.searcher.clone(),
            self.chain.provider().clone(),
        )
    }

    /// Execution pipeline sending from the searcher through the executor
    #[must_use]
    pub fn pipeline(&self) -> ExecutionPipeline {
        ExecutionPipeline::new(
            self.config.executor,
            self.config.weth,
            self.searcher_address(),
            self.config.chain_id,
        )
    }

    /// Health check for the configured endpoint
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn health_check(&self) -> Result<HealthCheck> {
        HealthCheck::new(self.config.healthcheck_url.clone())
    }
}
