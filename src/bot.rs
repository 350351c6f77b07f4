//! Per-block cycle driver.
//!
//! A single task owns the [`Bot`] and with it the registry; block numbers
//! arrive over a channel and are handled one at a time.

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::arb::finder::find_best;
use crate::arb::market::MarketRegistry;
use crate::bootstrap::MarketSettings;
use crate::chain::ChainClient;
use crate::execution::{BundleRelay, ExecutionPipeline};
use crate::notify::HealthCheck;
use crate::sync::refresh_reserves;
use crate::utils::constants::PROBE_AMOUNT_IN;

/// Capacity of the block notification channel
pub const BLOCK_CHANNEL_SIZE: usize = 64;

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Reserves could not be refreshed; the previous snapshot is kept
    RefreshFailed,
    /// No token had a crossed market worth taking
    NoCrossedMarkets,
    /// Every candidate was skipped
    NothingSubmitted,
    /// A bundle was submitted
    Submitted,
    /// The attempt ended on an execution error
    Aborted,
}

/// Owns the market state and everything a cycle talks to.
pub struct Bot<C, R> {
    /// Chain reads and gas estimation
    chain: C,
    /// Bundle relay
    relay: R,
    /// Pool universe and cached state
    registry: MarketRegistry,
    /// Lookup parameters for refreshes
    settings: MarketSettings,
    /// Candidate execution
    pipeline: ExecutionPipeline,
    /// Share of profit paid to the block producer
    miner_reward_percentage: u64,
    /// Liveness ping after each attempt
    health_check: HealthCheck,
}

impl<C: ChainClient, R: BundleRelay> Bot<C, R> {
    /// Creates a bot over a bootstrapped registry
    #[must_use]
    pub fn new(
        chain: C,
        relay: R,
        registry: MarketRegistry,
        settings: MarketSettings,
        pipeline: ExecutionPipeline,
        miner_reward_percentage: u64,
        health_check: HealthCheck,
    ) -> Self {
        Self {
            chain,
            relay,
            registry,
            settings,
            pipeline,
            miner_reward_percentage,
            health_check,
        }
    }

    /// The market state
    #[must_use]
    pub const fn registry(&self) -> &MarketRegistry {
        &self.registry
    }

    /// Handles block numbers until the sender side closes.
    ///
    /// Notifications that queued up during a cycle are collapsed into the
    /// newest one, so a slow cycle never leaves a backlog of stale heights.
    pub async fn run(&mut self, mut blocks: mpsc::Receiver<u64>) {
        info!("bot::run: waiting for blocks");
        while let Some(mut block) = blocks.recv().await {
            let mut dropped = 0_usize;
            while let Ok(newer) = blocks.try_recv() {
                block = block.max(newer);
                dropped += 1;
            }
            if dropped > 0 {
                debug!("bot::run: skipped {dropped} queued blocks, handling {block}");
            }
            self.run_cycle(block).await;
        }
        warn!("bot::run: block channel closed");
    }

    /// Refresh, search and attempt for one block. Never fails: every error is
    /// logged and turned into an outcome.
    pub async fn run_cycle(&mut self, block_number: u64) -> CycleOutcome {
        let amount_in = PROBE_AMOUNT_IN;

        if let Err(e) =
            refresh_reserves(&self.chain, &mut self.registry, &self.settings, amount_in).await
        {
            error!(
                "bot::run_cycle: block {block_number}: refresh failed, keeping last snapshot: {e}"
            );
            return CycleOutcome::RefreshFailed;
        }

        let markets = self.registry.markets_by_token();
        let ranked = find_best(&markets, amount_in);
        if ranked.is_empty() {
            info!("bot::run_cycle: block {block_number}: No crossed markets");
            return CycleOutcome::NoCrossedMarkets;
        }
        for candidate in &ranked {
            debug!("bot::run_cycle: {candidate}");
        }
        info!(
            "bot::run_cycle: block {block_number}: {} crossed markets",
            ranked.len()
        );

        let outcome = match self
            .pipeline
            .attempt(
                &self.chain,
                &self.relay,
                &ranked,
                block_number,
                self.miner_reward_percentage,
                amount_in,
            )
            .await
        {
            Ok(true) => CycleOutcome::Submitted,
            Ok(false) => CycleOutcome::NothingSubmitted,
            Err(e) => {
                error!("bot::run_cycle: block {block_number}: {e}");
                return CycleOutcome::Aborted;
            }
        };

        if let Err(e) = self.health_check.ping().await {
            warn!("bot::run_cycle: health check failed: {e}");
        }
        outcome
    }
}
