use alloy::network::TransactionBuilder;
use alloy::primitives::{utils::format_ether, Address, U256};
use alloy::rpc::types::TransactionRequest;
use derive_more::Display;
use log::{error, info, warn};

use super::calldata::{build_buy_call, build_executor_call, build_sell_call};
use super::relay::{BundleRelay, Simulation};
use super::ExecutionError;
use crate::arb::opportunity::{Direction, OpportunityCandidate};
use crate::chain::ChainClient;
use crate::utils::constants::{GAS_ESTIMATE_CEILING, PLACEHOLDER_GAS_LIMIT};

/// Why a candidate was passed over; the next one is tried.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SkipReason {
    /// Only tier-to-pool round trips are executed
    #[display("direction {_0} is not executed")]
    UnsupportedDirection(Direction),
    /// The node could not estimate the transaction, usually because it reverts
    #[display("gas estimation failed: {_0}")]
    GasEstimateFailed(String),
    /// The estimate succeeded but is above the ceiling
    #[display("gas estimate {_0} suspiciously large")]
    SuspiciousGasEstimate(u64),
    /// The gas price could not be read
    #[display("gas price unavailable: {_0}")]
    GasPriceUnavailable(String),
    /// Gas would eat the searcher's share
    #[display("gas cost {cost} exceeds profit after reward {net}")]
    Unprofitable {
        /// Expected gas cost
        cost: U256,
        /// Profit left after the miner reward
        net: U256,
    },
    /// The searcher transaction could not be signed
    #[display("signing failed: {_0}")]
    SigningFailed(String),
    /// The relay could not simulate the bundle
    #[display("simulation error: {_0}")]
    SimulationFailed(String),
    /// The bundle simulated with a reverting transaction
    #[display("simulation reverted: {_0}")]
    Reverted(String),
}

/// Result of trying one candidate
#[derive(Debug)]
enum Outcome {
    /// Bundle sent to both target blocks
    Submitted,
    /// Candidate passed over
    Skipped(SkipReason),
}

/// Walks ranked candidates until one bundle is submitted.
#[derive(Debug, Clone)]
pub struct ExecutionPipeline {
    /// Executor contract running both legs
    pub executor: Address,
    /// Native-wrapped token
    pub native: Address,
    /// Account sending the transaction
    pub searcher: Address,
    /// Chain the transaction is signed for
    pub chain_id: u64,
}

impl ExecutionPipeline {
    /// Creates a pipeline sending from `searcher` through `executor`
    #[must_use]
    pub const fn new(executor: Address, native: Address, searcher: Address, chain_id: u64) -> Self {
        Self {
            executor,
            native,
            searcher,
            chain_id,
        }
    }

    /// Tries `ranked` in order, submitting the first candidate that survives
    /// estimation, the profit gate and simulation to the next two blocks.
    ///
    /// # Arguments
    /// * `chain` - Gas estimation and gas price
    /// * `relay` - Signing, simulation and submission
    /// * `ranked` - Candidates, most profitable first
    /// * `block_number` - Block the cycle was triggered by
    /// * `miner_reward_percentage` - Share of profit paid to the block producer
    /// * `amount_in` - Native input of the buy leg
    ///
    /// # Returns
    /// `true` if a bundle was submitted, `false` if every candidate was skipped
    ///
    /// # Errors
    /// * [`ExecutionError::InvariantViolation`] if a candidate cannot be encoded
    /// * [`ExecutionError::Submission`] if the relay rejects a simulated bundle
    pub async fn attempt<C: ChainClient, R: BundleRelay>(
        &self,
        chain: &C,
        relay: &R,
        ranked: &[OpportunityCandidate<'_>],
        block_number: u64,
        miner_reward_percentage: u64,
        amount_in: U256,
    ) -> Result<bool, ExecutionError> {
        for candidate in ranked {
            let outcome = self
                .try_candidate(
                    chain,
                    relay,
                    candidate,
                    block_number,
                    miner_reward_percentage,
                    amount_in,
                )
                .await;
            match outcome {
                Ok(Outcome::Submitted) => return Ok(true),
                Ok(Outcome::Skipped(reason)) => {
                    info!("pipeline::attempt: token {}: {reason}, skipping", candidate.token);
                }
                Err(e) => {
                    error!("pipeline::attempt: token {}: {e}", candidate.token);
                    return Err(e);
                }
            }
        }
        info!("pipeline::attempt: No arbitrage submitted to relay");
        Ok(false)
    }

    /// The executor transaction for `candidate`, with gas price 0 and a placeholder limit
    ///
    /// # Errors
    /// * If either leg cannot be encoded
    pub fn build_transaction(
        &self,
        candidate: &OpportunityCandidate<'_>,
        miner_reward: U256,
        amount_in: U256,
    ) -> Result<TransactionRequest, ExecutionError> {
        let buy = build_buy_call(candidate, self.native, amount_in)?;
        let sell = build_sell_call(candidate, self.executor)?;
        let data = build_executor_call(
            miner_reward,
            vec![self.executor, candidate.sell_to.id.address()],
            vec![buy, sell],
        );
        Ok(TransactionRequest::default()
            .with_from(self.searcher)
            .with_to(self.executor)
            .with_input(data)
            .with_gas_price(0)
            .with_gas_limit(PLACEHOLDER_GAS_LIMIT))
    }

    /// Runs one candidate through the gates and submits it if it passes
    async fn try_candidate<C: ChainClient, R: BundleRelay>(
        &self,
        chain: &C,
        relay: &R,
        candidate: &OpportunityCandidate<'_>,
        block_number: u64,
        miner_reward_percentage: u64,
        amount_in: U256,
    ) -> Result<Outcome, ExecutionError> {
        if candidate.direction != Direction::TierToPool {
            warn!(
                "pipeline::try_candidate: token {}: {} not implemented yet",
                candidate.token, candidate.direction
            );
            return Ok(Outcome::Skipped(SkipReason::UnsupportedDirection(
                candidate.direction,
            )));
        }

        let miner_reward =
            candidate.profit.saturating_mul(U256::from(miner_reward_percentage)) / U256::from(100);
        let mut tx = self.build_transaction(candidate, miner_reward, amount_in)?;

        let estimate = match chain.estimate_gas(&tx).await {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!("pipeline::try_candidate: estimate gas failure for {candidate}");
                return Ok(Outcome::Skipped(SkipReason::GasEstimateFailed(e.to_string())));
            }
        };
        if estimate > GAS_ESTIMATE_CEILING {
            return Ok(Outcome::Skipped(SkipReason::SuspiciousGasEstimate(estimate)));
        }
        let gas_limit = estimate.saturating_mul(2);

        let gas_price = match chain.gas_price().await {
            Ok(gas_price) => gas_price,
            Err(e) => return Ok(Outcome::Skipped(SkipReason::GasPriceUnavailable(e.to_string()))),
        };
        tx.set_gas_limit(gas_limit);
        tx.set_gas_price(gas_price);
        tx.set_chain_id(self.chain_id);

        let cost = U256::from(gas_price).saturating_mul(U256::from(gas_limit / 2));
        let net = candidate.profit.saturating_sub(miner_reward);
        info!(
            "pipeline::try_candidate: token {}: profit {}, reward {}, cost {}, estimate {estimate}",
            candidate.token,
            format_ether(candidate.profit),
            format_ether(miner_reward),
            format_ether(cost)
        );
        if cost > net {
            return Ok(Outcome::Skipped(SkipReason::Unprofitable { cost, net }));
        }

        let bundle = match relay.sign_bundle(vec![tx]).await {
            Ok(bundle) => bundle,
            Err(e) => return Ok(Outcome::Skipped(SkipReason::SigningFailed(e.to_string()))),
        };

        let report = match relay.simulate(&bundle, block_number + 1).await {
            Ok(Simulation::Completed(report)) => report,
            Ok(Simulation::Error(message)) => {
                return Ok(Outcome::Skipped(SkipReason::SimulationFailed(message)));
            }
            Err(e) => return Ok(Outcome::Skipped(SkipReason::SimulationFailed(e.to_string()))),
        };
        if let Some(revert) = report.first_revert {
            return Ok(Outcome::Skipped(SkipReason::Reverted(revert)));
        }

        info!(
            "pipeline::try_candidate: Submitting bundle, miner share {}, gas price {} wei",
            format_ether(report.coinbase_diff),
            report.effective_gas_price()
        );
        let (first, second) = tokio::try_join!(
            relay.send_raw_bundle(&bundle, block_number + 1),
            relay.send_raw_bundle(&bundle, block_number + 2)
        )
        .map_err(|e| ExecutionError::Submission(e.to_string()))?;
        info!(
            "pipeline::try_candidate: Bundle sent for blocks {} and {} ({first:?}, {second:?}), \
             profit {}",
            block_number + 1,
            block_number + 2,
            format_ether(candidate.profit)
        );
        Ok(Outcome::Submitted)
    }
}
