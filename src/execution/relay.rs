use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{keccak256, utils::format_ether, Bytes, B256, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use eyre::{bail, eyre, Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Signed transactions submitted together, in order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedBundle {
    /// EIP-2718 encoded signed transactions
    pub txs: Vec<Bytes>,
}

impl SignedBundle {
    /// Transactions as `0x`-prefixed hex, the relay's wire format
    #[must_use]
    pub fn hex_txs(&self) -> Vec<String> {
        self.txs.iter().map(ToString::to_string).collect()
    }
}

/// Outcome of a successful bundle simulation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationReport {
    /// Native paid to the block producer
    pub coinbase_diff: U256,
    /// Gas used by the whole bundle
    pub total_gas_used: u64,
    /// First transaction that reverted, with its reason
    pub first_revert: Option<String>,
}

impl SimulationReport {
    /// Coinbase payment per unit of gas
    #[must_use]
    pub fn effective_gas_price(&self) -> U256 {
        if self.total_gas_used == 0 {
            return U256::ZERO;
        }
        self.coinbase_diff / U256::from(self.total_gas_used)
    }
}

/// Relay answer to a simulation request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Simulation {
    /// The bundle ran; it may still contain a reverted transaction
    Completed(SimulationReport),
    /// The relay could not simulate the bundle
    Error(String),
}

/// Private transaction relay accepting atomic bundles for a target block.
#[async_trait]
pub trait BundleRelay: Send + Sync {
    /// Signs `txs` with the searcher key, filling consecutive nonces
    async fn sign_bundle(&self, txs: Vec<TransactionRequest>) -> Result<SignedBundle>;

    /// Simulates `bundle` on top of the state before `block`
    async fn simulate(&self, bundle: &SignedBundle, block: u64) -> Result<Simulation>;

    /// Submits `bundle` for inclusion in `block`.
    /// Returns the bundle hash when the relay reports one.
    async fn send_raw_bundle(&self, bundle: &SignedBundle, block: u64) -> Result<Option<B256>>;
}

/// `result` member of an `eth_callBundle` response
#[derive(Debug, Deserialize)]
struct CallBundleResult {
    /// Native paid to the block producer, decimal wei
    #[serde(rename = "coinbaseDiff", default)]
    coinbase_diff: Option<String>,
    /// Gas used by the whole bundle
    #[serde(rename = "totalGasUsed", default)]
    total_gas_used: u64,
    /// Per-transaction results, in bundle order
    #[serde(default)]
    results: Vec<CallBundleTx>,
}

/// One transaction of an `eth_callBundle` result
#[derive(Debug, Deserialize)]
struct CallBundleTx {
    /// Transaction hash
    #[serde(rename = "txHash", default)]
    tx_hash: Option<String>,
    /// Execution error
    #[serde(default)]
    error: Option<String>,
    /// Decoded revert reason
    #[serde(default)]
    revert: Option<String>,
}

/// `result` member of an `eth_sendBundle` response
#[derive(Debug, Deserialize)]
struct SendBundleResult {
    /// Hash the relay tracks the bundle under
    #[serde(rename = "bundleHash", default)]
    bundle_hash: Option<B256>,
}

/// Parses an `eth_callBundle` response.
///
/// An in-band `error` member yields [`Simulation::Error`]; a transaction with an
/// `error` or `revert` member becomes the report's `first_revert`.
///
/// # Errors
///
/// Returns an error if the response has neither a result nor an error, or
/// the result is malformed.
pub fn parse_simulation(response: &Value) -> Result<Simulation> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), ToString::to_string);
        return Ok(Simulation::Error(message));
    }
    let Some(result) = response.get("result") else {
        bail!("Simulation response has no result: {response}");
    };
    let result: CallBundleResult = serde_json::from_value(result.clone())
        .wrap_err("Malformed eth_callBundle result")?;

    let coinbase_diff = match result.coinbase_diff {
        Some(diff) => diff
            .parse::<U256>()
            .wrap_err_with(|| format!("Malformed coinbaseDiff {diff}"))?,
        None => U256::ZERO,
    };
    let first_revert = result.results.into_iter().find_map(|tx| {
        let reason = tx.revert.or(tx.error)?;
        Some(format!(
            "{}: {reason}",
            tx.tx_hash.as_deref().unwrap_or("unknown")
        ))
    });

    Ok(Simulation::Completed(SimulationReport {
        coinbase_diff,
        total_gas_used: result.total_gas_used,
        first_revert,
    }))
}

/// Flashbots-compatible relay over JSON-RPC.
///
/// Requests are authenticated with the relay signing key, which is distinct
/// from the key that signs the bundle's transactions.
#[derive(Debug, Clone)]
pub struct FlashbotsRelay {
    /// Relay endpoint
    url: Url,
    /// The HTTP client
    client: Client,
    /// Key signing the request bodies
    auth_signer: PrivateKeySigner,
    /// Searcher key signing the transactions
    searcher: PrivateKeySigner,
    /// Source of the searcher's nonce
    provider: RootProvider<Ethereum>,
}

impl FlashbotsRelay {
    /// Creates a relay client for `url`
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(
        url: Url,
        auth_signer: PrivateKeySigner,
        searcher: PrivateKeySigner,
        provider: RootProvider<Ethereum>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            url,
            client,
            auth_signer,
            searcher,
            provider,
        })
    }

    /// Posts a signed JSON-RPC request and returns the raw response
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        })
        .to_string();

        let digest = keccak256(body.as_bytes()).to_string();
        let signature = self.auth_signer.sign_message(digest.as_bytes()).await?;
        let header = format!(
            "{}:0x{}",
            self.auth_signer.address(),
            hex::encode(signature.as_bytes())
        );

        let response = self
            .client
            .post(self.url.clone())
            .header("Content-Type", "application/json")
            .header("X-Flashbots-Signature", header)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let json = response.json::<Value>().await?;
        if !status.is_success() && json.get("error").is_none() {
            bail!("Relay {} answered {status}: {json}", self.url);
        }
        Ok(json)
    }
}

#[async_trait]
impl BundleRelay for FlashbotsRelay {
    async fn sign_bundle(&self, txs: Vec<TransactionRequest>) -> Result<SignedBundle> {
        let wallet = EthereumWallet::from(self.searcher.clone());
        let mut nonce = self
            .provider
            .get_transaction_count(self.searcher.address())
            .pending()
            .await?;

        let mut signed = Vec::with_capacity(txs.len());
        for tx in txs {
            let tx = tx.with_from(self.searcher.address()).with_nonce(nonce);
            let envelope = tx
                .build(&wallet)
                .await
                .map_err(|e| eyre!("Signing bundle transaction failed: {e}"))?;
            signed.push(Bytes::from(envelope.encoded_2718()));
            nonce += 1;
        }
        log::debug!("execution::relay: signed {} transactions", signed.len());
        Ok(SignedBundle { txs: signed })
    }

    async fn simulate(&self, bundle: &SignedBundle, block: u64) -> Result<Simulation> {
        let response = self
            .call(
                "eth_callBundle",
                json!([{
                    "txs": bundle.hex_txs(),
                    "blockNumber": format!("{block:#x}"),
                    "stateBlockNumber": "latest",
                }]),
            )
            .await?;
        let simulation = parse_simulation(&response)?;
        if let Simulation::Completed(report) = &simulation {
            log::debug!(
                "execution::relay: simulated for block {block}, coinbase diff {}, gas {}",
                format_ether(report.coinbase_diff),
                report.total_gas_used
            );
        }
        Ok(simulation)
    }

    async fn send_raw_bundle(&self, bundle: &SignedBundle, block: u64) -> Result<Option<B256>> {
        let response = self
            .call(
                "eth_sendBundle",
                json!([{
                    "txs": bundle.hex_txs(),
                    "blockNumber": format!("{block:#x}"),
                }]),
            )
            .await?;
        if let Some(error) = response.get("error") {
            bail!("Relay rejected bundle for block {block}: {error}");
        }
        let Some(result) = response.get("result") else {
            return Ok(None);
        };
        let result: SendBundleResult = serde_json::from_value(result.clone())
            .wrap_err("Malformed eth_sendBundle result")?;
        Ok(result.bundle_hash)
    }
}
