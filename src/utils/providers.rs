use alloy::network::Ethereum;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use eyre::{eyre, Result};
use url::Url;

/// Creates a new HTTP provider for Ethereum network communication
///
/// # Returns
/// The root provider, without fillers; transactions are filled by the caller
#[must_use]
pub fn create_http_provider(rpc_url: Url) -> RootProvider<Ethereum> {
    let provider = ProviderBuilder::new().on_http(rpc_url);
    (*provider.root()).clone()
}

/// Parses a hex private key, with or without `0x`
///
/// # Errors
/// * If the key is not a valid secp256k1 private key; `name` identifies it
pub fn parse_signer(key: &str, name: &str) -> Result<PrivateKeySigner> {
    key.trim()
        .parse::<PrivateKeySigner>()
        .map_err(|_| eyre!("{name} is not a valid private key"))
}
