use eyre::{eyre, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Liveness ping sent after every execution attempt
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Endpoint to ping, `None` when disabled
    url: Option<Url>,
    /// The HTTP client
    client: Client,
}

impl HealthCheck {
    /// Create a health check pinging `url`, or a no-op one when `url` is `None`
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(url: Option<Url>) -> Result<Self> {
        // Create a client with a timeout
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { url, client })
    }

    /// Ping the endpoint
    ///
    /// # Errors
    /// * If the request fails or the endpoint answers with a non-success status
    pub async fn ping(&self) -> Result<()> {
        let Some(url) = &self.url else {
            return Ok(());
        };
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(eyre!("Health check {url} answered {}", response.status()));
        }
        log::debug!("notify::healthcheck: pinged {url}");
        Ok(())
    }
}
