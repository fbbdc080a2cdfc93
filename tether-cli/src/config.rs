//! Configuration module
//!
//! Combines CLI arguments with the session settings read from the
//! environment. Flags win over environment variables.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tether_client::ApifyClient;
use tether_core::ProviderGateway;

/// Timeout of a single API request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// CLI configuration
#[derive(Clone)]
pub struct Config {
    /// URL of the Apify API
    pub api_url: String,

    /// Apify API token, only ever handed to the client
    token: String,

    /// Polling and inference settings for the session core
    pub session: tether_session::Config,
}

impl Config {
    pub fn load(
        api_url: String,
        token: String,
        poll_interval_ms: Option<u64>,
        overrides: &[String],
        require_schema: bool,
    ) -> Result<Self> {
        if token.trim().is_empty() {
            anyhow::bail!("API token cannot be empty");
        }

        let mut session =
            tether_session::Config::from_env().context("Invalid session environment")?;

        if let Some(ms) = poll_interval_ms {
            session = session.with_poll_interval(Duration::from_millis(ms));
        }
        for pair in overrides {
            session
                .field_overrides
                .insert_pair(pair)
                .map_err(|e| anyhow::anyhow!("Invalid --override: {}", e))?;
        }
        session.require_schema_source |= require_schema;
        session.validate()?;

        Ok(Self {
            api_url,
            token,
            session,
        })
    }

    /// Gateway to the configured provider
    pub fn gateway(&self) -> Result<Arc<dyn ProviderGateway>> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Arc::new(ApifyClient::with_client(
            self.api_url.as_str(),
            self.token.as_str(),
            http_client,
        )))
    }
}
