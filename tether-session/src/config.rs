//! Session configuration
//!
//! Defines the tunables of the session core: the polling cadence of the
//! run tracker and the schema inference policy.

use std::time::Duration;

use crate::inference::FieldOverrides;

/// Default interval between two status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Session configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed delay between status polls of a tracked run
    pub poll_interval: Duration,

    /// Field-name to forced-type table applied to example-derived schemas
    pub field_overrides: FieldOverrides,

    /// Whether a definition without any schema source is an error
    pub require_schema_source: bool,
}

impl Config {
    /// Creates a configuration with defaults
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            field_overrides: FieldOverrides::default(),
            require_schema_source: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - TETHER_POLL_INTERVAL_MS (optional, milliseconds, default: 3000)
    /// - TETHER_FIELD_OVERRIDES (optional, comma-separated `name=type` pairs
    ///   added on top of the built-in overrides)
    /// - TETHER_REQUIRE_SCHEMA (optional, `true`/`false`, default: false)
    ///
    /// A variable that is set but malformed is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let poll_interval = match var("TETHER_POLL_INTERVAL_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| anyhow::anyhow!("TETHER_POLL_INTERVAL_MS: {}: {:?}", e, value))?,
            None => DEFAULT_POLL_INTERVAL,
        };

        let mut field_overrides = FieldOverrides::default();
        if let Some(pairs) = var("TETHER_FIELD_OVERRIDES") {
            for pair in pairs.split(',').filter(|p| !p.trim().is_empty()) {
                field_overrides
                    .insert_pair(pair)
                    .map_err(|e| anyhow::anyhow!("TETHER_FIELD_OVERRIDES: {}", e))?;
            }
        }

        let require_schema_source = match var("TETHER_REQUIRE_SCHEMA") {
            Some(value) => value
                .trim()
                .parse::<bool>()
                .map_err(|e| anyhow::anyhow!("TETHER_REQUIRE_SCHEMA: {}: {:?}", e, value))?,
            None => false,
        };

        Ok(Self {
            poll_interval,
            field_overrides,
            require_schema_source,
        })
    }

    /// Replaces the poll interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
