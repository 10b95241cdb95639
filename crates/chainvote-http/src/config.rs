//! algod connection configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use chainvote_core::error::ClientError;

use crate::retry::RetryConfig;

/// Environment variable consulted for the API token when none is configured.
pub const TOKEN_ENV: &str = "ALGOD_TOKEN";

/// Connection settings for one algod node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgodConfig {
    /// Base URL, e.g. "https://testnet-api.algonode.cloud"
    #[serde(default = "default_url")]
    pub url: String,
    /// Sent as `X-Algo-API-Token`; empty for public endpoints.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_url() -> String { "http://localhost:4001".into() }
fn default_timeout_ms() -> u64 { 30_000 }

impl Default for AlgodConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: String::new(),
            timeout_ms: default_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl AlgodConfig {
    /// Config for `url` with defaults everywhere else.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Other(format!("reading {}: {e}", path.display())))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Fill an empty token from `ALGOD_TOKEN`.
    pub fn with_env_token(mut self) -> Self {
        if self.token.is_empty() {
            if let Ok(token) = std::env::var(TOKEN_ENV) {
                self.token = token;
            }
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
