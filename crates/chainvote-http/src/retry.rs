//! Exponential backoff for transient algod failures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry settings, loadable from the client config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Caps exponential growth.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_retries() -> u32 { 3 }
fn default_initial_backoff_ms() -> u64 { 100 }
fn default_max_backoff_ms() -> u64 { 5_000 }
fn default_multiplier() -> f64 { 2.0 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Stateless policy — computes the delay before a given retry.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before the `attempt`-th retry (1-based), or `None` once
    /// `max_retries` is exhausted.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.config.max_retries {
            return None;
        }
        let base_ms = self.config.initial_backoff_ms as f64
            * self.config.multiplier.powi((attempt - 1) as i32);
        let capped = base_ms.min(self.config.max_backoff_ms as f64);
        Some(Duration::from_millis(capped as u64))
    }
}
