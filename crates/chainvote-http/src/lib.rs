//! chainvote-http — algod REST transport for ChainVote.
//!
//! [`AlgodHttpClient`] implements [`chainvote_core::NodeClient`] against the
//! algod v2 API. Configuration lives in [`AlgodConfig`]; transient failures
//! are retried according to [`RetryConfig`].

pub mod client;
pub mod config;
pub mod retry;

pub use client::AlgodHttpClient;
pub use config::AlgodConfig;
pub use retry::{RetryConfig, RetryPolicy};
