//! Error types for decoding, node/wallet access and the election flows.

use thiserror::Error;

/// Errors that can occur while decoding application state.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid base64 in {field}: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },

    #[error("Unknown TEAL value type {tag} (expected 1 = bytes or 2 = uint)")]
    UnknownValueType { tag: u64 },

    #[error("Decode error at entry {index}: {source}")]
    Entry {
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },
}

/// Errors raised by the node client or wallet signer collaborators.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, reset, TLS failure, etc.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The node answered with a non-success status.
    #[error("Node returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The wallet could not be reached or failed to sign.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// The user declined the signing request.
    #[error("Signing rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Returns `true` if the error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors surfaced by [`crate::service::ElectionClient`].
#[derive(Debug, Error)]
pub enum ElectionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("No wallet signer configured")]
    NoWallet,

    #[error("Wallet exposes no accounts")]
    NoAccounts,

    #[error("Invalid vote choice {choice}: election has {options} options")]
    InvalidChoice { choice: u64, options: u64 },

    #[error("Transaction {tx_id} not confirmed after {rounds} rounds")]
    ConfirmationTimeout { tx_id: String, rounds: u64 },

    #[error("Transaction {tx_id} rejected by the pool: {reason}")]
    PoolRejected { tx_id: String, reason: String },

    #[error("Create transaction {tx_id} confirmed without an application index")]
    NoApplicationIndex { tx_id: String },
}
