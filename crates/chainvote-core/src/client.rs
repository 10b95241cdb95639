//! Collaborator traits: the node client and the wallet signer.
//!
//! Both are injected into [`crate::service::ElectionClient`] as
//! `Arc<dyn …>` handles, so tests and alternative transports plug in freely.

use async_trait::async_trait;
use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, DecodeError};
use crate::state::KeyValueEntry;
use crate::txn::{SignedTransaction, SuggestedParams, TxId, UnsignedTransaction};

/// Application record returned by `GET /v2/applications/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub id: u64,
    pub params: ApplicationParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationParams {
    /// Creator address, already in its textual form.
    pub creator: String,
    #[serde(default)]
    pub global_state: Option<Vec<KeyValueEntry>>,
}

/// Account/application record returned by `GET /v2/accounts/{addr}/applications/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccountApplicationInfo {
    /// `None` when the account has not opted in.
    #[serde(default)]
    pub app_local_state: Option<LocalState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocalState {
    pub id: u64,
    #[serde(default)]
    pub key_value: Option<Vec<KeyValueEntry>>,
}

/// Pool / confirmation info for a submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransaction {
    #[serde(default)]
    pub confirmed_round: Option<u64>,
    /// Non-empty when the pool evicted the transaction.
    #[serde(default)]
    pub pool_error: String,
    /// Set for application-create transactions.
    #[serde(default)]
    pub application_index: Option<u64>,
}

impl PendingTransaction {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.is_some_and(|r| r > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    pub last_round: u64,
}

/// TEAL compiled by `POST /v2/teal/compile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledProgram {
    /// Program address.
    pub hash: String,
    /// Base64 program bytecode.
    pub result: String,
}

impl CompiledProgram {
    pub fn bytecode(&self) -> Result<Vec<u8>, DecodeError> {
        BASE64_STANDARD
            .decode(&self.result)
            .map_err(|e| DecodeError::InvalidBase64 {
                field: "program",
                reason: e.to_string(),
            })
    }
}

/// The node API the election client needs.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn application(&self, app_id: u64) -> Result<ApplicationInfo, ClientError>;

    async fn account_application(
        &self,
        address: &str,
        app_id: u64,
    ) -> Result<AccountApplicationInfo, ClientError>;

    async fn suggested_params(&self) -> Result<SuggestedParams, ClientError>;

    /// Broadcast signed transaction bytes.
    async fn submit(&self, signed: &SignedTransaction) -> Result<TxId, ClientError>;

    async fn pending_transaction(&self, tx_id: &TxId) -> Result<PendingTransaction, ClientError>;

    async fn status(&self) -> Result<NodeStatus, ClientError>;

    /// Block until the node has seen a round after `round`.
    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, ClientError>;

    /// Assemble TEAL source into program bytecode.
    async fn compile(&self, source: &str) -> Result<CompiledProgram, ClientError>;
}

/// A wallet holding the user's keys, typically a browser extension.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Addresses the wallet exposes to this application.
    async fn accounts(&self) -> Result<Vec<String>, ClientError>;

    async fn sign(&self, txn: &UnsignedTransaction) -> Result<SignedTransaction, ClientError>;
}
