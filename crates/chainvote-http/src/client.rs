//! algod v2 REST client backed by `reqwest`.
//!
//! GET requests are retried with exponential backoff on transient errors.
//! Transaction submission and TEAL compilation are sent once; a resend after
//! an ambiguous failure is left to the caller.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use chainvote_core::client::{
    AccountApplicationInfo, ApplicationInfo, CompiledProgram, NodeClient, NodeStatus,
    PendingTransaction,
};
use chainvote_core::error::ClientError;
use chainvote_core::txn::{SignedTransaction, SuggestedParams, TxId};

use crate::config::AlgodConfig;
use crate::retry::RetryPolicy;

/// Header carrying the algod API token.
pub const TOKEN_HEADER: &str = "X-Algo-API-Token";

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: TxId,
}

/// HTTP client for one algod node.
pub struct AlgodHttpClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    timeout: Duration,
}

impl AlgodHttpClient {
    pub fn new(config: AlgodConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            http,
            retry: RetryPolicy::new(config.retry.clone()),
            timeout: config.timeout(),
        })
    }

    /// Client with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(AlgodConfig::for_url(url))
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn map_reqwest(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }
        } else {
            ClientError::Http(e.to_string())
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        what: &str,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                what: what.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await.map_err(|e| self.map_reqwest(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(self.endpoint(path))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;
        self.read_json(resp, what).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, ClientError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.get_once(path, what).await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() => match self.retry.next_delay(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            path,
                            "retrying algod request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(attempt, error = %e, path, "max retries exceeded");
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl NodeClient for AlgodHttpClient {
    async fn application(&self, app_id: u64) -> Result<ApplicationInfo, ClientError> {
        self.get_json(&format!("/v2/applications/{app_id}"), &format!("application {app_id}"))
            .await
    }

    async fn account_application(
        &self,
        address: &str,
        app_id: u64,
    ) -> Result<AccountApplicationInfo, ClientError> {
        let path = format!("/v2/accounts/{address}/applications/{app_id}");
        match self.get_json(&path, address).await {
            // algod answers 404 when the account never opted in.
            Err(ClientError::NotFound { .. }) => Ok(AccountApplicationInfo::default()),
            other => other,
        }
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, ClientError> {
        self.get_json("/v2/transactions/params", "transaction params")
            .await
    }

    async fn submit(&self, signed: &SignedTransaction) -> Result<TxId, ClientError> {
        let resp = self
            .http
            .post(self.endpoint("/v2/transactions"))
            .header(TOKEN_HEADER, &self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(signed.as_bytes().to_vec())
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;
        let submitted: SubmitResponse = self.read_json(resp, "transactions endpoint").await?;
        tracing::debug!(tx_id = %submitted.tx_id, bytes = signed.as_bytes().len(), "transaction accepted by node");
        Ok(submitted.tx_id)
    }

    async fn pending_transaction(&self, tx_id: &TxId) -> Result<PendingTransaction, ClientError> {
        self.get_json(
            &format!("/v2/transactions/pending/{tx_id}"),
            &format!("pending transaction {tx_id}"),
        )
        .await
    }

    async fn status(&self) -> Result<NodeStatus, ClientError> {
        self.get_json("/v2/status", "node status").await
    }

    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, ClientError> {
        self.get_json(
            &format!("/v2/status/wait-for-block-after/{round}"),
            "node status",
        )
        .await
    }

    async fn compile(&self, source: &str) -> Result<CompiledProgram, ClientError> {
        let resp = self
            .http
            .post(self.endpoint("/v2/teal/compile"))
            .header(TOKEN_HEADER, &self.token)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(source.to_string())
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;
        let compiled: CompiledProgram = self.read_json(resp, "compile endpoint").await?;
        tracing::debug!(hash = %compiled.hash, "program compiled");
        Ok(compiled)
    }
}
