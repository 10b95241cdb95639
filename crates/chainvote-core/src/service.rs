//! `ElectionClient` — reads election state and drives the voting flows.
//!
//! Every transaction flow is the same sequence: suggested params → intent →
//! wallet signature → broadcast. State reads decode node responses through
//! [`crate::decoder`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::client::{NodeClient, PendingTransaction, WalletSigner};
use crate::election::{self, ElectionDeployment, ElectionSummary};
use crate::error::ElectionError;
use crate::state::DecodedState;
use crate::txn::{ApplicationCall, ApplicationCreate, StatusUpdate, TxId, UnsignedTransaction};

/// Client for one deployed voting application.
#[derive(Clone)]
pub struct ElectionClient {
    app_id: u64,
    node: Arc<dyn NodeClient>,
    wallet: Option<Arc<dyn WalletSigner>>,
}

impl ElectionClient {
    /// Read-only client; attach a wallet with [`Self::with_wallet`] to send transactions.
    pub fn new(app_id: u64, node: Arc<dyn NodeClient>) -> Self {
        Self {
            app_id,
            node,
            wallet: None,
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletSigner>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Deploy a new election from `sender` and return a client bound to it.
    ///
    /// Both programs are compiled by the node; voting closes
    /// `deployment.relative_end` rounds after the node's current round.
    pub async fn create_election(
        node: Arc<dyn NodeClient>,
        wallet: Arc<dyn WalletSigner>,
        sender: &str,
        deployment: &ElectionDeployment,
    ) -> Result<Self, ElectionError> {
        let approval = node.compile(&deployment.approval_source).await?;
        let clear = node.compile(&deployment.clear_source).await?;
        let programs = ApplicationCreate {
            approval_program: approval.bytecode()?,
            clear_program: clear.bytecode()?,
            global_schema: deployment.global_schema(),
            local_schema: deployment.local_schema(),
        };

        let last_round = node.status().await?.last_round;
        let election_end = last_round.saturating_add(deployment.relative_end);

        let deployer = Self::new(0, node).with_wallet(wallet);
        let call = ApplicationCall::create(sender, programs, election_end, &deployment.vote_options);
        let tx_id = deployer.send(call).await?;
        let pending = deployer
            .wait_for_confirmation(&tx_id, deployment.confirmation_rounds)
            .await?;

        let app_id = pending
            .application_index
            .ok_or_else(|| ElectionError::NoApplicationIndex {
                tx_id: tx_id.to_string(),
            })?;
        tracing::info!(app_id, election_end, %tx_id, "created election");
        Ok(Self { app_id, ..deployer })
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    fn wallet(&self) -> Result<&Arc<dyn WalletSigner>, ElectionError> {
        self.wallet.as_ref().ok_or(ElectionError::NoWallet)
    }

    // ─── State reads ─────────────────────────────────────────────────────────

    /// Decoded global state with `Creator` set to the application creator.
    pub async fn election_state(&self) -> Result<DecodedState, ElectionError> {
        tracing::debug!(app_id = self.app_id, "fetching global state");
        let app = self.node.application(self.app_id).await?;
        Ok(election::global_state(&app)?)
    }

    pub async fn election_summary(&self) -> Result<ElectionSummary, ElectionError> {
        let state = self.election_state().await?;
        Ok(ElectionSummary::from_state(&state))
    }

    /// Decoded local state of one account; empty if it has not opted in.
    pub async fn account_local_state(&self, address: &str) -> Result<DecodedState, ElectionError> {
        tracing::debug!(app_id = self.app_id, address, "fetching local state");
        let info = self.node.account_application(address, self.app_id).await?;
        Ok(election::local_state(&info)?)
    }

    /// Local state for each address, fetched concurrently.
    ///
    /// An account whose fetch or decode fails is logged and left out; the
    /// remaining accounts are still returned.
    pub async fn local_states(&self, addresses: &[String]) -> HashMap<String, DecodedState> {
        let fetches = addresses.iter().map(|addr| async move {
            (addr, self.account_local_state(addr).await)
        });

        let mut states = HashMap::with_capacity(addresses.len());
        for (addr, result) in join_all(fetches).await {
            match result {
                Ok(state) => {
                    states.insert(addr.clone(), state);
                }
                Err(e) => {
                    tracing::warn!(
                        app_id = self.app_id,
                        address = %addr,
                        error = %e,
                        "skipping account: local state unavailable"
                    );
                }
            }
        }
        states
    }

    /// Local state for every account the wallet exposes.
    pub async fn wallet_local_states(&self) -> Result<HashMap<String, DecodedState>, ElectionError> {
        let accounts = self.wallet()?.accounts().await?;
        Ok(self.local_states(&accounts).await)
    }

    /// First account exposed by the wallet.
    pub async fn default_sender(&self) -> Result<String, ElectionError> {
        self.wallet()?
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(ElectionError::NoAccounts)
    }

    // ─── Transactions ────────────────────────────────────────────────────────

    pub async fn opt_in(&self, sender: &str) -> Result<TxId, ElectionError> {
        self.send(ApplicationCall::opt_in(sender, self.app_id)).await
    }

    /// Creator-only: approve or reject `user` as a voter.
    pub async fn update_user_status(
        &self,
        creator: &str,
        user: &str,
        status: StatusUpdate,
    ) -> Result<TxId, ElectionError> {
        self.send(ApplicationCall::update_user_status(
            creator,
            self.app_id,
            user,
            status,
        ))
        .await
    }

    /// Vote for option `choice`, checked against the current option count.
    pub async fn vote(&self, sender: &str, choice: u64) -> Result<TxId, ElectionError> {
        let options = self.election_summary().await?.num_options();
        if choice >= options {
            return Err(ElectionError::InvalidChoice { choice, options });
        }
        self.send(ApplicationCall::vote(sender, self.app_id, choice))
            .await
    }

    pub async fn close_out(&self, sender: &str) -> Result<TxId, ElectionError> {
        self.send(ApplicationCall::close_out(sender, self.app_id))
            .await
    }

    pub async fn clear_state(&self, sender: &str) -> Result<TxId, ElectionError> {
        self.send(ApplicationCall::clear_state(sender, self.app_id))
            .await
    }

    async fn send(&self, call: ApplicationCall) -> Result<TxId, ElectionError> {
        let wallet = self.wallet()?;
        let params = self.node.suggested_params().await?;
        let on_complete = call.on_complete;
        let txn = UnsignedTransaction::new(call, &params);

        let signed = wallet.sign(&txn).await?;
        let tx_id = self.node.submit(&signed).await?;

        tracing::info!(
            app_id = self.app_id,
            sender = %txn.call.sender,
            %on_complete,
            %tx_id,
            "submitted application call"
        );
        Ok(tx_id)
    }

    /// Poll until `tx_id` is confirmed, giving up after `max_rounds` rounds.
    pub async fn wait_for_confirmation(
        &self,
        tx_id: &TxId,
        max_rounds: u64,
    ) -> Result<PendingTransaction, ElectionError> {
        let start = self.node.status().await?.last_round;
        let mut round = start;

        loop {
            let pending = self.node.pending_transaction(tx_id).await?;
            if pending.is_confirmed() {
                tracing::info!(%tx_id, round = pending.confirmed_round, "transaction confirmed");
                return Ok(pending);
            }
            if !pending.pool_error.is_empty() {
                return Err(ElectionError::PoolRejected {
                    tx_id: tx_id.to_string(),
                    reason: pending.pool_error,
                });
            }
            if round >= start.saturating_add(max_rounds) {
                return Err(ElectionError::ConfirmationTimeout {
                    tx_id: tx_id.to_string(),
                    rounds: max_rounds,
                });
            }
            round = self.node.status_after_block(round).await?.last_round;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        AccountApplicationInfo, ApplicationInfo, ApplicationParams, CompiledProgram, LocalState,
        NodeStatus,
    };
    use crate::error::ClientError;
    use crate::state::{KeyValueEntry, RawTealValue, StateValue};
    use crate::txn::{OnComplete, SignedTransaction, SuggestedParams};
    use async_trait::async_trait;
    use base64::prelude::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const CREATOR: &str = "CREATORADDR";

    fn entry(key: &str, value: RawTealValue) -> KeyValueEntry {
        KeyValueEntry {
            key: BASE64_STANDARD.encode(key),
            value,
        }
    }

    fn bytes(s: &str) -> RawTealValue {
        RawTealValue::bytes(BASE64_STANDARD.encode(s))
    }

    #[derive(Default)]
    struct MockNode {
        global: Vec<KeyValueEntry>,
        /// `None` simulates a failed fetch for that account.
        locals: HashMap<String, Option<AccountApplicationInfo>>,
        submitted: Mutex<Vec<UnsignedTransaction>>,
        pending: Mutex<VecDeque<PendingTransaction>>,
        round: Mutex<u64>,
        compiled: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NodeClient for MockNode {
        async fn application(&self, app_id: u64) -> Result<ApplicationInfo, ClientError> {
            Ok(ApplicationInfo {
                id: app_id,
                params: ApplicationParams {
                    creator: CREATOR.into(),
                    global_state: Some(self.global.clone()),
                },
            })
        }

        async fn account_application(
            &self,
            address: &str,
            _app_id: u64,
        ) -> Result<AccountApplicationInfo, ClientError> {
            match self.locals.get(address) {
                Some(Some(info)) => Ok(info.clone()),
                Some(None) => Err(ClientError::Http("connection reset".into())),
                None => Err(ClientError::NotFound {
                    what: address.to_string(),
                }),
            }
        }

        async fn suggested_params(&self) -> Result<SuggestedParams, ClientError> {
            Ok(SuggestedParams {
                fee: 0,
                min_fee: 1_000,
                last_round: 100,
                genesis_id: "testnet-v1.0".into(),
                genesis_hash: "hash".into(),
                consensus_version: String::new(),
            })
        }

        async fn submit(&self, signed: &SignedTransaction) -> Result<TxId, ClientError> {
            let txn: UnsignedTransaction = serde_json::from_slice(signed.as_bytes())?;
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(txn);
            Ok(TxId(format!("TX{}", submitted.len())))
        }

        async fn pending_transaction(
            &self,
            _tx_id: &TxId,
        ) -> Result<PendingTransaction, ClientError> {
            Ok(self.pending.lock().unwrap().pop_front().unwrap_or_default())
        }

        async fn status(&self) -> Result<NodeStatus, ClientError> {
            Ok(NodeStatus {
                last_round: *self.round.lock().unwrap(),
            })
        }

        async fn status_after_block(&self, round: u64) -> Result<NodeStatus, ClientError> {
            let mut r = self.round.lock().unwrap();
            *r = round + 1;
            Ok(NodeStatus { last_round: *r })
        }

        async fn compile(&self, source: &str) -> Result<CompiledProgram, ClientError> {
            let mut compiled = self.compiled.lock().unwrap();
            compiled.push(source.to_string());
            Ok(CompiledProgram {
                hash: format!("HASH{}", compiled.len()),
                result: BASE64_STANDARD.encode([5, compiled.len() as u8]),
            })
        }
    }

    struct MockWallet {
        accounts: Vec<String>,
        reject: bool,
    }

    #[async_trait]
    impl WalletSigner for MockWallet {
        async fn accounts(&self) -> Result<Vec<String>, ClientError> {
            Ok(self.accounts.clone())
        }

        async fn sign(&self, txn: &UnsignedTransaction) -> Result<SignedTransaction, ClientError> {
            if self.reject {
                return Err(ClientError::Rejected("user cancelled".into()));
            }
            Ok(SignedTransaction(serde_json::to_vec(txn)?))
        }
    }

    fn opted_in(can_vote: &str) -> Option<AccountApplicationInfo> {
        Some(AccountApplicationInfo {
            app_local_state: Some(LocalState {
                id: 7,
                key_value: Some(vec![entry("can_vote", bytes(can_vote))]),
            }),
        })
    }

    fn election_node() -> MockNode {
        MockNode {
            global: vec![
                entry("Creator", bytes("STALE")),
                entry("NumVoteOptions", RawTealValue::uint(2)),
                entry("VoteOptions", bytes("yes,no")),
                entry("VotesFor0", RawTealValue::uint(3)),
            ],
            ..Default::default()
        }
    }

    fn client(node: Arc<MockNode>, accounts: &[&str]) -> ElectionClient {
        let wallet = MockWallet {
            accounts: accounts.iter().map(|a| a.to_string()).collect(),
            reject: false,
        };
        ElectionClient::new(7, node).with_wallet(Arc::new(wallet))
    }

    #[tokio::test]
    async fn election_state_overrides_creator() {
        let node = Arc::new(election_node());
        let state = client(node, &[]).election_state().await.unwrap();
        assert_eq!(state["Creator"], StateValue::Bytes(CREATOR.into()));
        assert_eq!(state["NumVoteOptions"], StateValue::Uint(2));
    }

    #[tokio::test]
    async fn aggregation_skips_failed_account() {
        let mut node = election_node();
        node.locals.insert("GOOD".into(), opted_in("yes"));
        node.locals.insert("BAD".into(), None);
        let c = client(Arc::new(node), &["GOOD", "BAD"]);

        let states = c.wallet_local_states().await.unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states["GOOD"]["can_vote"], StateValue::Bytes("yes".into()));
        assert!(!states.contains_key("BAD"));
    }

    #[tokio::test]
    async fn aggregation_skips_undecodable_account() {
        let mut node = election_node();
        node.locals.insert("GOOD".into(), opted_in("maybe"));
        node.locals.insert(
            "CORRUPT".into(),
            Some(AccountApplicationInfo {
                app_local_state: Some(LocalState {
                    id: 7,
                    key_value: Some(vec![KeyValueEntry {
                        key: "!!".into(),
                        value: RawTealValue::uint(1),
                    }]),
                }),
            }),
        );
        let c = client(Arc::new(node), &[]);
        let states = c
            .local_states(&["GOOD".to_string(), "CORRUPT".to_string()])
            .await;
        assert_eq!(states.keys().collect::<Vec<_>>(), vec!["GOOD"]);
    }

    #[tokio::test]
    async fn vote_builds_noop_call() {
        let node = Arc::new(election_node());
        let c = client(node.clone(), &["VOTER"]);

        let tx_id = c.vote("VOTER", 1).await.unwrap();
        assert_eq!(tx_id, TxId("TX1".into()));

        let submitted = node.submitted.lock().unwrap();
        let txn = &submitted[0];
        assert_eq!(txn.call.on_complete, OnComplete::NoOp);
        assert_eq!(txn.call.app_args[0], b"vote".to_vec());
        assert_eq!(txn.call.app_args[1], 1u64.to_be_bytes().to_vec());
        assert_eq!(txn.first_valid, 100);
    }

    #[tokio::test]
    async fn vote_rejects_out_of_range_choice() {
        let node = Arc::new(election_node());
        let c = client(node.clone(), &["VOTER"]);
        let err = c.vote("VOTER", 2).await.unwrap_err();
        assert!(matches!(
            err,
            ElectionError::InvalidChoice { choice: 2, options: 2 }
        ));
        assert!(node.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lifecycle_calls_use_expected_on_complete() {
        let node = Arc::new(election_node());
        let c = client(node.clone(), &["VOTER"]);
        c.opt_in("VOTER").await.unwrap();
        c.update_user_status(CREATOR, "VOTER", StatusUpdate::Yes)
            .await
            .unwrap();
        c.close_out("VOTER").await.unwrap();
        c.clear_state("VOTER").await.unwrap();

        let kinds: Vec<_> = node
            .submitted
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.call.on_complete)
            .collect();
        assert_eq!(
            kinds,
            vec![
                OnComplete::OptIn,
                OnComplete::NoOp,
                OnComplete::CloseOut,
                OnComplete::ClearState
            ]
        );
    }

    #[tokio::test]
    async fn transactions_require_wallet() {
        let c = ElectionClient::new(7, Arc::new(election_node()));
        assert!(matches!(
            c.opt_in("VOTER").await,
            Err(ElectionError::NoWallet)
        ));
        assert!(matches!(
            c.default_sender().await,
            Err(ElectionError::NoWallet)
        ));
    }

    #[tokio::test]
    async fn rejected_signature_propagates() {
        let wallet = MockWallet {
            accounts: vec!["VOTER".into()],
            reject: true,
        };
        let node = Arc::new(election_node());
        let c = ElectionClient::new(7, node.clone()).with_wallet(Arc::new(wallet));
        assert!(matches!(
            c.opt_in("VOTER").await,
            Err(ElectionError::Client(ClientError::Rejected(_)))
        ));
        assert!(node.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn default_sender_empty_wallet() {
        let c = client(Arc::new(election_node()), &[]);
        assert!(matches!(
            c.default_sender().await,
            Err(ElectionError::NoAccounts)
        ));
    }

    #[tokio::test]
    async fn wait_for_confirmation_polls_rounds() {
        let node = election_node();
        node.pending.lock().unwrap().extend([
            PendingTransaction::default(),
            PendingTransaction {
                confirmed_round: Some(12),
                ..Default::default()
            },
        ]);
        *node.round.lock().unwrap() = 10;
        let c = client(Arc::new(node), &[]);

        let pending = c
            .wait_for_confirmation(&TxId("TX1".into()), 5)
            .await
            .unwrap();
        assert_eq!(pending.confirmed_round, Some(12));
    }

    #[tokio::test]
    async fn wait_for_confirmation_unbounded_rounds() {
        let node = election_node();
        node.pending.lock().unwrap().extend([
            PendingTransaction::default(),
            PendingTransaction {
                confirmed_round: Some(11),
                ..Default::default()
            },
        ]);
        *node.round.lock().unwrap() = 10;
        let c = client(Arc::new(node), &[]);

        let pending = c
            .wait_for_confirmation(&TxId("TX1".into()), u64::MAX)
            .await
            .unwrap();
        assert_eq!(pending.confirmed_round, Some(11));
    }

    fn deployment() -> ElectionDeployment {
        ElectionDeployment {
            approval_source: "#pragma version 5\nint 1".into(),
            clear_source: "#pragma version 5\nint 1".into(),
            relative_end: 1_000,
            vote_options: vec!["Alice".into(), "Bob".into()],
            confirmation_rounds: 5,
        }
    }

    fn creator_wallet() -> Arc<dyn WalletSigner> {
        Arc::new(MockWallet {
            accounts: vec![CREATOR.into()],
            reject: false,
        })
    }

    #[tokio::test]
    async fn create_election_deploys_and_binds_app_id() {
        let node = election_node();
        *node.round.lock().unwrap() = 40;
        node.pending.lock().unwrap().push_back(PendingTransaction {
            confirmed_round: Some(41),
            application_index: Some(555),
            ..Default::default()
        });
        let node = Arc::new(node);

        let c = ElectionClient::create_election(node.clone(), creator_wallet(), CREATOR, &deployment())
            .await
            .unwrap();
        assert_eq!(c.app_id(), 555);
        assert_eq!(node.compiled.lock().unwrap().len(), 2);

        let submitted = node.submitted.lock().unwrap();
        let call = &submitted[0].call;
        assert_eq!(call.app_id, 0);
        assert_eq!(call.sender, CREATOR);
        assert_eq!(call.app_args[0], 1_040u64.to_be_bytes().to_vec());
        assert_eq!(call.app_args[1], 2u64.to_be_bytes().to_vec());
        assert_eq!(call.app_args[2], b"Alice,Bob".to_vec());

        let programs = call.create.as_ref().unwrap();
        assert_eq!(programs.approval_program, vec![5, 1]);
        assert_eq!(programs.clear_program, vec![5, 2]);
        assert_eq!(programs.global_schema.num_uint, 4);
    }

    #[tokio::test]
    async fn create_election_without_application_index() {
        let node = election_node();
        node.pending.lock().unwrap().push_back(PendingTransaction {
            confirmed_round: Some(3),
            ..Default::default()
        });
        let err = ElectionClient::create_election(
            Arc::new(node),
            creator_wallet(),
            CREATOR,
            &deployment(),
        )
        .await
        .err().unwrap();
        assert!(matches!(err, ElectionError::NoApplicationIndex { .. }));
    }

    #[tokio::test]
    async fn vote_checks_stored_option_count() {
        let node = MockNode {
            global: vec![
                entry("NumVoteOptions", RawTealValue::uint(u64::MAX)),
                entry("VoteOptions", bytes("yes,no")),
            ],
            ..Default::default()
        };
        let c = client(Arc::new(node), &["VOTER"]);
        assert!(c.vote("VOTER", 5).await.is_ok());
    }

    #[tokio::test]
    async fn wait_for_confirmation_times_out() {
        let node = election_node();
        *node.round.lock().unwrap() = 10;
        let c = client(Arc::new(node), &[]);
        let err = c
            .wait_for_confirmation(&TxId("TX1".into()), 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ElectionError::ConfirmationTimeout { rounds: 3, .. }
        ));
    }

    #[tokio::test]
    async fn wait_for_confirmation_pool_error() {
        let node = election_node();
        node.pending.lock().unwrap().push_back(PendingTransaction {
            pool_error: "overspend".into(),
            ..Default::default()
        });
        let c = client(Arc::new(node), &[]);
        let err = c
            .wait_for_confirmation(&TxId("TX1".into()), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ElectionError::PoolRejected { .. }));
    }
}
