//! Application-call intents for the voting app.
//!
//! These describe *what* to send. Turning an [`UnsignedTransaction`] into
//! signed wire bytes is the wallet's job (see [`crate::client::WalletSigner`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of rounds a transaction stays valid after the suggested first round.
pub const VALIDITY_WINDOW: u64 = 1_000;

/// Method selector for the creator-only voter status update.
pub const METHOD_UPDATE_USER_STATUS: &[u8] = b"update_user_status";
/// Method selector for casting a vote.
pub const METHOD_VOTE: &[u8] = b"vote";

/// Transaction identifier as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the application does with the sender's local state after the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnComplete {
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
}

impl fmt::Display for OnComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "noop"),
            Self::OptIn => write!(f, "optin"),
            Self::CloseOut => write!(f, "closeout"),
            Self::ClearState => write!(f, "clearstate"),
        }
    }
}

/// Voter eligibility the creator can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusUpdate {
    Yes,
    No,
}

impl StatusUpdate {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Yes => b"yes",
            Self::No => b"no",
        }
    }
}

/// Network parameters the node suggests for new transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SuggestedParams {
    /// Per-byte fee in microalgos.
    pub fee: u64,
    pub min_fee: u64,
    pub last_round: u64,
    pub genesis_id: String,
    /// Base64 genesis hash.
    pub genesis_hash: String,
    #[serde(default)]
    pub consensus_version: String,
}

/// Storage an application reserves, counted in uint and byte-slice slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateSchema {
    pub num_uint: u64,
    pub num_byte_slice: u64,
}

impl StateSchema {
    pub fn new(num_uint: u64, num_byte_slice: u64) -> Self {
        Self {
            num_uint,
            num_byte_slice,
        }
    }
}

/// Programs and schemas attached to an application-create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCreate {
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
}

/// An application call, independent of network parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCall {
    pub sender: String,
    /// `0` when the call creates the application.
    pub app_id: u64,
    pub on_complete: OnComplete,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub app_args: Vec<Vec<u8>>,
    /// Foreign accounts the program may inspect.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<ApplicationCreate>,
}

impl ApplicationCall {
    fn bare(sender: impl Into<String>, app_id: u64, on_complete: OnComplete) -> Self {
        Self {
            sender: sender.into(),
            app_id,
            on_complete,
            app_args: vec![],
            accounts: vec![],
            create: None,
        }
    }

    /// Deploy a voting application.
    ///
    /// Creation args are `[election_end, num_vote_options, vote_options]`,
    /// with the option names joined by `,`.
    pub fn create(
        sender: impl Into<String>,
        programs: ApplicationCreate,
        election_end: u64,
        vote_options: &[String],
    ) -> Self {
        Self {
            app_args: vec![
                uint_arg(election_end),
                uint_arg(vote_options.len() as u64),
                vote_options.join(",").into_bytes(),
            ],
            create: Some(programs),
            ..Self::bare(sender, 0, OnComplete::NoOp)
        }
    }

    /// Allocate local state for `sender`.
    pub fn opt_in(sender: impl Into<String>, app_id: u64) -> Self {
        Self::bare(sender, app_id, OnComplete::OptIn)
    }

    /// Creator sets `user`'s eligibility to vote.
    pub fn update_user_status(
        creator: impl Into<String>,
        app_id: u64,
        user: impl Into<String>,
        status: StatusUpdate,
    ) -> Self {
        Self {
            app_args: vec![METHOD_UPDATE_USER_STATUS.to_vec(), status.as_bytes().to_vec()],
            accounts: vec![user.into()],
            ..Self::bare(creator, app_id, OnComplete::NoOp)
        }
    }

    /// Cast a vote for option index `choice`.
    pub fn vote(sender: impl Into<String>, app_id: u64, choice: u64) -> Self {
        Self {
            app_args: vec![METHOD_VOTE.to_vec(), uint_arg(choice)],
            ..Self::bare(sender, app_id, OnComplete::NoOp)
        }
    }

    /// Leave the application; the program may reject it.
    pub fn close_out(sender: impl Into<String>, app_id: u64) -> Self {
        Self::bare(sender, app_id, OnComplete::CloseOut)
    }

    /// Drop local state unconditionally.
    pub fn clear_state(sender: impl Into<String>, app_id: u64) -> Self {
        Self::bare(sender, app_id, OnComplete::ClearState)
    }
}

/// An application call bound to network parameters, ready for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    #[serde(flatten)]
    pub call: ApplicationCall,
    /// Flat fee in microalgos.
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: String,
}

impl UnsignedTransaction {
    pub fn new(call: ApplicationCall, params: &SuggestedParams) -> Self {
        Self {
            call,
            fee: params.min_fee,
            first_valid: params.last_round,
            last_valid: params.last_round.saturating_add(VALIDITY_WINDOW),
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash.clone(),
        }
    }
}

/// Signed transaction bytes produced by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction(pub Vec<u8>);

impl SignedTransaction {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encode a uint64 application argument (8 bytes, big-endian).
pub fn uint_arg(v: u64) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}
