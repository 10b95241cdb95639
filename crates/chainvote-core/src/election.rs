//! Election-level views over decoded application state.

use serde::{Deserialize, Serialize};

use crate::client::{AccountApplicationInfo, ApplicationInfo};
use crate::decoder::decode_all;
use crate::error::DecodeError;
use crate::state::{DecodedState, StateValue};
use crate::txn::StateSchema;

pub const KEY_CREATOR: &str = "Creator";
pub const KEY_ELECTION_END: &str = "ElectionEnd";
pub const KEY_NUM_VOTE_OPTIONS: &str = "NumVoteOptions";
pub const KEY_VOTE_OPTIONS: &str = "VoteOptions";
/// Tally keys are `VotesFor0`, `VotesFor1`, …
pub const KEY_VOTES_FOR_PREFIX: &str = "VotesFor";

pub const LOCAL_CAN_VOTE: &str = "can_vote";
pub const LOCAL_VOTED: &str = "voted";

/// Decode an application's global state and stamp the creator address.
///
/// The node reports the creator as plain text, so it is inserted as-is and
/// always replaces any `Creator` entry found in the global state.
pub fn global_state(app: &ApplicationInfo) -> Result<DecodedState, DecodeError> {
    let mut state = decode_all(app.params.global_state.as_deref())?;
    state.insert(
        KEY_CREATOR.to_string(),
        StateValue::Bytes(app.params.creator.clone()),
    );
    Ok(state)
}

/// Decode an account's local state; not opted in yields an empty mapping.
pub fn local_state(info: &AccountApplicationInfo) -> Result<DecodedState, DecodeError> {
    let entries = info
        .app_local_state
        .as_ref()
        .and_then(|ls| ls.key_value.as_deref());
    decode_all(entries)
}

/// Typed view of the election's global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionSummary {
    pub creator: Option<String>,
    /// Last round in which votes are accepted.
    pub election_end: Option<u64>,
    pub options: Vec<String>,
    /// `NumVoteOptions` as stored on chain.
    pub num_vote_options: Option<u64>,
    /// Tally per option, aligned with `options` and never longer than
    /// `NumVoteOptions`.
    pub tallies: Vec<u64>,
}

impl ElectionSummary {
    pub fn from_state(state: &DecodedState) -> Self {
        let creator = state
            .get(KEY_CREATOR)
            .and_then(StateValue::as_str)
            .map(str::to_string);
        let election_end = state.get(KEY_ELECTION_END).and_then(StateValue::as_u64);

        let options: Vec<String> = state
            .get(KEY_VOTE_OPTIONS)
            .and_then(StateValue::as_str)
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let num_vote_options = state.get(KEY_NUM_VOTE_OPTIONS).and_then(StateValue::as_u64);
        let limit = num_vote_options.unwrap_or(u64::MAX);

        // Bounded by what the state actually holds, not by NumVoteOptions.
        let present = state
            .keys()
            .filter_map(|k| k.strip_prefix(KEY_VOTES_FOR_PREFIX)?.parse::<u64>().ok())
            .filter(|&i| i < limit)
            .count() as u64;
        let len = (options.len() as u64).max(present).min(limit);

        let tallies = (0..len)
            .map(|i| {
                state
                    .get(&format!("{KEY_VOTES_FOR_PREFIX}{i}"))
                    .and_then(StateValue::as_u64)
                    .unwrap_or(0)
            })
            .collect();

        Self {
            creator,
            election_end,
            options,
            num_vote_options,
            tallies,
        }
    }

    /// Number of valid vote choices: `NumVoteOptions`, else the option count.
    pub fn num_options(&self) -> u64 {
        self.num_vote_options.unwrap_or(self.options.len() as u64)
    }

    /// Whether the election still accepts votes at `round`.
    pub fn is_open_at(&self, round: u64) -> bool {
        self.election_end.is_some_and(|end| round <= end)
    }

    /// Index and tally of the leading option; ties go to the lower index.
    pub fn leader(&self) -> Option<(usize, u64)> {
        self.tallies
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, t)| match best {
                Some((_, bt)) if bt >= t => best,
                _ => Some((i, t)),
            })
    }
}

/// Parameters for deploying a new election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDeployment {
    /// TEAL source of the approval program.
    pub approval_source: String,
    /// TEAL source of the clear-state program.
    pub clear_source: String,
    /// Voting closes this many rounds after the current round.
    pub relative_end: u64,
    pub vote_options: Vec<String>,
    /// Rounds to wait for the create transaction to confirm.
    #[serde(default = "default_confirmation_rounds")]
    pub confirmation_rounds: u64,
}

fn default_confirmation_rounds() -> u64 {
    10
}

impl ElectionDeployment {
    /// `ElectionEnd`, `NumVoteOptions` and one tally per option as uints;
    /// `Creator` and `VoteOptions` as bytes.
    pub fn global_schema(&self) -> StateSchema {
        StateSchema::new(2 + self.vote_options.len() as u64, 2)
    }

    /// `voted` as uint, `can_vote` as bytes.
    pub fn local_schema(&self) -> StateSchema {
        StateSchema::new(1, 1)
    }
}

/// Eligibility recorded in an account's `can_vote` local key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// No local state for this application.
    NotOptedIn,
    Yes,
    No,
    /// Opted in, awaiting the creator's decision.
    Maybe,
    Unknown(String),
}

impl Eligibility {
    fn parse(s: &str) -> Self {
        match s {
            "yes" => Self::Yes,
            "no" => Self::No,
            "maybe" => Self::Maybe,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Typed view of one account's local state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoterStatus {
    pub eligibility: Eligibility,
    /// Option index voted for, if any.
    pub voted: Option<u64>,
}

impl VoterStatus {
    pub fn from_state(state: &DecodedState) -> Self {
        if state.is_empty() {
            return Self {
                eligibility: Eligibility::NotOptedIn,
                voted: None,
            };
        }
        let eligibility = match state.get(LOCAL_CAN_VOTE).and_then(StateValue::as_str) {
            Some(s) => Eligibility::parse(s),
            None => Eligibility::Unknown(String::new()),
        };
        let voted = state.get(LOCAL_VOTED).and_then(StateValue::as_u64);
        Self { eligibility, voted }
    }

    pub fn can_vote(&self) -> bool {
        self.eligibility == Eligibility::Yes && self.voted.is_none()
    }
}
