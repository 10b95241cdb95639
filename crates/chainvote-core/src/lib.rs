//! chainvote-core — state decoding and client plumbing for the voting app.
//!
//! # Overview
//!
//! The voting application keeps its data in on-chain key/value stores.
//! Nodes return those stores as base64 keys paired with TEAL-typed values
//! (bytes or uint). This crate defines:
//!
//! - [`decoder`] — the pure `KeyValueEntry` → [`DecodedState`] transformation
//! - [`state`] — wire types and the validated [`TealValue`] sum type
//! - [`election`] — global-state assembly and typed election / voter views
//! - [`txn`] — application-call intents for deployment and the voting flows
//! - [`client`] — the [`NodeClient`] and [`WalletSigner`] collaborator traits
//! - [`service`] — [`ElectionClient`], which wires the pieces together

pub mod client;
pub mod decoder;
pub mod election;
pub mod error;
pub mod service;
pub mod state;
pub mod txn;

pub use client::{CompiledProgram, NodeClient, WalletSigner};
pub use decoder::{decode_all, decode_key, decode_value};
pub use election::{ElectionDeployment, Eligibility, ElectionSummary, VoterStatus};
pub use error::{ClientError, DecodeError, ElectionError};
pub use service::ElectionClient;
pub use state::{DecodedState, KeyValueEntry, RawTealValue, StateValue, TealValue};
pub use txn::{
    ApplicationCall, ApplicationCreate, OnComplete, SignedTransaction, StateSchema, StatusUpdate,
    SuggestedParams, TxId, UnsignedTransaction,
};
