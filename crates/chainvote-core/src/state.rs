//! Application state wire types.
//!
//! Nodes report a state store as a list of [`KeyValueEntry`] items. Keys are
//! base64; values are a `type`-tagged pair of `bytes` / `uint` fields where
//! only the field selected by the tag is meaningful. [`TealValue`] is the
//! validated form of that pair.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::DecodeError;

/// TEAL type tag for byte-slice values.
pub const TEAL_BYTES: u64 = 1;
/// TEAL type tag for uint64 values.
pub const TEAL_UINT: u64 = 2;

/// One key/value pair of a global or local state store, as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueEntry {
    /// Base64-encoded key.
    pub key: String,
    pub value: RawTealValue,
}

/// A TEAL value exactly as it appears on the wire.
///
/// algod omits zero-valued fields, so both `bytes` and `uint` default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTealValue {
    #[serde(rename = "type")]
    pub value_type: u64,
    #[serde(default)]
    pub bytes: String,
    #[serde(default)]
    pub uint: u64,
}

impl RawTealValue {
    pub fn bytes(b64: impl Into<String>) -> Self {
        Self {
            value_type: TEAL_BYTES,
            bytes: b64.into(),
            uint: 0,
        }
    }

    pub fn uint(v: u64) -> Self {
        Self {
            value_type: TEAL_UINT,
            bytes: String::new(),
            uint: v,
        }
    }
}

/// A validated TEAL value: the active field only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TealValue {
    /// Base64-encoded byte slice, not yet decoded.
    Bytes(String),
    Uint(u64),
}

impl TryFrom<&RawTealValue> for TealValue {
    type Error = DecodeError;

    fn try_from(raw: &RawTealValue) -> Result<Self, Self::Error> {
        match raw.value_type {
            TEAL_BYTES => Ok(TealValue::Bytes(raw.bytes.clone())),
            TEAL_UINT => Ok(TealValue::Uint(raw.uint)),
            tag => Err(DecodeError::UnknownValueType { tag }),
        }
    }
}

/// A decoded state value.
///
/// Serializes untagged so a [`DecodedState`] renders as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Uint(u64),
    Bytes(String),
}

impl StateValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::Bytes(s) => Some(s.as_str()),
            StateValue::Uint(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            StateValue::Uint(v) => Some(*v),
            StateValue::Bytes(_) => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Uint(v) => write!(f, "{v}"),
            StateValue::Bytes(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Bytes(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::Bytes(s)
    }
}

impl From<u64> for StateValue {
    fn from(v: u64) -> Self {
        StateValue::Uint(v)
    }
}

/// Decoded key → value mapping for one state store.
pub type DecodedState = HashMap<String, StateValue>;
