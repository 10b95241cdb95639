//! Decoding of base64 / TEAL-typed state entries.
//!
//! All functions here are pure. A batch fails as a whole on the first bad
//! entry; callers aggregating several batches decide whether to skip.

use base64::prelude::*;

use crate::error::DecodeError;
use crate::state::{DecodedState, KeyValueEntry, RawTealValue, StateValue, TealValue};

/// Decode the base64 key of an entry to a string.
pub fn decode_key(entry: &KeyValueEntry) -> Result<String, DecodeError> {
    decode_text(&entry.key, "key")
}

/// Decode a TEAL value.
///
/// Byte values are base64-decoded to text; uint values are returned verbatim.
pub fn decode_value(value: &RawTealValue) -> Result<StateValue, DecodeError> {
    match TealValue::try_from(value)? {
        TealValue::Bytes(b64) => decode_text(&b64, "bytes").map(StateValue::Bytes),
        TealValue::Uint(v) => Ok(StateValue::Uint(v)),
    }
}

/// Decode every entry of a state store.
///
/// An absent or empty list yields an empty mapping.
pub fn decode_all(entries: Option<&[KeyValueEntry]>) -> Result<DecodedState, DecodeError> {
    let entries = entries.unwrap_or_default();
    let mut state = DecodedState::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let wrap = |source: DecodeError| DecodeError::Entry {
            index,
            source: Box::new(source),
        };
        let key = decode_key(entry).map_err(wrap)?;
        let value = decode_value(&entry.value).map_err(wrap)?;
        state.insert(key, value);
    }

    Ok(state)
}

// Non-UTF-8 byte values (raw addresses, hashes) are kept lossily rather
// than rejected.
fn decode_text(b64: &str, field: &'static str) -> Result<String, DecodeError> {
    let bytes = BASE64_STANDARD
        .decode(b64)
        .map_err(|e| DecodeError::InvalidBase64 {
            field,
            reason: e.to_string(),
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
