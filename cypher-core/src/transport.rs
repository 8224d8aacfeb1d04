// File:    transport.rs
// Author:  apezoo
// Date:    2025-09-05
//
// Description: Canonical JSON payload carrying ciphertext, wrapped key and tag.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! The wire format.
//!
//! A payload is a JSON object with three fields:
//!
//! ```json
//! {
//!   "cipher": [12, 40, 7],
//!   "enc_otp_key": "<base64>",
//!   "hmac": "<base64>"
//! }
//! ```
//!
//! Binary fields use the standard base64 alphabet with padding.

use crate::crypto::CipherSequence;
use crate::error::{CypherError, Result};
use crate::integrity::IntegrityTag;
use crate::key_wrap::WrappedKey;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize)]
struct WirePayload {
    cipher: Vec<u8>,
    enc_otp_key: String,
    hmac: String,
}

/// A serialized message, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(String);

impl Payload {
    /// The serialized JSON text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the payload, returning the JSON text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Accepts received text as a payload; it is only validated by [`deserialize`].
impl From<String> for Payload {
    fn from(json: String) -> Self {
        Self(json)
    }
}

impl From<&str> for Payload {
    fn from(json: &str) -> Self {
        Self(json.to_owned())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes the three message artifacts into a payload.
///
/// # Errors
///
/// Returns [`CypherError::MalformedPayload`] if JSON serialization fails.
pub fn serialize(
    cipher: &CipherSequence,
    wrapped_key: &WrappedKey,
    tag: &IntegrityTag,
) -> Result<Payload> {
    let wire = WirePayload {
        cipher: cipher.as_bytes().to_vec(),
        enc_otp_key: STANDARD.encode(wrapped_key.as_bytes()),
        hmac: STANDARD.encode(tag.as_bytes()),
    };
    serde_json::to_string(&wire)
        .map(Payload)
        .map_err(|e| CypherError::MalformedPayload(e.to_string()))
}

/// Parses a payload back into its three artifacts.
///
/// Ciphertext entries must be integers in `0..=255`; whether they are valid
/// symbols is left to tag verification and decryption.
///
/// # Errors
///
/// Returns [`CypherError::MalformedPayload`] on invalid JSON, missing fields,
/// non-byte ciphertext entries or invalid base64.
pub fn deserialize(payload: &Payload) -> Result<(CipherSequence, WrappedKey, IntegrityTag)> {
    let wire: WirePayload = serde_json::from_str(payload.as_str())
        .map_err(|e| CypherError::MalformedPayload(e.to_string()))?;

    let wrapped_key = STANDARD
        .decode(&wire.enc_otp_key)
        .map_err(|e| CypherError::MalformedPayload(format!("enc_otp_key: {e}")))?;
    let tag = STANDARD
        .decode(&wire.hmac)
        .map_err(|e| CypherError::MalformedPayload(format!("hmac: {e}")))?;

    Ok((
        CipherSequence::from_bytes(wire.cipher),
        WrappedKey::from_bytes(wrapped_key),
        IntegrityTag::from_bytes(tag),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn artifacts() -> (CipherSequence, WrappedKey, IntegrityTag) {
        (
            CipherSequence::from_bytes(vec![7, 4, 11, 11, 14]),
            WrappedKey::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            IntegrityTag::from_bytes(vec![1; 32]),
        )
    }

    fn assert_malformed(json: &Value) {
        let payload = Payload::from(json.to_string());
        assert!(
            matches!(deserialize(&payload), Err(CypherError::MalformedPayload(_))),
            "accepted {json}"
        );
    }

    #[test]
    fn payload_has_named_fields() {
        let (cipher, wrapped, tag) = artifacts();
        let payload = serialize(&cipher, &wrapped, &tag).unwrap();
        let value: Value = serde_json::from_str(payload.as_str()).unwrap();

        assert_eq!(value["cipher"], json!([7, 4, 11, 11, 14]));
        assert_eq!(value["enc_otp_key"], json!("3q2+7w=="));
        assert_eq!(value["hmac"].as_str().unwrap().len(), 44);
    }

    #[test]
    fn deserialize_recovers_artifacts() {
        let (cipher, wrapped, tag) = artifacts();
        let payload = serialize(&cipher, &wrapped, &tag).unwrap();
        let (c, w, t) = deserialize(&payload).unwrap();
        assert_eq!(c, cipher);
        assert_eq!(w, wrapped);
        assert_eq!(t, tag);
    }

    #[test]
    fn empty_artifacts_are_valid() {
        let payload = Payload::from(r#"{"cipher":[],"enc_otp_key":"","hmac":""}"#);
        let (c, w, t) = deserialize(&payload).unwrap();
        assert!(c.is_empty());
        assert!(w.as_bytes().is_empty());
        assert!(t.as_bytes().is_empty());
    }

    #[test]
    fn byte_sized_out_of_alphabet_entries_pass_through() {
        let payload = Payload::from(json!({"cipher": [255, 48], "enc_otp_key": "", "hmac": ""}).to_string());
        let (c, _, _) = deserialize(&payload).unwrap();
        assert_eq!(c.as_bytes(), &[255, 48]);
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert_malformed(&json!({"enc_otp_key": "", "hmac": ""}));
        assert_malformed(&json!({"cipher": [], "hmac": ""}));
        assert_malformed(&json!({"cipher": [], "enc_otp_key": ""}));
    }

    #[test]
    fn non_byte_entries_are_rejected() {
        assert_malformed(&json!({"cipher": [1, "2"], "enc_otp_key": "", "hmac": ""}));
        assert_malformed(&json!({"cipher": [1.5], "enc_otp_key": "", "hmac": ""}));
        assert_malformed(&json!({"cipher": [-1], "enc_otp_key": "", "hmac": ""}));
        assert_malformed(&json!({"cipher": [256], "enc_otp_key": "", "hmac": ""}));
        assert_malformed(&json!({"cipher": "abc", "enc_otp_key": "", "hmac": ""}));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert_malformed(&json!({"cipher": [], "enc_otp_key": "not base64!", "hmac": ""}));
        assert_malformed(&json!({"cipher": [], "enc_otp_key": "", "hmac": "%%%%"}));
    }

    #[test]
    fn garbage_is_rejected() {
        let payload = Payload::from("this is not json");
        assert!(matches!(
            deserialize(&payload),
            Err(CypherError::MalformedPayload(_))
        ));
    }
}
