// File:    session.rs
// Author:  apezoo
// Date:    2025-09-06
//
// Description: The send and receive flows of the hybrid OTP protocol.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Sending and receiving messages.
//!
//! Both flows are stateless. [`send`] generates a fresh pad for every
//! message and discards it once the payload is built. [`receive`] checks the
//! integrity tag before any ciphertext is decrypted, and a failed check never
//! yields plaintext.

use crate::alphabet;
use crate::crypto;
use crate::error::{CypherError, Result};
use crate::integrity;
use crate::key_wrap::{self, RecipientPrivateKey, RecipientPublicKey};
use crate::pad_generator::OtpKey;
use crate::transport::{self, Payload};
use log::{debug, warn};

/// The outcome of receiving a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Received {
    /// The tag matched; holds the decrypted, normalized plaintext.
    Verified(String),
    /// The tag did not match. Nothing was decrypted.
    Rejected,
}

impl Received {
    /// Whether the integrity check passed.
    #[must_use]
    pub const fn integrity_ok(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// The plaintext, or `""` if the message was rejected.
    #[must_use]
    pub fn plaintext(&self) -> &str {
        match self {
            Self::Verified(text) => text,
            Self::Rejected => "",
        }
    }

    /// Splits into `(plaintext, integrity_ok)`.
    #[must_use]
    pub fn into_parts(self) -> (String, bool) {
        match self {
            Self::Verified(text) => (text, true),
            Self::Rejected => (String::new(), false),
        }
    }

    /// Returns the plaintext, treating a rejected message as an error.
    ///
    /// # Errors
    ///
    /// Returns [`CypherError::IntegrityCheckFailed`] if the message was rejected.
    pub fn into_verified(self) -> Result<String> {
        match self {
            Self::Verified(text) => Ok(text),
            Self::Rejected => Err(CypherError::IntegrityCheckFailed),
        }
    }
}

/// Encrypts `plaintext` for the holder of `recipient`'s private key.
///
/// The text is lower-cased and stripped of unsupported characters before
/// encryption, so the receiver gets [`alphabet::normalize`]d text.
///
/// # Errors
///
/// Returns [`CypherError::KeyTooLargeForWrap`] if the encoded message is
/// longer than [`RecipientPublicKey::max_message_len`]; other errors come from
/// the random source or the RSA layer.
pub fn send(plaintext: &str, recipient: &RecipientPublicKey) -> Result<Payload> {
    let symbols = alphabet::encode(plaintext);
    let dropped = plaintext.chars().count().saturating_sub(symbols.len());
    if dropped > 0 {
        debug!("Dropped {dropped} unsupported character(s) while encoding.");
    }

    let max_len = key_wrap::max_wrap_len(recipient);
    if symbols.len() > max_len {
        return Err(CypherError::KeyTooLargeForWrap {
            key_len: symbols.len(),
            max_len,
        });
    }

    let key = OtpKey::generate(symbols.len())?;
    let cipher = crypto::encrypt(&symbols, &key)?;
    let key = key.truncate(cipher.len());

    let wrapped_key = key_wrap::wrap(&key, recipient)?;
    let tag = integrity::tag(&key, &cipher)?;
    drop(key);

    debug!(
        "Sealed {} symbols ({} byte wrapped key).",
        cipher.len(),
        wrapped_key.as_bytes().len()
    );
    transport::serialize(&cipher, &wrapped_key, &tag)
}

/// Verifies and decrypts a payload with the recipient's private key.
///
/// A tag mismatch is reported as [`Received::Rejected`], not as an error.
///
/// # Errors
///
/// Returns [`CypherError::MalformedPayload`] if the payload cannot be parsed,
/// [`CypherError::UnwrapFailed`] if the pad key cannot be recovered, and
/// [`CypherError::KeyTooShort`] if an authenticated payload carries a pad
/// shorter than its ciphertext.
pub fn receive(payload: &Payload, recipient: &RecipientPrivateKey) -> Result<Received> {
    let (cipher, wrapped_key, tag) = transport::deserialize(payload)?;
    let key = key_wrap::unwrap(&wrapped_key, recipient)?;

    if !integrity::verify(&key, &cipher, &tag) {
        warn!(
            "Integrity check failed for a {} symbol message; discarding it.",
            cipher.len()
        );
        return Ok(Received::Rejected);
    }

    let symbols = crypto::decrypt(&cipher, &key)?;
    debug!("Opened {} symbols.", symbols.len());
    Ok(Received::Verified(alphabet::decode(&symbols)))
}
