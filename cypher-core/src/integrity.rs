// File:    integrity.rs
// Author:  apezoo
// Date:    2025-09-04
//
// Description: HMAC-SHA-256 tags over ciphertext, keyed by the one-time pad.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::crypto::CipherSequence;
use crate::error::{CypherError, Result};
use crate::pad_generator::OtpKey;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of an integrity tag in bytes.
pub const TAG_SIZE: usize = 32;

/// An authentication tag over a ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityTag(Vec<u8>);

impl IntegrityTag {
    /// Wraps opaque tag bytes as received from the transport.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw tag.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

fn keyed_mac(key: &OtpKey, cipher: &CipherSequence) -> Result<HmacSha256> {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| CypherError::Mac(e.to_string()))?;
    mac.update(cipher.as_bytes());
    Ok(mac)
}

/// Computes the tag for `cipher`, keyed by the raw bytes of the pad it was encrypted under.
///
/// # Errors
///
/// Returns [`CypherError::Mac`] if the MAC cannot be keyed.
pub fn tag(key: &OtpKey, cipher: &CipherSequence) -> Result<IntegrityTag> {
    let mac = keyed_mac(key, cipher)?;
    Ok(IntegrityTag(mac.finalize().into_bytes().to_vec()))
}

/// Checks `tag` against `cipher` in constant time.
#[must_use]
pub fn verify(key: &OtpKey, cipher: &CipherSequence, tag: &IntegrityTag) -> bool {
    keyed_mac(key, cipher).is_ok_and(|mac| mac.verify_slice(tag.as_bytes()).is_ok())
}
