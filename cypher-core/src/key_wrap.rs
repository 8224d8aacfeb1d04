// File:    key_wrap.rs
// Author:  apezoo
// Date:    2025-09-04
//
// Description: Wraps one-time pad keys for a recipient with RSA-OAEP.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Key wrapping.
//!
//! The raw pad key (one byte per symbol) is encrypted in a single RSA-OAEP
//! block using SHA-256 for both the label hash and MGF1. A single block bounds
//! the message length per payload; see [`max_wrap_len`].

use crate::error::{CypherError, Result};
use crate::pad_generator::OtpKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

/// Output size of the OAEP hash in bytes.
const OAEP_HASH_LEN: usize = 32;

/// Smallest RSA modulus accepted for new keys.
pub const MIN_KEY_BITS: usize = 1024;

/// Modulus size used when none is requested.
pub const DEFAULT_KEY_BITS: usize = 2048;

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

/// The public half of a recipient's key pair, used to wrap pad keys.
#[derive(Clone, PartialEq, Eq)]
pub struct RecipientPublicKey(RsaPublicKey);

impl RecipientPublicKey {
    /// Parses an SPKI PEM (`-----BEGIN PUBLIC KEY-----`).
    ///
    /// # Errors
    ///
    /// Returns [`CypherError::KeyEncoding`] if the PEM is not a valid RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        RsaPublicKey::from_public_key_pem(pem)
            .map(Self)
            .map_err(|e| CypherError::KeyEncoding(e.to_string()))
    }

    /// Encodes the key as SPKI PEM.
    ///
    /// # Errors
    ///
    /// Returns [`CypherError::KeyEncoding`] if encoding fails.
    pub fn to_pem(&self) -> Result<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CypherError::KeyEncoding(e.to_string()))
    }

    /// Hex SHA-256 of the DER-encoded public key.
    ///
    /// # Errors
    ///
    /// Returns [`CypherError::KeyEncoding`] if the key cannot be DER-encoded.
    pub fn fingerprint(&self) -> Result<String> {
        let der = self
            .0
            .to_public_key_der()
            .map_err(|e| CypherError::KeyEncoding(e.to_string()))?;
        Ok(format!("{:x}", Sha256::digest(der.as_bytes())))
    }

    /// Modulus size in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Longest message, in symbols, whose pad key fits into one wrap.
    #[must_use]
    pub fn max_message_len(&self) -> usize {
        max_wrap_len(self)
    }
}

impl fmt::Debug for RecipientPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecipientPublicKey(rsa-{})", self.bits())
    }
}

/// The private half of a recipient's key pair, used to unwrap pad keys.
#[derive(Clone)]
pub struct RecipientPrivateKey(RsaPrivateKey);

impl RecipientPrivateKey {
    /// Generates a fresh RSA key pair with a `bits`-bit modulus and exponent 65537.
    ///
    /// # Errors
    ///
    /// Returns [`CypherError::KeyGeneration`] if `bits` is below [`MIN_KEY_BITS`]
    /// or generation fails.
    pub fn generate(bits: usize) -> Result<Self> {
        if bits < MIN_KEY_BITS {
            return Err(CypherError::KeyGeneration(format!(
                "{bits}-bit keys are too small, use at least {MIN_KEY_BITS}"
            )));
        }
        RsaPrivateKey::new(&mut OsRng, bits)
            .map(Self)
            .map_err(|e| CypherError::KeyGeneration(e.to_string()))
    }

    /// The matching public key.
    #[must_use]
    pub fn public_key(&self) -> RecipientPublicKey {
        RecipientPublicKey(self.0.to_public_key())
    }

    /// Parses a PKCS#8 PEM, decrypting it with `passphrase` when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`CypherError::KeyEncoding`] if the PEM is invalid or the passphrase is wrong.
    pub fn from_pem(pem: &str, passphrase: Option<&str>) -> Result<Self> {
        let key = match passphrase {
            Some(passphrase) => RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase),
            None => RsaPrivateKey::from_pkcs8_pem(pem),
        };
        key.map(Self)
            .map_err(|e| CypherError::KeyEncoding(e.to_string()))
    }

    /// Encodes the key as PKCS#8 PEM, encrypted under `passphrase` when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`CypherError::KeyEncoding`] if encoding or encryption fails.
    pub fn to_pem(&self, passphrase: Option<&str>) -> Result<Zeroizing<String>> {
        let pem = match passphrase {
            Some(passphrase) => {
                self.0
                    .to_pkcs8_encrypted_pem(&mut OsRng, passphrase, LineEnding::LF)
            }
            None => self.0.to_pkcs8_pem(LineEnding::LF),
        };
        pem.map_err(|e| CypherError::KeyEncoding(e.to_string()))
    }
}

impl fmt::Debug for RecipientPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecipientPrivateKey([REDACTED])")
    }
}

/// A pad key encrypted for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    /// Wraps opaque bytes as received from the transport.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The RSA-OAEP ciphertext.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Largest raw key, in bytes, that fits into one OAEP block for this recipient.
///
/// For a 2048-bit modulus with SHA-256 this is 190 bytes.
#[must_use]
pub fn max_wrap_len(recipient: &RecipientPublicKey) -> usize {
    recipient
        .0
        .size()
        .saturating_sub(2 * OAEP_HASH_LEN + 2)
}

/// Encrypts the raw key bytes for `recipient`.
///
/// # Errors
///
/// Returns [`CypherError::KeyTooLargeForWrap`] if the key exceeds
/// [`max_wrap_len`], or [`CypherError::WrapFailed`] if encryption fails.
pub fn wrap(key: &OtpKey, recipient: &RecipientPublicKey) -> Result<WrappedKey> {
    let max_len = max_wrap_len(recipient);
    if key.len() > max_len {
        return Err(CypherError::KeyTooLargeForWrap {
            key_len: key.len(),
            max_len,
        });
    }
    recipient
        .0
        .encrypt(&mut OsRng, oaep(), key.as_bytes())
        .map(WrappedKey)
        .map_err(|e| CypherError::WrapFailed(e.to_string()))
}

/// Recovers a pad key with the recipient's private key.
///
/// # Errors
///
/// Returns [`CypherError::UnwrapFailed`] if the private key does not match,
/// the ciphertext is malformed or tampered with, or the recovered bytes are
/// not symbol codes.
pub fn unwrap(wrapped: &WrappedKey, recipient: &RecipientPrivateKey) -> Result<OtpKey> {
    let bytes = recipient
        .0
        .decrypt(oaep(), wrapped.as_bytes())
        .map_err(|_| CypherError::UnwrapFailed)?;
    OtpKey::from_raw_bytes(bytes)
}
