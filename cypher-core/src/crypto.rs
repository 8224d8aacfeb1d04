// File:    crypto.rs
// Author:  apezoo
// Date:    2025-07-17
//
// Description: Applies and reverses one-time pads over the message alphabet.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! This module contains the one-time pad operations.
//!
//! Encryption adds the key to the message symbol by symbol modulo
//! [`ALPHABET_SIZE`](crate::alphabet::ALPHABET_SIZE); decryption subtracts it.
//! Only the first `message.len()` key symbols are consumed.

use crate::alphabet::{Symbol, SymbolSequence};
use crate::error::{CypherError, Result};
use crate::pad_generator::OtpKey;

/// An encrypted message.
///
/// Sequences produced by [`encrypt`] only hold symbol codes. A sequence read
/// from the wire is unauthenticated and may hold any byte until its integrity
/// tag has been verified; [`decrypt`] rejects codes outside the alphabet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CipherSequence(Vec<u8>);

impl CipherSequence {
    /// Wraps raw ciphertext codes as received from the transport.
    #[must_use]
    pub const fn from_bytes(codes: Vec<u8>) -> Self {
        Self(codes)
    }

    /// Number of ciphertext codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ciphertext is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical byte packing, one byte per code. This is what the integrity tag covers.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

fn ensure_key_covers(key: &OtpKey, message_len: usize) -> Result<()> {
    if key.len() < message_len {
        return Err(CypherError::KeyTooShort {
            key_len: key.len(),
            message_len,
        });
    }
    Ok(())
}

/// Encrypts a message with a one-time pad.
///
/// # Errors
///
/// Returns [`CypherError::KeyTooShort`] if the key has fewer symbols than the message.
pub fn encrypt(plain: &SymbolSequence, key: &OtpKey) -> Result<CipherSequence> {
    ensure_key_covers(key, plain.len())?;
    let codes = plain
        .symbols()
        .iter()
        .zip(key.symbols())
        .map(|(&p, k)| (p + k).code())
        .collect();
    Ok(CipherSequence(codes))
}

/// Decrypts a ciphertext with the pad it was encrypted under.
///
/// # Errors
///
/// Returns [`CypherError::KeyTooShort`] if the key has fewer symbols than the
/// ciphertext, or [`CypherError::MalformedPayload`] if a ciphertext code lies
/// outside the alphabet.
pub fn decrypt(cipher: &CipherSequence, key: &OtpKey) -> Result<SymbolSequence> {
    ensure_key_covers(key, cipher.len())?;
    cipher
        .as_bytes()
        .iter()
        .zip(key.symbols())
        .map(|(&c, k)| {
            Symbol::new(c).map(|c| c - k).ok_or_else(|| {
                CypherError::MalformedPayload(format!("ciphertext code {c} is outside the alphabet"))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(SymbolSequence::from_iter)
}
