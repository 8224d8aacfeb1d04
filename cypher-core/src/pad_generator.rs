// File:    pad_generator.rs
// Author:  apezoo
// Date:    2025-07-17
//
// Description: Generates single-use one-time pad keys over the message alphabet.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::alphabet::{ALPHABET_SIZE, Symbol};
use crate::error::{CypherError, Result};
use rand::{TryRngCore, rngs::OsRng};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bytes at or above this bound are discarded so that `byte % ALPHABET_SIZE` stays uniform.
const REJECTION_BOUND: u8 = (u8::MAX / ALPHABET_SIZE) * ALPHABET_SIZE;

/// Random bytes requested from the OS per refill.
const BATCH_SIZE: usize = 64;

/// A one-time pad key.
///
/// Keys cannot be cloned and are only created fresh by [`OtpKey::generate`] or
/// recovered by unwrapping a received key, so a pad is never applied to two
/// messages. The key material is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct OtpKey {
    codes: Vec<u8>,
}

impl OtpKey {
    /// Generates a key of `length` symbols drawn uniformly from the OS random source.
    ///
    /// # Errors
    ///
    /// Returns [`CypherError::Rng`] if the operating system random source fails.
    pub fn generate(length: usize) -> Result<Self> {
        let mut rng = OsRng;
        let mut codes = Vec::with_capacity(length);
        let mut buffer = [0u8; BATCH_SIZE];

        while codes.len() < length {
            // Use the failable `try_fill_bytes` and surface the OS error.
            rng.try_fill_bytes(&mut buffer)
                .map_err(|e| CypherError::Rng(e.to_string()))?;
            let needed = length - codes.len();
            codes.extend(
                buffer
                    .iter()
                    .filter(|&&b| b < REJECTION_BOUND)
                    .map(|&b| b % ALPHABET_SIZE)
                    .take(needed),
            );
        }
        buffer.zeroize();

        Ok(Self { codes })
    }

    /// Rebuilds a key from its raw packing, failing if any byte is not a symbol code.
    pub(crate) fn from_raw_bytes(mut bytes: Vec<u8>) -> Result<Self> {
        if bytes.iter().any(|&b| Symbol::new(b).is_none()) {
            bytes.zeroize();
            return Err(CypherError::UnwrapFailed);
        }
        Ok(Self { codes: bytes })
    }

    /// Number of symbols in the key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the key holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Raw packing of the key, one byte per symbol.
    ///
    /// This is the form that gets wrapped and that keys the integrity tag.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.codes
    }

    /// The key symbols in order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.codes.iter().copied().filter_map(Symbol::new)
    }

    /// Consumes the key, keeping only its first `length` symbols.
    #[must_use]
    pub fn truncate(mut self, length: usize) -> Self {
        if length < self.codes.len() {
            self.codes[length..].zeroize();
            self.codes.truncate(length);
        }
        self
    }
}

impl fmt::Debug for OtpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OtpKey([REDACTED; {}])", self.codes.len())
    }
}
