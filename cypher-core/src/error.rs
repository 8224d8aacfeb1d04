// File:    error.rs
// Author:  apezoo
// Date:    2025-07-17
//
// Description: Error types shared by every stage of the hybrid OTP protocol.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use thiserror::Error;

/// Errors that can occur while sending, receiving or managing keys.
#[derive(Error, Debug)]
pub enum CypherError {
    /// The OTP key has fewer symbols than the message it should cover.
    #[error("OTP key too short: key has {key_len} symbols, message needs {message_len}")]
    KeyTooShort {
        /// Number of symbols in the key.
        key_len: usize,
        /// Number of symbols in the message.
        message_len: usize,
    },

    /// The OTP key does not fit into a single RSA-OAEP block for the recipient key.
    #[error("OTP key of {key_len} bytes exceeds the {max_len} byte wrap capacity of the recipient key")]
    KeyTooLargeForWrap {
        /// Raw key length in bytes.
        key_len: usize,
        /// Largest payload the recipient key can wrap.
        max_len: usize,
    },

    /// RSA-OAEP encryption of the OTP key failed.
    #[error("Key wrapping failed: {0}")]
    WrapFailed(String),

    /// The wrapped key could not be recovered (wrong private key or tampered input).
    #[error("Key unwrap failed: wrong private key or corrupted wrapped key")]
    UnwrapFailed,

    /// The integrity tag did not match the ciphertext.
    #[error("Integrity check failed: message was tampered with or keyed for someone else")]
    IntegrityCheckFailed,

    /// The transport payload could not be parsed.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The operating system random source failed.
    #[error("Random number generation failed: {0}")]
    Rng(String),

    /// The MAC could not be keyed.
    #[error("MAC initialisation failed: {0}")]
    Mac(String),

    /// RSA key pair generation failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// A key could not be encoded to or decoded from PEM.
    #[error("Key encoding failed: {0}")]
    KeyEncoding(String),

    /// The key store is missing, incomplete or inconsistent.
    #[error("Key store error: {0}")]
    KeyStore(String),

    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for protocol and key store operations.
pub type Result<T> = std::result::Result<T, CypherError>;
