// File:    lib.rs
// Author:  apezoo
// Date:    2025-07-17
//
// Description: The main library crate for cypher-core, orchestrating hybrid OTP messaging.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! # Cypher Core Library
//!
//! Hybrid one-time pad messaging. A message is reduced to a 48-symbol
//! alphabet and encrypted with a fresh one-time pad. The pad is wrapped for
//! the recipient with RSA-OAEP and authenticates the ciphertext through an
//! HMAC-SHA-256 tag keyed by the pad itself.
//!
//! ```no_run
//! use cypher_core::key_wrap::RecipientPrivateKey;
//! use cypher_core::session;
//!
//! # fn main() -> cypher_core::Result<()> {
//! let recipient = RecipientPrivateKey::generate(2048)?;
//! let payload = session::send("Hello, World! 123", &recipient.public_key())?;
//! let received = session::receive(&payload, &recipient)?;
//! assert_eq!(received.into_parts(), ("hello, world! 123".to_string(), true));
//! # Ok(())
//! # }
//! ```

/// Mapping between text and the message alphabet.
pub mod alphabet;
/// One-time pad encryption and decryption.
pub mod crypto;
/// Error types.
pub mod error;
/// Ciphertext integrity tags.
pub mod integrity;
/// Wrapping pad keys for a recipient.
pub mod key_wrap;
/// Persistent storage of recipient key pairs.
pub mod keystore;
/// Generation of one-time pad keys.
pub mod pad_generator;
/// The send and receive flows.
pub mod session;
/// The wire format.
pub mod transport;

#[cfg(test)]
mod proptests;

pub use error::{CypherError, Result};
pub use session::{Received, receive, send};
pub use transport::Payload;
