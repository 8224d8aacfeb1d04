//! Property-based tests for the codec and the pad arithmetic.

use proptest::prelude::*;

use crate::alphabet::{self, ALPHABET_SIZE, SymbolSequence};
use crate::crypto;
use crate::pad_generator::OtpKey;
use crate::transport::{self, Payload};

/// Characters the alphabet covers, upper case included.
const SUPPORTED: &str = "[a-zA-Z0-9 .,!?'\":;()-]{0,200}";

proptest! {
    /// Supported text round-trips up to case.
    #[test]
    fn codec_roundtrip_lowercases(text in SUPPORTED) {
        prop_assert_eq!(alphabet::decode(&alphabet::encode(&text)), text.to_lowercase());
    }

    /// Encoding emits one symbol per supported character and nothing else.
    #[test]
    fn encode_drops_only_unsupported(text in "\\PC{0,100}") {
        let symbols = alphabet::encode(&text);
        let expected = text
            .chars()
            .flat_map(char::to_lowercase)
            .filter(|c| alphabet::Symbol::from_char(*c).is_some())
            .count();
        prop_assert_eq!(symbols.len(), expected);
        prop_assert_eq!(alphabet::normalize(&alphabet::normalize(&text)), alphabet::normalize(&text));
    }

    /// Decrypting with the same pad recovers the plaintext, for any pad at least as long.
    #[test]
    fn otp_roundtrip(
        codes in prop::collection::vec(0..ALPHABET_SIZE, 0..190),
        extra in prop::collection::vec(0..ALPHABET_SIZE, 0..16),
        pad in prop::collection::vec(0..ALPHABET_SIZE, 190),
    ) {
        let plain = SymbolSequence::from_codes(&codes);
        let mut key_bytes = pad[..codes.len()].to_vec();
        key_bytes.extend_from_slice(&extra);
        let key = OtpKey::from_raw_bytes(key_bytes).unwrap();

        let cipher = crypto::encrypt(&plain, &key).unwrap();
        prop_assert_eq!(cipher.len(), plain.len());
        prop_assert!(cipher.as_bytes().iter().all(|&c| c < ALPHABET_SIZE));
        prop_assert_eq!(crypto::decrypt(&cipher, &key).unwrap(), plain);
    }

    /// Arbitrary input never panics the parser.
    #[test]
    fn deserialize_never_panics(text in "\\PC{0,200}") {
        let _ = transport::deserialize(&Payload::from(text));
    }
}
