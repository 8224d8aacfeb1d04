// File:    alphabet.rs
// Author:  apezoo
// Date:    2025-09-02
//
// Description: Maps text onto the 48-symbol message alphabet and back.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! The message alphabet.
//!
//! Every message is reduced to a sequence of [`Symbol`]s before it is
//! encrypted. The alphabet covers lowercase ASCII letters (`0..=25`), digits
//! (`26..=35`) and space plus eleven punctuation marks (`36..=47`):
//!
//! ```text
//! ' ' . , ! ? ' " : ; - ( )
//! ```
//!
//! Encoding lower-cases its input and drops anything else, so the codec only
//! round-trips [`normalize`]d text.

use std::fmt;
use std::ops::{Add, Sub};

/// Number of symbols in the alphabet.
pub const ALPHABET_SIZE: u8 = 48;

/// Character for each symbol code, indexed by code.
const SYMBOL_TABLE: &[u8; ALPHABET_SIZE as usize] =
    b"abcdefghijklmnopqrstuvwxyz0123456789 .,!?'\":;-()";

/// Marks ASCII bytes that have no symbol.
const UNMAPPED: u8 = u8::MAX;

/// Symbol code for each ASCII byte, or `UNMAPPED`.
const CODE_TABLE: [u8; 128] = build_code_table();

const fn build_code_table() -> [u8; 128] {
    let mut table = [UNMAPPED; 128];
    let mut code = 0;
    while code < SYMBOL_TABLE.len() {
        table[SYMBOL_TABLE[code] as usize] = code as u8;
        code += 1;
    }
    table
}

/// One character of the message alphabet, always in `0..ALPHABET_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u8);

impl Symbol {
    /// Creates a symbol from its numeric code, or `None` if the code is out of range.
    #[must_use]
    pub const fn new(code: u8) -> Option<Self> {
        if code < ALPHABET_SIZE {
            Some(Self(code))
        } else {
            None
        }
    }

    /// Looks up the symbol for an already lower-cased character.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        if !c.is_ascii() {
            return None;
        }
        match CODE_TABLE[c as usize] {
            UNMAPPED => None,
            code => Some(Self(code)),
        }
    }

    /// The numeric code of this symbol.
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// The character this symbol stands for.
    #[must_use]
    pub const fn to_char(self) -> char {
        SYMBOL_TABLE[self.0 as usize] as char
    }
}

/// Addition modulo [`ALPHABET_SIZE`].
impl Add for Symbol {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self((self.0 + rhs.0) % ALPHABET_SIZE)
    }
}

/// Subtraction modulo [`ALPHABET_SIZE`], never negative.
impl Sub for Symbol {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self((self.0 + ALPHABET_SIZE - rhs.0) % ALPHABET_SIZE)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// An encoded plaintext message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSequence(Vec<Symbol>);

impl SymbolSequence {
    /// Builds a sequence from raw codes, silently skipping codes outside the alphabet.
    #[must_use]
    pub fn from_codes(codes: &[u8]) -> Self {
        codes.iter().copied().filter_map(Symbol::new).collect()
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the sequence holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The symbols in order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    /// Canonical byte packing, one byte per symbol.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().map(|s| s.code()).collect()
    }
}

impl FromIterator<Symbol> for SymbolSequence {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Encodes text into symbols.
///
/// The input is lower-cased first; characters with no symbol are dropped.
#[must_use]
pub fn encode(text: &str) -> SymbolSequence {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter_map(Symbol::from_char)
        .collect()
}

/// Decodes symbols back into text.
#[must_use]
pub fn decode(symbols: &SymbolSequence) -> String {
    symbols.symbols().iter().map(|s| s.to_char()).collect()
}

/// The text that `decode(&encode(text))` yields: lower-cased, unsupported characters removed.
#[must_use]
pub fn normalize(text: &str) -> String {
    decode(&encode(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_a_bijection() {
        for code in 0..ALPHABET_SIZE {
            let symbol = Symbol::new(code).unwrap();
            assert_eq!(Symbol::from_char(symbol.to_char()), Some(symbol));
        }
    }

    #[test]
    fn fixed_code_assignments() {
        assert_eq!(Symbol::from_char('a').map(Symbol::code), Some(0));
        assert_eq!(Symbol::from_char('z').map(Symbol::code), Some(25));
        assert_eq!(Symbol::from_char('0').map(Symbol::code), Some(26));
        assert_eq!(Symbol::from_char('9').map(Symbol::code), Some(35));
        assert_eq!(Symbol::from_char(' ').map(Symbol::code), Some(36));
        assert_eq!(Symbol::from_char('"').map(Symbol::code), Some(42));
        assert_eq!(Symbol::from_char(')').map(Symbol::code), Some(47));
        assert_eq!(Symbol::from_char('A'), None);
        assert_eq!(Symbol::from_char('é'), None);
    }

    #[test]
    fn out_of_range_codes_are_rejected() {
        assert!(Symbol::new(ALPHABET_SIZE).is_none());
        assert!(Symbol::new(u8::MAX).is_none());
    }

    #[test]
    fn encode_lowercases_and_drops_unsupported() {
        let symbols = encode("Hi, Café™!");
        assert_eq!(decode(&symbols), "hi, caf!");
    }

    #[test]
    fn from_codes_skips_invalid_codes() {
        let symbols = SymbolSequence::from_codes(&[7, 48, 4, 200, 11, 11, 14]);
        assert_eq!(decode(&symbols), "hello");
    }

    #[test]
    fn modular_arithmetic_wraps_both_ways() {
        let a = Symbol::new(47).unwrap();
        let b = Symbol::new(5).unwrap();
        assert_eq!((a + b).code(), 4);
        assert_eq!((b - a).code(), 6);
        assert_eq!((a + b) - b, a);
    }

    #[test]
    fn empty_text_encodes_to_empty_sequence() {
        assert!(encode("").is_empty());
        assert!(encode("™é€").is_empty());
    }
}
