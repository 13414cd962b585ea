//! Public identifier generation.
//!
//! # Responsibility
//! - Produce short, URL-safe, collision-resistant document identifiers.
//! - Keep the encoding reproducible for a fixed random input.
//!
//! # Invariants
//! - Every identifier encodes exactly 128 random bits.
//! - Output is 26 lowercase symbols from the Crockford base-32 alphabet.
//! - Trailing padding bits of the last symbol are always zero.

use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes behind one public identifier.
pub const PUBLIC_ID_BYTES: usize = 16;
/// Encoded length: ceil(128 / 5).
pub const PUBLIC_ID_LEN: usize = 26;

// Crockford variant: no I, L, O, U.
const ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";
const PADDING_BITS: u32 = (PUBLIC_ID_LEN * 5 - PUBLIC_ID_BYTES * 8) as u32;

/// Generates a fresh public identifier from the OS random source.
///
/// Panics only if the OS random source fails, which is treated as fatal.
pub fn generate_public_id() -> String {
    let mut random = [0u8; PUBLIC_ID_BYTES];
    OsRng.fill_bytes(&mut random);
    encode_public_id(random)
}

/// Encodes 128 bits into the lowercase Crockford base-32 form.
pub fn encode_public_id(random: [u8; PUBLIC_ID_BYTES]) -> String {
    let mut encoded = String::with_capacity(PUBLIC_ID_LEN);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for byte in random {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            encoded.push(symbol((buffer >> bits) & 0x1f));
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        encoded.push(symbol((buffer << (5 - bits)) & 0x1f));
    }

    encoded
}

/// Returns whether `value` looks like an identifier produced by this module.
///
/// Shape check only; says nothing about whether a document exists.
pub fn is_public_id_shaped(value: &str) -> bool {
    if value.len() != PUBLIC_ID_LEN {
        return false;
    }

    let mut last = None;
    for byte in value.bytes() {
        match symbol_value(byte) {
            Some(v) => last = Some(v),
            None => return false,
        }
    }

    last.is_some_and(|v| v & ((1 << PADDING_BITS) - 1) == 0)
}

fn symbol(value: u32) -> char {
    char::from(ALPHABET[value as usize])
}

fn symbol_value(byte: u8) -> Option<u32> {
    ALPHABET
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|index| index as u32)
}

#[cfg(test)]
mod tests {
    use super::{encode_public_id, generate_public_id, is_public_id_shaped, PUBLIC_ID_LEN};

    const GOLDEN_INPUT: [u8; 16] = [
        0xe1, 0x75, 0x86, 0xb7, 0xc3, 0xfb, 0x03, 0xa9, 0x26, 0x9f, 0xc9, 0xd6, 0x8c, 0x2d, 0x7b,
        0x7b,
    ];

    #[test]
    fn encodes_golden_vector() {
        assert_eq!(encode_public_id(GOLDEN_INPUT), "w5trddy3zc1tj9mzs7b8rbbvfc");
    }

    #[test]
    fn encodes_boundary_inputs() {
        assert_eq!(encode_public_id([0u8; 16]), "0".repeat(PUBLIC_ID_LEN));
        assert_eq!(
            encode_public_id([0xff; 16]),
            format!("{}w", "z".repeat(PUBLIC_ID_LEN - 1))
        );
    }

    #[test]
    fn generated_ids_are_well_shaped() {
        for _ in 0..64 {
            let id = generate_public_id();
            assert_eq!(id.len(), PUBLIC_ID_LEN);
            assert!(is_public_id_shaped(&id), "unexpected shape: {id}");
        }
    }

    #[test]
    fn shape_check_rejects_ambiguous_and_uppercase_symbols() {
        assert!(is_public_id_shaped("w5trddy3zc1tj9mzs7b8rbbvfc"));
        assert!(!is_public_id_shaped("W5TRDDY3ZC1TJ9MZS7B8RBBVFC"));
        assert!(!is_public_id_shaped("w5trddy3zc1tj9mzs7b8rbbvfi"));
        assert!(!is_public_id_shaped("w5trddy3zc1tj9mzs7b8rbbvf"));
        // last symbol must leave the two padding bits clear
        assert!(!is_public_id_shaped("w5trddy3zc1tj9mzs7b8rbbvfd"));
        assert!(!is_public_id_shaped("my-alias"));
    }
}
