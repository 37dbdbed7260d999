// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Random byte and identifier generation.

use rand::Rng;

pub fn random_bytes<const N: usize>() -> Vec<u8> {
    let mut buffer = vec![0u8; N];
    rand::rng().fill(&mut buffer[..]);
    buffer
}

/// Returns `length` random bytes rendered as lowercase hex, twice as many
/// characters. Used for the `Id` attributes of generated elements.
pub fn random_hex(length: usize) -> String {
    let mut buffer = vec![0u8; length];
    rand::rng().fill(&mut buffer[..]);
    buffer.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{random_bytes, random_hex};

    #[test]
    fn random_bytes_are_fresh() {
        assert_ne!(random_bytes::<32>(), random_bytes::<32>());
    }

    #[test]
    fn random_hex_length_and_alphabet() {
        let id = random_hex(8);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
