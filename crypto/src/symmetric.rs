// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! APIs for the symmetric content ciphers and key-wrap identifiers.

use anyhow::{bail, Result};
use strum::{AsRefStr, EnumString};
use zeroize::Zeroizing;

use crate::gcm;

/// IV length of the AES-GCM content ciphers, in bytes.
pub const GCM_IV_LENGTH: usize = 12;

/// Content-encryption algorithms, identified by their XML Encryption 1.1
/// URIs. The URI appears verbatim as the `Algorithm` attribute of the
/// `EncryptionMethod` element inside `EncryptedData`.
#[derive(EnumString, AsRefStr, Clone, Debug, PartialEq, Eq)]
pub enum ContentAlgorithm {
    #[strum(serialize = "http://www.w3.org/2009/xmlenc11#aes128-gcm")]
    Aes128Gcm,

    #[strum(serialize = "http://www.w3.org/2009/xmlenc11#aes256-gcm")]
    Aes256Gcm,
}

impl ContentAlgorithm {
    /// Key length required by this cipher, in bytes.
    pub fn key_length(&self) -> usize {
        match self {
            ContentAlgorithm::Aes128Gcm => 16,
            ContentAlgorithm::Aes256Gcm => 32,
        }
    }
}

/// Key-wrap algorithms, identified by their XML Encryption URIs. The URI
/// appears as the `Algorithm` attribute of the `EncryptionMethod` element
/// inside `EncryptedKey`. A KMS maps the URI to its own key spec; locally
/// the URI fixes the length of the data key being minted.
#[derive(EnumString, AsRefStr, Clone, Debug, PartialEq, Eq)]
pub enum WrapAlgorithm {
    #[strum(serialize = "http://www.w3.org/2001/04/xmlenc#kw-aes128")]
    KwAes128,

    #[strum(serialize = "http://www.w3.org/2001/04/xmlenc#kw-aes256")]
    KwAes256,
}

impl WrapAlgorithm {
    /// Length of the data keys minted under this wrap algorithm, in bytes.
    pub fn data_key_length(&self) -> usize {
        match self {
            WrapAlgorithm::KwAes128 => 16,
            WrapAlgorithm::KwAes256 => 32,
        }
    }
}

/// Encrypt the given `plaintext`. The IV must be [`GCM_IV_LENGTH`] bytes
/// and fresh for every call under the same key.
pub fn encrypt(
    key: Zeroizing<Vec<u8>>,
    plaintext: Vec<u8>,
    iv: Vec<u8>,
    algorithm: ContentAlgorithm,
) -> Result<Vec<u8>> {
    check_lengths(&key, &iv, &algorithm)?;
    match algorithm {
        ContentAlgorithm::Aes128Gcm => gcm::encrypt_aes128(&key, &plaintext, &iv),
        ContentAlgorithm::Aes256Gcm => gcm::encrypt_aes256(&key, &plaintext, &iv),
    }
}

/// Decrypt the given `ciphertext`, verifying its authentication tag.
pub fn decrypt(
    key: Zeroizing<Vec<u8>>,
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
    algorithm: ContentAlgorithm,
) -> Result<Vec<u8>> {
    check_lengths(&key, &iv, &algorithm)?;
    match algorithm {
        ContentAlgorithm::Aes128Gcm => gcm::decrypt_aes128(&key, &ciphertext, &iv),
        ContentAlgorithm::Aes256Gcm => gcm::decrypt_aes256(&key, &ciphertext, &iv),
    }
}

fn check_lengths(key: &[u8], iv: &[u8], algorithm: &ContentAlgorithm) -> Result<()> {
    if key.len() != algorithm.key_length() {
        bail!(
            "algorithm {} requires a {}-byte key, got {} bytes",
            algorithm.as_ref(),
            algorithm.key_length(),
            key.len()
        );
    }
    if iv.len() != GCM_IV_LENGTH {
        bail!("IV must be {} bytes, got {}", GCM_IV_LENGTH, iv.len());
    }
    Ok(())
}
