// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! This mod implements aes-128-gcm and aes-256-gcm encryption & decryption.

use aes_gcm::{aead::Aead, Aes128Gcm, Aes256Gcm, Key, KeyInit, Nonce};
use anyhow::*;

pub(crate) fn encrypt_aes256(key: &[u8], data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let encrypting_key = Key::<Aes256Gcm>::from_slice(key);
    let cipher = Aes256Gcm::new(encrypting_key);
    let nonce = Nonce::from_slice(iv);
    let ciphertext = cipher
        .encrypt(nonce, data)
        .map_err(|e| anyhow!("aes-256-gcm encrypt failed: {:?}", e))?;

    Ok(ciphertext)
}

pub(crate) fn decrypt_aes256(key: &[u8], encrypted_data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let decrypting_key = Key::<Aes256Gcm>::from_slice(key);
    let cipher = Aes256Gcm::new(decrypting_key);
    let nonce = Nonce::from_slice(iv);
    let plain_text = cipher
        .decrypt(nonce, encrypted_data)
        .map_err(|e| anyhow!("aes-256-gcm decrypt failed: {:?}", e))?;

    Ok(plain_text)
}

pub(crate) fn encrypt_aes128(key: &[u8], data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let encrypting_key = Key::<Aes128Gcm>::from_slice(key);
    let cipher = Aes128Gcm::new(encrypting_key);
    let nonce = Nonce::from_slice(iv);
    let ciphertext = cipher
        .encrypt(nonce, data)
        .map_err(|e| anyhow!("aes-128-gcm encrypt failed: {:?}", e))?;

    Ok(ciphertext)
}

pub(crate) fn decrypt_aes128(key: &[u8], encrypted_data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let decrypting_key = Key::<Aes128Gcm>::from_slice(key);
    let cipher = Aes128Gcm::new(decrypting_key);
    let nonce = Nonce::from_slice(iv);
    let plain_text = cipher
        .decrypt(nonce, encrypted_data)
        .map_err(|e| anyhow!("aes-128-gcm decrypt failed: {:?}", e))?;

    Ok(plain_text)
}
