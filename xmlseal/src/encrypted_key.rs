// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Serialization of minted session keys into `xenc:EncryptedKey` fragments.

use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;

use crypto::WrapAlgorithm;

use crate::session_key::SecretKeyInfo;
use crate::{ns, Error, Result};

/// Serializes a [`SecretKeyInfo`] into the standard wrapped-key fragment:
///
/// ```text
/// <xenc:EncryptedKey Id="EK-...">
///   <xenc:EncryptionMethod Algorithm="..."/>
///   <ds:KeyInfo><ds:KeyName>...</ds:KeyName></ds:KeyInfo>
///   <xenc:CipherData><xenc:CipherValue>...</xenc:CipherValue></xenc:CipherData>
/// </xenc:EncryptedKey>
/// ```
///
/// No network, no key material handling: given the same inputs the output
/// is structurally identical except for the random `Id` attribute.
#[derive(Default)]
pub struct EncryptedKeyFactory;

impl EncryptedKeyFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn create_encrypted_key_element(
        &self,
        wrap_algorithm: &WrapAlgorithm,
        info: &SecretKeyInfo,
    ) -> Result<String> {
        if info.encrypted_key().is_empty() {
            return Err(Error::InvalidArgument("empty wrapped key"));
        }

        let xenc = ns::ENC_PREFIX;
        let id = format!("EK-{}", crypto::rand::random_hex(8));
        let cipher_value = STANDARD.encode(info.encrypted_key());

        let fragment = format!(
            "<{xenc}:EncryptedKey xmlns:{xenc}=\"{enc_ns}\" Id=\"{id}\">\
             <{xenc}:EncryptionMethod Algorithm=\"{algorithm}\"/>\
             {key_info}\
             <{xenc}:CipherData><{xenc}:CipherValue>{cipher_value}</{xenc}:CipherValue></{xenc}:CipherData>\
             </{xenc}:EncryptedKey>",
            enc_ns = ns::ENC,
            algorithm = wrap_algorithm.as_ref(),
            key_info = info.key_reference().to_xml(),
        );

        debug!("EncryptedKey: {fragment}");
        Ok(fragment)
    }
}
