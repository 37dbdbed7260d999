// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Session-key material minted by a KMS and the factory that mints it.

use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use zeroize::Zeroizing;

use crypto::WrapAlgorithm;
use kms::DataKeyGenerator;

use crate::document::escape_text;
use crate::{ns, Error, Result};

/// A minimal structural pointer to the master key: the name that a holder
/// of unwrap permission presents to the KMS. It renders as a
/// `ds:KeyInfo/ds:KeyName` fragment and never carries key material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyReference {
    master_key_id: String,
}

impl KeyReference {
    pub fn new(master_key_id: &str) -> Self {
        Self {
            master_key_id: master_key_id.to_owned(),
        }
    }

    pub fn master_key_id(&self) -> &str {
        &self.master_key_id
    }

    /// The `ds:KeyInfo` fragment naming the master key.
    pub fn to_xml(&self) -> String {
        let ds = ns::SIG_PREFIX;
        format!(
            "<{ds}:KeyInfo xmlns:{ds}=\"{}\"><{ds}:KeyName>{}</{ds}:KeyName></{ds}:KeyInfo>",
            ns::DSIG,
            escape_text(&self.master_key_id)
        )
    }
}

/// One session's data key: the clear key, its KMS-wrapped ciphertext and
/// the reference to the master key that wrapped it.
///
/// The two byte strings are the same key material under different
/// encodings. Only `encrypted_key` and `key_reference` are meant to leave
/// process memory; the clear key drives the content cipher once and is
/// scrubbed on drop.
pub struct SecretKeyInfo {
    key: Zeroizing<Vec<u8>>,
    encrypted_key: Vec<u8>,
    key_reference: KeyReference,
}

impl SecretKeyInfo {
    pub fn new(key: Zeroizing<Vec<u8>>, encrypted_key: Vec<u8>, key_reference: KeyReference) -> Self {
        Self {
            key,
            encrypted_key,
            key_reference,
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    pub fn key_reference(&self) -> &KeyReference {
        &self.key_reference
    }
}

impl std::fmt::Debug for SecretKeyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // leading and trailing bytes only; never the clear key
        let rendered = if self.encrypted_key.len() >= 6 {
            format!(
                "{}...{}",
                STANDARD.encode(&self.encrypted_key[..3]),
                STANDARD.encode(&self.encrypted_key[self.encrypted_key.len() - 3..])
            )
        } else {
            "...".to_string()
        };
        f.debug_struct("SecretKeyInfo")
            .field("encrypted_key", &rendered)
            .field("key_reference", &self.key_reference)
            .finish()
    }
}

/// Mints exactly one fresh data key per [`create_session_key`] call, via
/// the bound KMS provider.
///
/// Factory identity is `(master_key_id, wrap_algorithm, endpoint)`, not any
/// key material: two factories configured identically are interchangeable
/// even though every call produces distinct material.
///
/// [`create_session_key`]: SecretKeyInfoFactory::create_session_key
pub struct SecretKeyInfoFactory {
    master_key_id: String,
    wrap_algorithm: WrapAlgorithm,
    endpoint: Option<String>,
    generator: Box<dyn DataKeyGenerator>,
}

impl SecretKeyInfoFactory {
    pub fn new(
        master_key_id: &str,
        wrap_algorithm: WrapAlgorithm,
        endpoint: Option<String>,
        generator: Box<dyn DataKeyGenerator>,
    ) -> Result<Self> {
        if master_key_id.trim().is_empty() {
            return Err(Error::InvalidArgument("null or blank master key id"));
        }
        Ok(Self {
            master_key_id: master_key_id.to_owned(),
            wrap_algorithm,
            endpoint,
            generator,
        })
    }

    /// Mint a fresh data key. Two successive calls never return equal
    /// clear keys or equal wrapped ciphertexts; data keys are never reused
    /// across documents.
    pub async fn create_session_key(&mut self) -> Result<SecretKeyInfo> {
        let generated = self
            .generator
            .generate_data_key(&self.master_key_id, &self.wrap_algorithm)
            .await?;

        let info = SecretKeyInfo::new(
            generated.plaintext,
            generated.ciphertext,
            KeyReference::new(&self.master_key_id),
        );
        debug!("minted session key: {info:?}");
        Ok(info)
    }

    pub fn master_key_id(&self) -> &str {
        &self.master_key_id
    }

    pub fn wrap_algorithm(&self) -> &WrapAlgorithm {
        &self.wrap_algorithm
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

impl PartialEq for SecretKeyInfoFactory {
    fn eq(&self, other: &Self) -> bool {
        self.master_key_id == other.master_key_id
            && self.wrap_algorithm == other.wrap_algorithm
            && self.endpoint == other.endpoint
    }
}

impl Eq for SecretKeyInfoFactory {}

impl std::fmt::Debug for SecretKeyInfoFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKeyInfoFactory")
            .field("master_key_id", &self.master_key_id)
            .field("wrap_algorithm", &self.wrap_algorithm)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use zeroize::Zeroizing;

    use crypto::WrapAlgorithm;
    use kms::{DataKeyGenerator, GeneratedDataKey};

    use crate::{Error, KeyReference, SecretKeyInfo};

    use super::SecretKeyInfoFactory;

    struct FixedGenerator;

    #[async_trait]
    impl DataKeyGenerator for FixedGenerator {
        async fn generate_data_key(
            &mut self,
            _key_id: &str,
            _wrap_algorithm: &WrapAlgorithm,
        ) -> kms::Result<GeneratedDataKey> {
            Ok(GeneratedDataKey {
                plaintext: Zeroizing::new(vec![1u8; 32]),
                ciphertext: vec![2u8; 48],
            })
        }
    }

    fn factory(master_key_id: &str, endpoint: Option<&str>) -> SecretKeyInfoFactory {
        SecretKeyInfoFactory::new(
            master_key_id,
            WrapAlgorithm::KwAes256,
            endpoint.map(str::to_owned),
            Box::new(FixedGenerator),
        )
        .unwrap()
    }

    #[test]
    fn identity_is_configuration_not_key_material() {
        assert_eq!(factory("alias/payroll", None), factory("alias/payroll", None));
        assert_ne!(factory("alias/payroll", None), factory("alias/other", None));
        assert_ne!(
            factory("alias/payroll", Some("https://kms.example.com")),
            factory("alias/payroll", None)
        );
    }

    #[test]
    fn blank_master_key_id_is_rejected() {
        let result = SecretKeyInfoFactory::new(
            " ",
            WrapAlgorithm::KwAes256,
            None,
            Box::new(FixedGenerator),
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn session_key_carries_the_master_key_reference() {
        let mut factory = factory("alias/payroll", None);
        let info = factory.create_session_key().await.unwrap();
        assert_eq!(info.key_reference().master_key_id(), "alias/payroll");
        assert_eq!(info.key().len(), 32);
        assert!(!info.encrypted_key().is_empty());
    }

    #[test]
    fn key_reference_renders_key_info() {
        let reference = KeyReference::new("alias/p&o");
        let xml = reference.to_xml();
        assert!(xml.contains("<ds:KeyName>alias/p&amp;o</ds:KeyName>"));

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.tag_name().name(), "KeyInfo");
        assert_eq!(
            root.tag_name().namespace(),
            Some("http://www.w3.org/2000/09/xmldsig#")
        );
    }

    #[test]
    fn debug_never_shows_the_clear_key() {
        let info = SecretKeyInfo::new(
            Zeroizing::new(vec![0xAB; 32]),
            vec![3u8; 48],
            KeyReference::new("alias/payroll"),
        );
        let rendered = format!("{info:?}");
        assert!(!rendered.contains("171")); // 0xAB
        assert!(rendered.contains("alias/payroll"));
    }
}
