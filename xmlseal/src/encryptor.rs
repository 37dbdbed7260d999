// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Document encryption: mint a data key, wrap it, encipher the root
//! content in one pass.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use zeroize::Zeroizing;

use crypto::{ContentAlgorithm, WrapAlgorithm, GCM_IV_LENGTH};

use crate::credentials::CredentialSet;
use crate::document;
use crate::encrypted_key::EncryptedKeyFactory;
use crate::scheme::EncryptionScheme;
use crate::session_key::SecretKeyInfoFactory;
use crate::{ns, Error, Result};

/// Encrypts the content of a document's root element into an
/// `xenc:EncryptedData` envelope carrying the wrapped data key.
///
/// The operation is not idempotent: encrypting an already-encrypted
/// document nests a second envelope around the first, because the
/// encryptor does not inspect document state before acting. Callers track
/// encryption state themselves.
pub struct DocumentEncryptor {
    scheme: Box<dyn EncryptionScheme>,
    credentials: CredentialSet,
    factory: SecretKeyInfoFactory,
    encrypted_key_factory: EncryptedKeyFactory,
}

impl DocumentEncryptor {
    /// Binds an encryptor to `scheme` and `credentials`, with the session
    /// key factory bound to the scheme's default wrap algorithm. Fails
    /// with an invalid-credential error when the credential set does not
    /// satisfy the scheme.
    pub async fn new(
        scheme: Box<dyn EncryptionScheme>,
        credentials: CredentialSet,
    ) -> Result<Self> {
        let factory = scheme
            .secret_key_info_factory(
                &credentials,
                scheme.key_wrap_algorithm().as_ref(),
                &BTreeMap::new(),
            )
            .await?;

        Ok(Self {
            scheme,
            credentials,
            factory,
            encrypted_key_factory: EncryptedKeyFactory::new(),
        })
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    pub fn scheme(&self) -> &dyn EncryptionScheme {
        self.scheme.as_ref()
    }

    /// Encrypts the content of the root element of `xml` with the
    /// scheme's default algorithms, returning the transformed document.
    /// On error the caller's document is untouched.
    pub async fn encrypt(&mut self, xml: &str) -> Result<String> {
        let wrap_algorithm = self.scheme.key_wrap_algorithm();
        let content_algorithm = self.scheme.content_algorithm();
        self.encrypt_inner(xml, wrap_algorithm, content_algorithm)
            .await
    }

    /// Encrypts with explicit algorithm URIs. Both identifiers must be
    /// non-blank; unknown identifiers are configuration errors.
    pub async fn encrypt_with(
        &mut self,
        xml: &str,
        key_wrap_algorithm: &str,
        content_algorithm: &str,
    ) -> Result<String> {
        if key_wrap_algorithm.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "null or blank key encryption algorithm",
            ));
        }
        if content_algorithm.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "null or blank document encryption algorithm",
            ));
        }

        let wrap_algorithm = WrapAlgorithm::try_from(key_wrap_algorithm)
            .map_err(|_| Error::Config(format!("unknown key-wrap algorithm: {key_wrap_algorithm}")))?;
        let content_algorithm = ContentAlgorithm::try_from(content_algorithm)
            .map_err(|_| Error::Config(format!("unknown content algorithm: {content_algorithm}")))?;

        self.encrypt_inner(xml, wrap_algorithm, content_algorithm).await
    }

    async fn encrypt_inner(
        &mut self,
        xml: &str,
        wrap_algorithm: WrapAlgorithm,
        content_algorithm: ContentAlgorithm,
    ) -> Result<String> {
        if wrap_algorithm.data_key_length() != content_algorithm.key_length() {
            return Err(Error::Config(format!(
                "{} mints {}-byte keys but {} requires {} bytes",
                wrap_algorithm.as_ref(),
                wrap_algorithm.data_key_length(),
                content_algorithm.as_ref(),
                content_algorithm.key_length()
            )));
        }

        // The factory is bound to one wrap algorithm; rebind on override so
        // the declared URI always matches the key spec the KMS was asked for.
        if wrap_algorithm != *self.factory.wrap_algorithm() {
            self.factory = self
                .scheme
                .secret_key_info_factory(
                    &self.credentials,
                    wrap_algorithm.as_ref(),
                    &BTreeMap::new(),
                )
                .await?;
        }

        // All structural reads happen up front; the parsed tree is gone
        // before the KMS round-trip.
        let (content_start, content_end) = {
            let doc = document::parse(xml)?;
            let root = document::document_root(&doc)?;
            let span = document::content_span(root)
                .ok_or_else(|| Error::Structure("root element has no content".to_string()))?;
            debug!(
                "encrypting {} bytes of content under <{}>",
                span.1 - span.0,
                root.tag_name().name()
            );
            span
        };

        // Mint the session key and build the wrapped-key fragment.
        let info = self.factory.create_session_key().await?;
        let encrypted_key = self
            .encrypted_key_factory
            .create_encrypted_key_element(&wrap_algorithm, &info)?;
        let ds = ns::SIG_PREFIX;
        let key_info = format!(
            "<{ds}:KeyInfo xmlns:{ds}=\"{}\">{encrypted_key}</{ds}:KeyInfo>",
            ns::DSIG
        );

        // Encipher the serialized root content; the IV rides in front of
        // the ciphertext inside CipherValue.
        let iv = crypto::rand::random_bytes::<GCM_IV_LENGTH>();
        let mut payload = iv.clone();
        payload.extend(
            crypto::encrypt(
                Zeroizing::new(info.key().to_vec()),
                xml[content_start..content_end].as_bytes().to_vec(),
                iv,
                content_algorithm.clone(),
            )
            .map_err(|e| Error::Crypto(format!("content encryption failed: {e}")))?,
        );

        let xenc = ns::ENC_PREFIX;
        let encrypted_data = format!(
            "<{xenc}:EncryptedData xmlns:{xenc}=\"{enc_ns}\" Id=\"ED-{id}\" Type=\"{enc_type}\">\
             <{xenc}:EncryptionMethod Algorithm=\"{algorithm}\"/>\
             {key_info}\
             <{xenc}:CipherData><{xenc}:CipherValue>{cipher_value}</{xenc}:CipherValue></{xenc}:CipherData>\
             </{xenc}:EncryptedData>",
            enc_ns = ns::ENC,
            id = crypto::rand::random_hex(8),
            enc_type = ns::ENC_TYPE_CONTENT,
            algorithm = content_algorithm.as_ref(),
            cipher_value = STANDARD.encode(payload),
        );

        // Replace the root's content with the envelope; the root element
        // itself, its attributes included, is untouched.
        let mut result =
            String::with_capacity(xml.len() - (content_end - content_start) + encrypted_data.len());
        result.push_str(&xml[..content_start]);
        result.push_str(&encrypted_data);
        result.push_str(&xml[content_end..]);

        debug!("root content replaced by EncryptedData envelope");
        Ok(result)
    }
}
