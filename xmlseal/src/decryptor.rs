// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Document decryption: locate the envelope, unwrap the data key via the
//! KMS, restore the original root content in place.

use std::ops::Range;

use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use roxmltree::Node;

use crypto::{ContentAlgorithm, WrapAlgorithm, GCM_IV_LENGTH};

use crate::credentials::CredentialSet;
use crate::document;
use crate::scheme::EncryptionScheme;
use crate::{ns, Error, Result};

use kms::DataKeyUnwrapper;

/// Everything the decryptor reads out of an envelope before it touches
/// the KMS or the document. Gathering these first keeps the whole parse
/// phase free of side effects.
struct Envelope {
    content_algorithm: ContentAlgorithm,
    wrap_algorithm: WrapAlgorithm,
    master_key_id: String,
    wrapped_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    range: Range<usize>,
}

/// Decrypts documents produced by [`DocumentEncryptor`].
///
/// Every structural read happens before the destructive splice, so a
/// failing document comes back exactly as it was handed in. A document
/// with no `EncryptedData` child is a structure error, never treated as
/// "already decrypted".
///
/// [`DocumentEncryptor`]: crate::DocumentEncryptor
pub struct DocumentDecryptor {
    scheme: Box<dyn EncryptionScheme>,
    credentials: CredentialSet,
    unwrapper: Box<dyn DataKeyUnwrapper>,
}

impl DocumentDecryptor {
    /// Binds a decryptor to `scheme` and `credentials`. Fails with an
    /// invalid-credential error when the credential set does not satisfy
    /// the scheme.
    pub async fn new(
        scheme: Box<dyn EncryptionScheme>,
        credentials: CredentialSet,
    ) -> Result<Self> {
        let unwrapper = scheme.unwrapper(&credentials).await?;
        Ok(Self {
            scheme,
            credentials,
            unwrapper,
        })
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    pub fn scheme(&self) -> &dyn EncryptionScheme {
        self.scheme.as_ref()
    }

    /// Decrypts the single `EncryptedData` child of the root element and
    /// returns the restored document.
    pub async fn decrypt(&mut self, xml: &str) -> Result<String> {
        let envelope = parse_envelope(xml)?;

        debug!(
            "unwrapping data key under {} declared as {}",
            envelope.master_key_id,
            envelope.wrap_algorithm.as_ref()
        );
        let data_key = self
            .unwrapper
            .unwrap_data_key(
                &envelope.wrapped_key,
                &envelope.master_key_id,
                &envelope.wrap_algorithm,
            )
            .await?;
        if data_key.len() != envelope.content_algorithm.key_length() {
            return Err(Error::Structure(format!(
                "unwrapped key is {} bytes but {} requires {}",
                data_key.len(),
                envelope.content_algorithm.as_ref(),
                envelope.content_algorithm.key_length()
            )));
        }

        let plaintext = crypto::decrypt(
            data_key,
            envelope.ciphertext,
            envelope.iv,
            envelope.content_algorithm,
        )
        .map_err(|e| Error::Crypto(format!("content decryption failed: {e}")))?;
        let content = String::from_utf8(plaintext)
            .map_err(|_| Error::Crypto("decrypted content is not valid UTF-8".to_string()))?;

        // Splice the recovered content over the envelope. Nothing before
        // this point modified the document.
        let mut result = String::with_capacity(
            xml.len() - (envelope.range.end - envelope.range.start) + content.len(),
        );
        result.push_str(&xml[..envelope.range.start]);
        result.push_str(&content);
        result.push_str(&xml[envelope.range.end..]);

        debug!("EncryptedData envelope replaced by recovered content");
        Ok(result)
    }
}

/// Locates and validates the envelope. Every read is a hard cardinality
/// check over untrusted input; nothing here mutates anything.
fn parse_envelope(xml: &str) -> Result<Envelope> {
    let doc = document::parse(xml)?;
    let root = document::document_root(&doc)?;

    let encrypted_data = document::single_child(root, ns::ENC, ns::node::ENCRYPTED_DATA)?;
    if let Some(enc_type) = encrypted_data.attribute(ns::attr::TYPE) {
        if enc_type != ns::ENC_TYPE_CONTENT {
            return Err(Error::Unsupported("only content-scope encryption"));
        }
    }

    let method = document::single_child(encrypted_data, ns::ENC, ns::node::ENCRYPTION_METHOD)?;
    let content_uri = document::required_attribute(method, ns::attr::ALGORITHM)?;
    let content_algorithm = ContentAlgorithm::try_from(content_uri)
        .map_err(|_| Error::Structure(format!("unknown content algorithm: {content_uri}")))?;

    let encrypted_key = find_encrypted_key(encrypted_data)?;
    let wrap_method = document::single_child(encrypted_key, ns::ENC, ns::node::ENCRYPTION_METHOD)?;
    let wrap_uri = document::required_attribute(wrap_method, ns::attr::ALGORITHM)?;
    let wrap_algorithm = WrapAlgorithm::try_from(wrap_uri)
        .map_err(|_| Error::Structure(format!("unknown key-wrap algorithm: {wrap_uri}")))?;

    let master_key_id = master_key_id(encrypted_key)?.to_owned();
    let wrapped_key = cipher_value(encrypted_key)?;

    let payload = cipher_value(encrypted_data)?;
    if payload.len() <= GCM_IV_LENGTH {
        return Err(Error::Structure("cipher value is truncated".to_string()));
    }
    let (iv, ciphertext) = payload.split_at(GCM_IV_LENGTH);

    Ok(Envelope {
        content_algorithm,
        wrap_algorithm,
        master_key_id,
        wrapped_key,
        iv: iv.to_vec(),
        ciphertext: ciphertext.to_vec(),
        range: encrypted_data.range(),
    })
}

/// The single `EncryptedKey` nested in the envelope's `KeyInfo`.
fn find_encrypted_key<'a, 'input>(encrypted_data: Node<'a, 'input>) -> Result<Node<'a, 'input>> {
    let key_info = document::single_child(encrypted_data, ns::DSIG, ns::node::KEY_INFO)?;
    document::single_child(key_info, ns::ENC, ns::node::ENCRYPTED_KEY)
}

/// The master key name declared in the `EncryptedKey`'s own `KeyInfo`.
fn master_key_id<'a>(encrypted_key: Node<'a, '_>) -> Result<&'a str> {
    let key_info = document::single_child(encrypted_key, ns::DSIG, ns::node::KEY_INFO)?;
    let key_name = document::single_child(key_info, ns::DSIG, ns::node::KEY_NAME)?;
    document::text_content(key_name)
}

/// Decoded `CipherData/CipherValue` of `parent`.
fn cipher_value(parent: Node<'_, '_>) -> Result<Vec<u8>> {
    let cipher_data = document::single_child(parent, ns::ENC, ns::node::CIPHER_DATA)?;
    let value = document::single_child(cipher_data, ns::ENC, ns::node::CIPHER_VALUE)?;
    let text = document::text_content(value)?;
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| Error::Structure(format!("base64 decode CipherValue failed: {e}")))
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::parse_envelope;

    const ENC: &str = "http://www.w3.org/2001/04/xmlenc#";
    const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

    fn envelope_xml(enc_type: &str) -> String {
        format!(
            "<r><xenc:EncryptedData xmlns:xenc=\"{ENC}\"{enc_type}>\
             <xenc:EncryptionMethod Algorithm=\"http://www.w3.org/2009/xmlenc11#aes256-gcm\"/>\
             <ds:KeyInfo xmlns:ds=\"{DSIG}\">\
             <xenc:EncryptedKey Id=\"EK-1\">\
             <xenc:EncryptionMethod Algorithm=\"http://www.w3.org/2001/04/xmlenc#kw-aes256\"/>\
             <ds:KeyInfo><ds:KeyName>alias/payroll</ds:KeyName></ds:KeyInfo>\
             <xenc:CipherData><xenc:CipherValue>AAECAwQFBgcICQoLDA0ODw==</xenc:CipherValue></xenc:CipherData>\
             </xenc:EncryptedKey>\
             </ds:KeyInfo>\
             <xenc:CipherData><xenc:CipherValue>AAECAwQFBgcICQoLDA0ODxAREhM=</xenc:CipherValue></xenc:CipherData>\
             </xenc:EncryptedData></r>"
        )
    }

    #[test]
    fn well_formed_envelope_parses() {
        let xml = envelope_xml("");
        let envelope = parse_envelope(&xml).unwrap();
        assert_eq!(envelope.master_key_id, "alias/payroll");
        assert_eq!(envelope.wrapped_key.len(), 16);
        assert_eq!(envelope.iv.len(), 12);
        assert_eq!(envelope.ciphertext.len(), 8);
    }

    #[test]
    fn content_scope_type_is_accepted() {
        let xml = envelope_xml(
            " Type=\"http://www.w3.org/2001/04/xmlenc#Content\"",
        );
        assert!(parse_envelope(&xml).is_ok());
    }

    #[test]
    fn element_scope_type_is_unsupported() {
        let xml = envelope_xml(
            " Type=\"http://www.w3.org/2001/04/xmlenc#Element\"",
        );
        assert!(matches!(
            parse_envelope(&xml),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn missing_algorithm_attribute_is_a_structure_error() {
        let xml = envelope_xml("").replacen(
            " Algorithm=\"http://www.w3.org/2009/xmlenc11#aes256-gcm\"",
            "",
            1,
        );
        assert!(matches!(parse_envelope(&xml), Err(Error::Structure(_))));
    }

    #[test]
    fn duplicated_key_name_is_a_structure_error() {
        let xml = envelope_xml("").replacen(
            "<ds:KeyName>alias/payroll</ds:KeyName>",
            "<ds:KeyName>alias/payroll</ds:KeyName><ds:KeyName>alias/other</ds:KeyName>",
            1,
        );
        assert!(matches!(parse_envelope(&xml), Err(Error::Structure(_))));
    }

    #[test]
    fn truncated_cipher_value_is_a_structure_error() {
        let xml = envelope_xml("").replacen(
            "AAECAwQFBgcICQoLDA0ODxAREhM=",
            "AAECAwQFBgc=",
            1,
        );
        assert!(matches!(parse_envelope(&xml), Err(Error::Structure(_))));
    }

    #[test]
    fn wrong_namespace_on_key_info_is_a_structure_error() {
        let xml = envelope_xml("").replacen("xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\"", "xmlns:ds=\"urn:not-dsig\"", 1);
        assert!(matches!(parse_envelope(&xml), Err(Error::Structure(_))));
    }
}
