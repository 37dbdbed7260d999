// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Encryption schemes bind a credential shape to a KMS provider and to
//! default algorithm choices.
//!
//! A scheme validates that a [`CredentialSet`] is usable before any
//! document or key material is touched, then hands out the factories that
//! talk to its KMS. Concrete schemes are selected through [`new_scheme`]
//! by id rather than through an inheritance hierarchy; two scheme
//! instances are considered equal iff their ids match.

use std::collections::BTreeMap;

use async_trait::async_trait;
use strum::{AsRefStr, EnumString};

use crypto::{ContentAlgorithm, WrapAlgorithm};
use kms::DataKeyUnwrapper;

use crate::credentials::{
    CredentialSet, PN_ACCESS_IDENTITY, PN_ACCESS_SECRET, PN_ENDPOINT, PN_MASTER_KEY,
};
use crate::session_key::{SecretKeyInfo, SecretKeyInfoFactory};
use crate::{Error, Result};

/// An EncryptionScheme generates and recovers secret key information.
#[async_trait]
pub trait EncryptionScheme: Send + Sync {
    /// A name that uniquely identifies this scheme; used for selection,
    /// equality and logging.
    fn scheme_id(&self) -> &'static str;

    /// Property names a credential set must define, non-blank, to be
    /// usable with this scheme.
    fn required_properties(&self) -> &'static [&'static str];

    /// The default algorithm used to wrap data keys.
    fn key_wrap_algorithm(&self) -> WrapAlgorithm;

    /// The default algorithm used to encrypt document content.
    fn content_algorithm(&self) -> ContentAlgorithm;

    /// Checks that a credential set contains enough information that it
    /// might be valid for encryption.
    fn is_consistent_with_encryption(&self, credentials: &CredentialSet) -> bool {
        self.required_properties().iter().all(|property| {
            matches!(credentials.get(property), Ok(Some(value)) if !value.trim().is_empty())
        })
    }

    /// Checks that a credential set contains enough information that it
    /// might be valid for decryption. Anyone who can mint a key under a
    /// master key can also request its unwrap, so the requirement sets
    /// coincide; KMS-side authorization is a separate concern.
    fn is_consistent_with_decryption(&self, credentials: &CredentialSet) -> bool {
        self.is_consistent_with_encryption(credentials)
    }

    /// Returns a factory bound to this credential set's master key, access
    /// identity and the given wrap algorithm. Fails with an
    /// invalid-credential error when the credential set does not satisfy
    /// [`is_consistent_with_encryption`], and with a configuration error
    /// for an unknown algorithm name.
    ///
    /// [`is_consistent_with_encryption`]: EncryptionScheme::is_consistent_with_encryption
    async fn secret_key_info_factory(
        &self,
        credentials: &CredentialSet,
        algorithm_name: &str,
        context: &BTreeMap<String, String>,
    ) -> Result<SecretKeyInfoFactory>;

    /// Returns the unwrapping client used on the decryption side.
    async fn unwrapper(&self, credentials: &CredentialSet) -> Result<Box<dyn DataKeyUnwrapper>>;

    /// Recovers key information directly from a serialized `EncryptedKey`
    /// fragment. No scheme implements this yet; it is an open capability
    /// gap, reported as such rather than a panic.
    fn recover_secret_key_info(&self, _encrypted_key_fragment: &str) -> Result<SecretKeyInfo> {
        Err(Error::Unsupported(
            "recovering key info from an EncryptedKey element",
        ))
    }
}

#[derive(AsRefStr, EnumString)]
enum SchemeKind {
    #[cfg(feature = "keyring")]
    #[strum(ascii_case_insensitive)]
    Keyring,

    #[cfg(feature = "rest")]
    #[strum(ascii_case_insensitive)]
    Rest,
}

/// Create a scheme by its id.
pub fn new_scheme(scheme_id: &str) -> Result<Box<dyn EncryptionScheme>> {
    let kind = SchemeKind::try_from(scheme_id)
        .map_err(|_| Error::Config(format!("unknown encryption scheme: {scheme_id}")))?;
    match kind {
        #[cfg(feature = "keyring")]
        SchemeKind::Keyring => Ok(Box::new(KeyringScheme) as Box<dyn EncryptionScheme>),

        #[cfg(feature = "rest")]
        SchemeKind::Rest => Ok(Box::new(RestScheme) as Box<dyn EncryptionScheme>),
    }
}

const REQUIRED_PROPERTY_NAMES: &[&str] = &[PN_ACCESS_IDENTITY, PN_ACCESS_SECRET, PN_MASTER_KEY];

fn gate(scheme: &dyn EncryptionScheme, credentials: &CredentialSet, consistent: bool) -> Result<()> {
    if !consistent {
        return Err(Error::InvalidCredential(format!(
            "credential set '{}' does not satisfy scheme {}",
            credentials.name(),
            scheme.scheme_id()
        )));
    }
    Ok(())
}

fn parse_wrap_algorithm(algorithm_name: &str) -> Result<WrapAlgorithm> {
    if algorithm_name.trim().is_empty() {
        return Err(Error::InvalidArgument("null or blank algorithm name"));
    }
    WrapAlgorithm::try_from(algorithm_name)
        .map_err(|_| Error::Config(format!("unknown key-wrap algorithm: {algorithm_name}")))
}

fn required_property<'a>(credentials: &'a CredentialSet, property: &str) -> Result<&'a str> {
    credentials.get(property)?.ok_or_else(|| {
        Error::InvalidCredential(format!(
            "credential set '{}' is missing {property}",
            credentials.name()
        ))
    })
}

/// Scheme backed by the local filesystem keyring provider. The optional
/// endpoint property names the keyring file.
#[cfg(feature = "keyring")]
pub struct KeyringScheme;

#[cfg(feature = "keyring")]
impl KeyringScheme {
    async fn keyring_client(
        &self,
        credentials: &CredentialSet,
    ) -> Result<kms::plugins::keyring::KeyringKms> {
        use kms::plugins::keyring::KeyringKms;

        let client = match credentials.get(PN_ENDPOINT)? {
            Some(path) if !path.trim().is_empty() => KeyringKms::new(path).await?,
            _ => KeyringKms::from_provider_settings(&kms::ProviderSettings::default()).await?,
        };
        Ok(client)
    }
}

#[cfg(feature = "keyring")]
#[async_trait]
impl EncryptionScheme for KeyringScheme {
    fn scheme_id(&self) -> &'static str {
        "keyring"
    }

    fn required_properties(&self) -> &'static [&'static str] {
        REQUIRED_PROPERTY_NAMES
    }

    fn key_wrap_algorithm(&self) -> WrapAlgorithm {
        WrapAlgorithm::KwAes256
    }

    fn content_algorithm(&self) -> ContentAlgorithm {
        ContentAlgorithm::Aes256Gcm
    }

    async fn secret_key_info_factory(
        &self,
        credentials: &CredentialSet,
        algorithm_name: &str,
        _context: &BTreeMap<String, String>,
    ) -> Result<SecretKeyInfoFactory> {
        gate(self, credentials, self.is_consistent_with_encryption(credentials))?;
        let wrap_algorithm = parse_wrap_algorithm(algorithm_name)?;
        let master_key_id = required_property(credentials, PN_MASTER_KEY)?;
        let endpoint = credentials.get(PN_ENDPOINT)?.map(str::to_owned);

        let generator = self.keyring_client(credentials).await?;
        SecretKeyInfoFactory::new(master_key_id, wrap_algorithm, endpoint, Box::new(generator))
    }

    async fn unwrapper(&self, credentials: &CredentialSet) -> Result<Box<dyn DataKeyUnwrapper>> {
        gate(self, credentials, self.is_consistent_with_decryption(credentials))?;
        let client = self.keyring_client(credentials).await?;
        Ok(Box::new(client) as Box<dyn DataKeyUnwrapper>)
    }
}

/// Scheme backed by the remote REST KMS provider. The endpoint comes from
/// the endpoint property, or is derived from a URI-shaped master key id.
#[cfg(feature = "rest")]
pub struct RestScheme;

#[cfg(feature = "rest")]
impl RestScheme {
    fn rest_client(
        &self,
        credentials: &CredentialSet,
    ) -> Result<kms::plugins::rest::RestKmsClient> {
        use kms::plugins::rest;

        let access_identity = required_property(credentials, PN_ACCESS_IDENTITY)?;
        let access_secret = required_property(credentials, PN_ACCESS_SECRET)?;
        let master_key_id = required_property(credentials, PN_MASTER_KEY)?;

        let endpoint = match credentials.get(PN_ENDPOINT)? {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint.to_owned(),
            _ => rest::endpoint_from_key_id(master_key_id).ok_or_else(|| {
                Error::Config(format!(
                    "no endpoint configured and none derivable from key id {master_key_id}"
                ))
            })?,
        };

        Ok(rest::RestKmsClient::new(
            access_identity,
            access_secret,
            &endpoint,
        )?)
    }
}

#[cfg(feature = "rest")]
#[async_trait]
impl EncryptionScheme for RestScheme {
    fn scheme_id(&self) -> &'static str {
        "rest"
    }

    fn required_properties(&self) -> &'static [&'static str] {
        REQUIRED_PROPERTY_NAMES
    }

    fn key_wrap_algorithm(&self) -> WrapAlgorithm {
        WrapAlgorithm::KwAes256
    }

    fn content_algorithm(&self) -> ContentAlgorithm {
        ContentAlgorithm::Aes256Gcm
    }

    async fn secret_key_info_factory(
        &self,
        credentials: &CredentialSet,
        algorithm_name: &str,
        _context: &BTreeMap<String, String>,
    ) -> Result<SecretKeyInfoFactory> {
        gate(self, credentials, self.is_consistent_with_encryption(credentials))?;
        let wrap_algorithm = parse_wrap_algorithm(algorithm_name)?;
        let master_key_id = required_property(credentials, PN_MASTER_KEY)?;
        let endpoint = credentials.get(PN_ENDPOINT)?.map(str::to_owned);

        let client = self.rest_client(credentials)?;
        SecretKeyInfoFactory::new(master_key_id, wrap_algorithm, endpoint, Box::new(client))
    }

    async fn unwrapper(&self, credentials: &CredentialSet) -> Result<Box<dyn DataKeyUnwrapper>> {
        gate(self, credentials, self.is_consistent_with_decryption(credentials))?;
        let client = self.rest_client(credentials)?;
        Ok(Box::new(client) as Box<dyn DataKeyUnwrapper>)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use crate::credentials::{
        CredentialSet, PN_ACCESS_IDENTITY, PN_ACCESS_SECRET, PN_MASTER_KEY,
    };
    use crate::Error;

    use super::{new_scheme, EncryptionScheme, KeyringScheme};

    fn credentials(identity: Option<&str>, secret: Option<&str>, master: Option<&str>) -> CredentialSet {
        let mut credentials = CredentialSet::new("test").unwrap();
        if let Some(identity) = identity {
            credentials.put(PN_ACCESS_IDENTITY, identity).unwrap();
        }
        if let Some(secret) = secret {
            credentials.put(PN_ACCESS_SECRET, secret).unwrap();
        }
        if let Some(master) = master {
            credentials.put(PN_MASTER_KEY, master).unwrap();
        }
        credentials
    }

    #[rstest]
    #[case(Some("ops"), Some("s3cr3t"), Some("alias/payroll"), true)]
    #[case(None, Some("s3cr3t"), Some("alias/payroll"), false)]
    #[case(Some("ops"), None, Some("alias/payroll"), false)]
    #[case(Some("ops"), Some("s3cr3t"), None, false)]
    #[case(None, None, Some("alias/payroll"), false)]
    #[case(None, Some("s3cr3t"), None, false)]
    #[case(Some("ops"), None, None, false)]
    #[case(None, None, None, false)]
    #[case(Some("  "), Some("s3cr3t"), Some("alias/payroll"), false)]
    #[case(Some("ops"), Some(""), Some("alias/payroll"), false)]
    #[case(Some("ops"), Some("s3cr3t"), Some(" "), false)]
    fn consistency_gate(
        #[case] identity: Option<&str>,
        #[case] secret: Option<&str>,
        #[case] master: Option<&str>,
        #[case] expected: bool,
    ) {
        let scheme = KeyringScheme;
        let credentials = credentials(identity, secret, master);
        assert_eq!(scheme.is_consistent_with_encryption(&credentials), expected);
        assert_eq!(scheme.is_consistent_with_decryption(&credentials), expected);
    }

    #[test]
    fn registry_resolves_known_schemes() {
        assert_eq!(new_scheme("keyring").unwrap().scheme_id(), "keyring");
        assert_eq!(new_scheme("rest").unwrap().scheme_id(), "rest");
        assert!(matches!(new_scheme("hsm"), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn inconsistent_credentials_are_rejected_before_any_io() {
        let scheme = KeyringScheme;
        let incomplete = credentials(Some("ops"), None, Some("alias/payroll"));
        let result = scheme
            .secret_key_info_factory(&incomplete, scheme.key_wrap_algorithm().as_ref(), &BTreeMap::new())
            .await;
        assert!(matches!(result, Err(Error::InvalidCredential(_))));
    }

    #[tokio::test]
    async fn blank_algorithm_name_is_rejected() {
        let scheme = KeyringScheme;
        let complete = credentials(Some("ops"), Some("s3cr3t"), Some("alias/payroll"));
        let result = scheme
            .secret_key_info_factory(&complete, " ", &BTreeMap::new())
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn recover_secret_key_info_is_an_open_capability_gap() {
        let scheme = KeyringScheme;
        assert!(matches!(
            scheme.recover_secret_key_info("<xenc:EncryptedKey/>"),
            Err(Error::Unsupported(_))
        ));
    }
}
