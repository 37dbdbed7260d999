// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Named credential property bags and the on-disk credential surface.
//!
//! A [`CredentialSet`] carries one identity's connection parameters to a
//! KMS. It is constructed once, handed by reference to an encryptor or
//! decryptor session, and treated as immutable afterwards; nothing in this
//! crate mutates a credential set after handoff.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::enc_value;
use crate::{Error, Result};

/// Required property -- the identity that may use the master key.
pub const PN_ACCESS_IDENTITY: &str = "kms.access.identity";

/// Required property -- the identity's secret.
pub const PN_ACCESS_SECRET: &str = "kms.access.secret";

/// Required property -- the master key under which data keys are wrapped.
pub const PN_MASTER_KEY: &str = "kms.master.key";

/// Optional property -- a provider-specific service endpoint.
pub const PN_ENDPOINT: &str = "kms.endpoint";

/// A text prefix that marks the start of a password protected value.
pub const ENC_START_MARKER: &str = "ENC(";

/// A text suffix that marks the end of a password protected value.
pub const ENC_END_MARKER: &str = ")";

/// Environment variable overriding the credential file location.
pub const ENV_CREDENTIALS: &str = "XMLSEAL_CREDENTIALS";

/// Environment variable holding the password for `ENC(...)` values. When
/// unset, marked values are used verbatim, markers included.
pub const ENV_CREDENTIALS_PASSWORD: &str = "XMLSEAL_CREDENTIALS_PASSWORD";

const DEFAULT_CREDENTIALS_DIR: &str = ".xmlseal";
const DEFAULT_CREDENTIALS_FILE: &str = "credentials.toml";

/// A CredentialSet is a named set of properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialSet {
    name: String,
    properties: BTreeMap<String, String>,
}

impl CredentialSet {
    /// Creates an empty credential set with the specified name. To make it
    /// valid for some encryption scheme, add the property values the scheme
    /// requires.
    pub fn new(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument("null or blank credential name"));
        }
        Ok(Self {
            name: name.to_owned(),
            properties: BTreeMap::new(),
        })
    }

    /// Creates a credential set populated with `properties`.
    pub fn from_properties(name: &str, properties: BTreeMap<String, String>) -> Result<Self> {
        let mut credentials = Self::new(name)?;
        credentials.put_all(properties);
        Ok(credentials)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Stores or overwrites one property. The property name must be
    /// non-blank.
    pub fn put(&mut self, property_name: &str, value: &str) -> Result<()> {
        if property_name.trim().is_empty() {
            return Err(Error::InvalidArgument("null or blank property name"));
        }
        self.properties
            .insert(property_name.to_owned(), value.to_owned());
        Ok(())
    }

    /// Replaces every property wholesale. Replacement is all-or-nothing;
    /// previously stored properties do not survive.
    pub fn put_all(&mut self, properties: BTreeMap<String, String>) {
        self.properties = properties;
    }

    /// Returns the stored value, or `None` for an absent property. Only a
    /// blank `property_name` is an error -- it signals misuse, not absence.
    pub fn get(&self, property_name: &str) -> Result<Option<&str>> {
        if property_name.trim().is_empty() {
            return Err(Error::InvalidArgument("null or blank property name"));
        }
        Ok(self.properties.get(property_name).map(String::as_str))
    }

    /// Loads a credential set from the file named by [`ENV_CREDENTIALS`],
    /// or from `~/.xmlseal/credentials.toml` when the variable is unset.
    pub async fn load(name: &str) -> Result<Self> {
        let path = match env::var(ENV_CREDENTIALS) {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_credentials_path()?,
        };
        Self::load_from(name, &path).await
    }

    /// Loads a credential set from a TOML table of property names to
    /// values. Values wrapped in `ENC(...)` markers are passed through the
    /// password-based decryptor when [`ENV_CREDENTIALS_PASSWORD`] is set.
    pub async fn load_from(name: &str, path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("credential file {}: {e}", path.display()))
        })?;
        let password = env::var(ENV_CREDENTIALS_PASSWORD).ok();
        Self::from_toml(name, &text, password.as_deref())
    }

    fn from_toml(name: &str, text: &str, password: Option<&str>) -> Result<Self> {
        let raw: BTreeMap<String, String> = toml::from_str(text)
            .map_err(|e| Error::Config(format!("illegal credential file: {e}")))?;

        let mut properties = BTreeMap::new();
        for (property_name, value) in raw {
            let value = enc_value::reveal(&value, password)?;
            properties.insert(property_name, value);
        }
        Self::from_properties(name, properties)
    }
}

fn default_credentials_path() -> Result<PathBuf> {
    let home = env::var("HOME")
        .map_err(|_| Error::Config("HOME is not set and no credential file was given".into()))?;
    Ok(PathBuf::from(home)
        .join(DEFAULT_CREDENTIALS_DIR)
        .join(DEFAULT_CREDENTIALS_FILE))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use crate::{enc_value, Error};

    use super::{CredentialSet, PN_ACCESS_IDENTITY, PN_MASTER_KEY};

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_name_is_rejected(#[case] name: &str) {
        assert!(matches!(
            CredentialSet::new(name),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn put_and_get() {
        let mut credentials = CredentialSet::new("test").unwrap();
        credentials.put(PN_MASTER_KEY, "alias/payroll").unwrap();
        assert_eq!(
            credentials.get(PN_MASTER_KEY).unwrap(),
            Some("alias/payroll")
        );

        credentials.put(PN_MASTER_KEY, "alias/other").unwrap();
        assert_eq!(credentials.get(PN_MASTER_KEY).unwrap(), Some("alias/other"));
    }

    #[test]
    fn absent_property_is_none_not_an_error() {
        let credentials = CredentialSet::new("test").unwrap();
        assert_eq!(credentials.get(PN_MASTER_KEY).unwrap(), None);
    }

    #[test]
    fn blank_property_name_is_an_error() {
        let credentials = CredentialSet::new("test").unwrap();
        assert!(matches!(
            credentials.get("  "),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn put_all_replaces_wholesale() {
        let mut credentials = CredentialSet::new("test").unwrap();
        credentials.put(PN_MASTER_KEY, "alias/payroll").unwrap();

        let replacement =
            BTreeMap::from([(PN_ACCESS_IDENTITY.to_string(), "ops".to_string())]);
        credentials.put_all(replacement);

        assert_eq!(credentials.get(PN_MASTER_KEY).unwrap(), None);
        assert_eq!(credentials.get(PN_ACCESS_IDENTITY).unwrap(), Some("ops"));
    }

    #[test]
    fn from_toml_reads_plain_values() {
        let text = "\"kms.master.key\" = \"alias/payroll\"\n\"kms.access.identity\" = \"ops\"\n";
        let credentials = CredentialSet::from_toml("test", text, None).unwrap();
        assert_eq!(
            credentials.get(PN_MASTER_KEY).unwrap(),
            Some("alias/payroll")
        );
        assert_eq!(credentials.get(PN_ACCESS_IDENTITY).unwrap(), Some("ops"));
    }

    #[test]
    fn from_toml_reveals_marked_values() {
        let concealed = enc_value::conceal("alias/payroll", "password").unwrap();
        let text = format!("\"kms.master.key\" = \"{concealed}\"\n");

        let credentials = CredentialSet::from_toml("test", &text, Some("password")).unwrap();
        assert_eq!(
            credentials.get(PN_MASTER_KEY).unwrap(),
            Some("alias/payroll")
        );
    }

    #[test]
    fn marked_values_without_password_are_verbatim() {
        let concealed = enc_value::conceal("alias/payroll", "password").unwrap();
        let text = format!("\"kms.master.key\" = \"{concealed}\"\n");

        let credentials = CredentialSet::from_toml("test", &text, None).unwrap();
        assert_eq!(
            credentials.get(PN_MASTER_KEY).unwrap(),
            Some(concealed.as_str())
        );
    }
}
