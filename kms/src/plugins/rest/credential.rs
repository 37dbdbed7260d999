// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Credentials to access the REST KMS.

use anyhow::*;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

#[derive(Clone)]
pub(crate) struct Credential {
    pub(crate) access_identity: String,
    access_secret: String,
}

/// On-disk shape of `credential_<identity>.json`.
#[derive(Deserialize)]
struct CredentialFile {
    access_secret: String,
}

impl Credential {
    pub(crate) fn new(access_identity: &str, access_secret: &str) -> Self {
        Self {
            access_identity: access_identity.to_owned(),
            access_secret: access_secret.to_owned(),
        }
    }

    pub(crate) fn from_file_content(access_identity: &str, content: &str) -> Result<Self> {
        let file: CredentialFile = serde_json::from_str(content)?;
        Ok(Self::new(access_identity, &file.access_secret))
    }

    /// HMAC-SHA256 signature over the canonical request string, base64
    /// encoded.
    pub(crate) fn sign(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.access_secret.as_bytes())
            .map_err(|e| anyhow!("initialize signer failed: {e}"))?;
        mac.update(string_to_sign.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(STANDARD.encode(signature))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_identity", &self.access_identity)
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;

    #[test]
    fn signature_is_deterministic() {
        let credential = Credential::new("ops", "not-a-real-secret");
        let first = credential.sign("POST\n/unwrap\ndate\ndigest").unwrap();
        let second = credential.sign("POST\n/unwrap\ndate\ndigest").unwrap();
        assert_eq!(first, second);

        let other = credential.sign("POST\n/unwrap\ndate\ndigest2").unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn debug_redacts_the_secret() {
        let credential = Credential::new("ops", "not-a-real-secret");
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("not-a-real-secret"));
    }
}
