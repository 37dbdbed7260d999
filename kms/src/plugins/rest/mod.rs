// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! A client for a remote KMS speaking a small JSON-over-HTTPS protocol.
//!
//! Two operations are used: `generate-data-key` mints a fresh data key
//! under a master key and returns it in the clear and wrapped;
//! `unwrap` recovers the plaintext of a wrapped data key. Requests are
//! authenticated with an HMAC-SHA256 signature over a canonical request
//! string, in the manner of the usual cloud KMS gateways.

mod annotations;
mod credential;

pub use annotations::RestProviderSettings;

use std::env;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use const_format::concatcp;
use log::debug;
use reqwest::{header::HeaderMap, Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;
use url::Url;
use zeroize::Zeroizing;

use crypto::WrapAlgorithm;

use crate::{DataKeyGenerator, DataKeyUnwrapper, GeneratedDataKey, ProviderSettings};
use crate::{Error, Result};

/// Environment variable overriding the directory holding REST credentials.
pub const ENV_REST_KEY_PATH: &str = "XMLSEAL_REST_KEY_PATH";

const _IN_GUEST_DEFAULT_KEY_PATH: &str = "/run/xmlseal/kms-credential";
const REST_IN_GUEST_DEFAULT_KEY_PATH: &str = concatcp!(_IN_GUEST_DEFAULT_KEY_PATH, "/rest");

const SIGNATURE_SCHEME: &str = "XMLSEAL-HMAC-SHA256";

pub struct RestKmsClient {
    http_client: Client,
    credential: credential::Credential,
    endpoint: Url,
}

#[derive(Serialize)]
struct GenerateDataKeyRequest<'a> {
    key_id: &'a str,
    wrap_algorithm: &'a str,
}

#[derive(Deserialize)]
struct GenerateDataKeyResponse {
    plaintext: String,
    ciphertext: String,
}

#[derive(Serialize)]
struct UnwrapRequest<'a> {
    key_id: &'a str,
    wrap_algorithm: &'a str,
    ciphertext: String,
}

#[derive(Deserialize)]
struct UnwrapResponse {
    plaintext: String,
}

/// Derives the service endpoint from a URI-shaped master key id like
/// `kms://kms.example.com/alias/payroll`. Returns `None` when the key id
/// does not name a host.
pub fn endpoint_from_key_id(key_id: &str) -> Option<String> {
    let rest = key_id.strip_prefix("kms://")?;
    let host = rest.split('/').next().filter(|host| !host.is_empty())?;
    Some(format!("https://{host}"))
}

impl RestKmsClient {
    pub fn new(access_identity: &str, access_secret: &str, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::RestKmsError(format!("illegal endpoint {endpoint}: {e}")))?;
        let http_client = ClientBuilder::new()
            .build()
            .map_err(|e| Error::RestKmsError(format!("build http client failed: {e}")))?;

        Ok(Self {
            http_client,
            credential: credential::Credential::new(access_identity, access_secret),
            endpoint,
        })
    }

    /// This constructor is used on the decryption side. The side effect is
    /// to read the access secret from `credential_<identity>.json` under
    /// [`ENV_REST_KEY_PATH`] or the default credential directory.
    pub async fn from_provider_settings(provider_settings: &ProviderSettings) -> Result<Self> {
        let settings: RestProviderSettings =
            serde_json::from_value(Value::Object(provider_settings.clone()))
                .map_err(|e| Error::RestKmsError(format!("parse provider settings failed: {e}")))?;

        let key_path =
            env::var(ENV_REST_KEY_PATH).unwrap_or(REST_IN_GUEST_DEFAULT_KEY_PATH.to_owned());
        let credential_path = format!("{key_path}/credential_{}.json", settings.access_identity);

        let content = fs::read_to_string(&credential_path)
            .await
            .map_err(|e| Error::RestKmsError(format!("read credential failed: {e}")))?;
        let credential =
            credential::Credential::from_file_content(&settings.access_identity, &content)
                .map_err(|e| Error::RestKmsError(format!("parse credential failed: {e}")))?;

        let endpoint = Url::parse(&settings.endpoint).map_err(|e| {
            Error::RestKmsError(format!("illegal endpoint {}: {e}", settings.endpoint))
        })?;
        let http_client = ClientBuilder::new()
            .build()
            .map_err(|e| Error::RestKmsError(format!("build http client failed: {e}")))?;

        Ok(Self {
            http_client,
            credential,
            endpoint,
        })
    }

    /// Export the [`ProviderSettings`] of the current client. This is used
    /// on the encryption side; the settings travel with the document and
    /// initialize the unwrapping client later.
    pub fn export_provider_settings(&self) -> Result<ProviderSettings> {
        let settings = RestProviderSettings {
            access_identity: self.credential.access_identity.clone(),
            endpoint: self.endpoint.to_string(),
        };

        let settings = serde_json::to_value(settings)
            .map_err(|e| Error::RestKmsError(format!("serialize ProviderSettings failed: {e}")))?
            .as_object()
            .expect("must be an object")
            .to_owned();

        Ok(settings)
    }

    fn signed_headers(&self, operation: &str, body: &str) -> Result<HeaderMap> {
        let date = Utc::now().to_rfc3339();
        let string_to_sign = canonical_request("POST", operation, &date, body);
        let signature = self
            .credential
            .sign(&string_to_sign)
            .map_err(|e| Error::RestKmsError(format!("sign request failed: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-xmlseal-date",
            date.parse()
                .map_err(|_| Error::RestKmsError("illegal date header".to_string()))?,
        );
        headers.insert(
            "x-xmlseal-identity",
            self.credential
                .access_identity
                .parse()
                .map_err(|_| Error::RestKmsError("illegal identity header".to_string()))?,
        );
        headers.insert(
            "authorization",
            format!("{SIGNATURE_SCHEME} {signature}")
                .parse()
                .map_err(|_| Error::RestKmsError("illegal authorization header".to_string()))?,
        );
        Ok(headers)
    }

    async fn post(&self, operation: &str, body: String) -> Result<Vec<u8>> {
        let url = self
            .endpoint
            .join(operation)
            .map_err(|e| Error::RestKmsError(format!("illegal operation path: {e}")))?;
        let headers = self.signed_headers(operation, &body)?;

        debug!("POST {url}");
        let response = self
            .http_client
            .post(url)
            .headers(headers)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::RestKmsError(format!("{operation} request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized(format!(
                "{operation} denied with status {status}"
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::UnknownMasterKey(format!(
                "{operation} reported an unknown key"
            )));
        }
        if !status.is_success() {
            return Err(Error::RestKmsError(format!(
                "{operation} failed with status {status}"
            )));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| Error::RestKmsError(format!("read {operation} response failed: {e}")))?;
        Ok(content.to_vec())
    }
}

/// Canonical request string covered by the signature:
/// `method ‖ '\n' ‖ path ‖ '\n' ‖ date ‖ '\n' ‖ hex(sha256(body))`.
fn canonical_request(method: &str, operation: &str, date: &str, body: &str) -> String {
    let digest = hex::encode(Sha256::digest(body.as_bytes()));
    format!("{method}\n/{operation}\n{date}\n{digest}")
}

#[async_trait]
impl DataKeyGenerator for RestKmsClient {
    async fn generate_data_key(
        &mut self,
        key_id: &str,
        wrap_algorithm: &WrapAlgorithm,
    ) -> Result<GeneratedDataKey> {
        let request = GenerateDataKeyRequest {
            key_id,
            wrap_algorithm: wrap_algorithm.as_ref(),
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| Error::RestKmsError(format!("serialize request failed: {e}")))?;

        let response = self.post("generate-data-key", body).await?;
        let response: GenerateDataKeyResponse = serde_json::from_slice(&response)
            .map_err(|e| Error::RestKmsError(format!("illegal response: {e}")))?;

        let plaintext = Zeroizing::new(STANDARD.decode(response.plaintext).map_err(|e| {
            Error::RestKmsError(format!("base64 decode plaintext key failed: {e}"))
        })?);
        let ciphertext = STANDARD.decode(response.ciphertext).map_err(|e| {
            Error::RestKmsError(format!("base64 decode wrapped key failed: {e}"))
        })?;

        if plaintext.len() != wrap_algorithm.data_key_length() {
            return Err(Error::RestKmsError(format!(
                "KMS returned a {}-byte data key, expected {}",
                plaintext.len(),
                wrap_algorithm.data_key_length()
            )));
        }

        Ok(GeneratedDataKey {
            plaintext,
            ciphertext,
        })
    }
}

#[async_trait]
impl DataKeyUnwrapper for RestKmsClient {
    async fn unwrap_data_key(
        &mut self,
        ciphertext: &[u8],
        key_id: &str,
        wrap_algorithm: &WrapAlgorithm,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let request = UnwrapRequest {
            key_id,
            wrap_algorithm: wrap_algorithm.as_ref(),
            ciphertext: STANDARD.encode(ciphertext),
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| Error::RestKmsError(format!("serialize request failed: {e}")))?;

        let response = self.post("unwrap", body).await?;
        let response: UnwrapResponse = serde_json::from_slice(&response)
            .map_err(|e| Error::RestKmsError(format!("illegal response: {e}")))?;

        let plaintext = Zeroizing::new(STANDARD.decode(response.plaintext).map_err(|e| {
            Error::RestKmsError(format!("base64 decode unwrapped key failed: {e}"))
        })?);

        Ok(plaintext)
    }
}
