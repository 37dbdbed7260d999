// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! A local filesystem keyring that plays the part of a KMS.
//!
//! Master keys never leave the keyring file; data keys are wrapped and
//! unwrapped in-process with AES-256-GCM under the named master key. The
//! keyring file is a JSON map from master key id to a base64 encoded
//! 256-bit key. A wrapped data key is `nonce(12) ‖ ciphertext`.

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use zeroize::Zeroizing;

use crypto::{ContentAlgorithm, WrapAlgorithm, GCM_IV_LENGTH};

use crate::{DataKeyGenerator, DataKeyUnwrapper, GeneratedDataKey, ProviderSettings};
use crate::{Error, Result};

/// Environment variable overriding the keyring file location.
pub const ENV_KEYRING_PATH: &str = "XMLSEAL_KEYRING_PATH";

const DEFAULT_KEYRING_PATH: &str = ".xmlseal/keyring.json";

const MASTER_KEY_LENGTH: usize = 32;

pub struct KeyringKms {
    path: String,
    keys: HashMap<String, Zeroizing<Vec<u8>>>,
}

/// Serialized [`crate::ProviderSettings`] of the keyring provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyringProviderSettings {
    #[serde(default)]
    pub keyring_path: Option<String>,
}

impl KeyringKms {
    /// Load the keyring from `path`. Every value must decode to a 256-bit
    /// master key.
    pub async fn new(path: &str) -> Result<Self> {
        let file = fs::read(path)
            .await
            .map_err(|e| Error::KeyringKmsError(format!("read keyring file {path} failed: {e}")))?;
        let map: HashMap<String, String> = serde_json::from_slice(&file)
            .map_err(|e| Error::KeyringKmsError(format!("illegal keyring file {path}: {e}")))?;

        let mut keys = HashMap::new();
        for (id, value) in &map {
            let key = STANDARD.decode(value).map_err(|e| {
                Error::KeyringKmsError(format!("decode master key {id} failed: {e}"))
            })?;
            if key.len() != MASTER_KEY_LENGTH {
                return Err(Error::KeyringKmsError(format!(
                    "master key {id} must be {MASTER_KEY_LENGTH} bytes, got {}",
                    key.len()
                )));
            }
            keys.insert(id.clone(), Zeroizing::new(key));
        }

        info!("keyring KMS loaded {} master key(s) from {path}", keys.len());
        Ok(Self {
            path: path.to_owned(),
            keys,
        })
    }

    /// Build a client from [`ProviderSettings`], falling back to the
    /// [`ENV_KEYRING_PATH`] environment variable and then to the default
    /// location under the user's home directory.
    pub async fn from_provider_settings(provider_settings: &ProviderSettings) -> Result<Self> {
        let settings: KeyringProviderSettings =
            serde_json::from_value(Value::Object(provider_settings.clone())).map_err(|e| {
                Error::KeyringKmsError(format!("parse provider settings failed: {e}"))
            })?;

        let path = match settings.keyring_path {
            Some(path) if !path.is_empty() => path,
            _ => match env::var(ENV_KEYRING_PATH) {
                Ok(path) => path,
                Err(_) => {
                    let home = env::var("HOME").map_err(|_| {
                        Error::KeyringKmsError(
                            "no keyring path given and HOME is not set".to_string(),
                        )
                    })?;
                    format!("{home}/{DEFAULT_KEYRING_PATH}")
                }
            },
        };

        Self::new(&path).await
    }

    /// Export the [`ProviderSettings`] of the current client, to be embedded
    /// on the encryption side and used to build the unwrapping client later.
    pub fn export_provider_settings(&self) -> Result<ProviderSettings> {
        let settings = KeyringProviderSettings {
            keyring_path: Some(self.path.clone()),
        };

        let settings = serde_json::to_value(settings)
            .map_err(|e| Error::KeyringKmsError(format!("serialize ProviderSettings failed: {e}")))?
            .as_object()
            .expect("must be an object")
            .to_owned();

        Ok(settings)
    }

    fn master_key(&self, key_id: &str) -> Result<&Zeroizing<Vec<u8>>> {
        self.keys
            .get(key_id)
            .ok_or_else(|| Error::UnknownMasterKey(key_id.to_string()))
    }
}

#[async_trait]
impl DataKeyGenerator for KeyringKms {
    async fn generate_data_key(
        &mut self,
        key_id: &str,
        wrap_algorithm: &WrapAlgorithm,
    ) -> Result<GeneratedDataKey> {
        let master_key = self.master_key(key_id)?;

        let plaintext = Zeroizing::new(match wrap_algorithm {
            WrapAlgorithm::KwAes128 => crypto::rand::random_bytes::<16>(),
            WrapAlgorithm::KwAes256 => crypto::rand::random_bytes::<32>(),
        });

        let nonce = crypto::rand::random_bytes::<GCM_IV_LENGTH>();
        let mut ciphertext = nonce.clone();
        ciphertext.extend(
            crypto::encrypt(
                master_key.clone(),
                plaintext.to_vec(),
                nonce,
                ContentAlgorithm::Aes256Gcm,
            )
            .map_err(|e| Error::KeyringKmsError(format!("wrap data key failed: {e}")))?,
        );

        Ok(GeneratedDataKey {
            plaintext,
            ciphertext,
        })
    }
}

#[async_trait]
impl DataKeyUnwrapper for KeyringKms {
    async fn unwrap_data_key(
        &mut self,
        ciphertext: &[u8],
        key_id: &str,
        wrap_algorithm: &WrapAlgorithm,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let master_key = self.master_key(key_id)?;

        if ciphertext.len() <= GCM_IV_LENGTH {
            return Err(Error::KeyringKmsError(
                "wrapped data key is truncated".to_string(),
            ));
        }
        let (nonce, wrapped) = ciphertext.split_at(GCM_IV_LENGTH);

        let plaintext = Zeroizing::new(
            crypto::decrypt(
                master_key.clone(),
                wrapped.to_vec(),
                nonce.to_vec(),
                ContentAlgorithm::Aes256Gcm,
            )
            .map_err(|e| Error::KeyringKmsError(format!("unwrap data key failed: {e}")))?,
        );

        if plaintext.len() != wrap_algorithm.data_key_length() {
            return Err(Error::KeyringKmsError(format!(
                "unwrapped data key is {} bytes, expected {} for {}",
                plaintext.len(),
                wrap_algorithm.data_key_length(),
                wrap_algorithm.as_ref()
            )));
        }

        Ok(plaintext)
    }
}
