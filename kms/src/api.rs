// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! # Api definitions for KMS drivers
//!
//! To establish a connection between a client and a KMS, two kinds of
//! parameters are required:
//! - Public parameters: like the endpoint of the service or the identity
//! that requests the operation. They are not confidential and travel inside
//! the encrypted document. [`ProviderSettings`] is a json object holding all
//! of them; the map style keeps it flexible across different KMSes. Each
//! provider offers a constructor that takes a [`ProviderSettings`] and
//! returns a client instance.
//! - Private parameters: like the secret used to authenticate the identity.
//! These are captured inside the logic of `new()` rather than passed as
//! input, and are expected to be read from a protected local path.
//!
//! ## APIs
//! - `DataKeyGenerator`: mints fresh data keys under a master key. Used on
//! the encryption side.
//! - `DataKeyUnwrapper`: recovers the plaintext of a wrapped data key. Used
//! on the decryption side.
//!
//! The two traits are separate because the two sides run in different
//! places and do not need to be implemented by the same object.

use async_trait::async_trait;
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crypto::WrapAlgorithm;

use crate::Result;

/// ProviderSettings are extra public information used to create a client.
pub type ProviderSettings = Map<String, Value>;

/// A data key freshly minted by a KMS: the same key material in the clear
/// and wrapped under the master key. The plaintext half is transient and is
/// scrubbed when dropped; only the ciphertext half may leave the process.
pub struct GeneratedDataKey {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub ciphertext: Vec<u8>,
}

#[async_trait]
pub trait DataKeyGenerator: Send + Sync {
    /// Mint a fresh data key under the master key `key_id`. The
    /// `wrap_algorithm` URI is mapped by the provider to its own key spec;
    /// two successive calls never return the same key material.
    async fn generate_data_key(
        &mut self,
        key_id: &str,
        wrap_algorithm: &WrapAlgorithm,
    ) -> Result<GeneratedDataKey>;
}

#[async_trait]
pub trait DataKeyUnwrapper: Send + Sync {
    /// Recover the plaintext data key from `ciphertext`, which was wrapped
    /// under the master key `key_id`. The unwrap operation occurs inside
    /// the KMS.
    async fn unwrap_data_key(
        &mut self,
        ciphertext: &[u8],
        key_id: &str,
        wrap_algorithm: &WrapAlgorithm,
    ) -> Result<Zeroizing<Vec<u8>>>;
}
