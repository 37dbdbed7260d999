// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[cfg(feature = "keyring")]
    #[error("keyring KMS error: {0}")]
    KeyringKmsError(String),

    #[cfg(feature = "rest")]
    #[error("REST KMS error: {0}")]
    RestKmsError(String),

    #[error("master key not found: {0}")]
    UnknownMasterKey(String),

    #[error("request denied by KMS: {0}")]
    Unauthorized(String),

    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),
}
