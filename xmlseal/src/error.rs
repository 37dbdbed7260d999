// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors fall into three families. Configuration errors are raised before
/// any document is touched and are never retried. Structure errors reject a
/// malformed envelope; the input document is left exactly as handed in.
/// Service errors propagate from the KMS as-is, without retry or backoff.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller misuse, the moral equivalent of a failed precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("invalid credential set: {0}")]
    InvalidCredential(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed envelope: {0}")]
    Structure(String),

    #[error("KMS service error: {0}")]
    Kms(#[from] kms::Error),

    #[error("content cipher failed: {0}")]
    Crypto(String),

    #[error("unsupported capability: {0}")]
    Unsupported(&'static str),
}
