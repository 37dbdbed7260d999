// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! # XmlSeal
//!
//! Envelope encryption for XML documents. A per-document data key is
//! minted by a KMS, used once to encrypt the content of the document's
//! root element, and embedded alongside the ciphertext wrapped under a
//! long-lived master key:
//!
//! ```text
//! <PurchaseOrder>                     <PurchaseOrder>
//!   <Items>...</Items>        =>        <xenc:EncryptedData ...>
//!   <ShipTo>...</ShipTo>                  ... <xenc:EncryptedKey .../> ...
//! </PurchaseOrder>                      </xenc:EncryptedData>
//!                                     </PurchaseOrder>
//! ```
//!
//! Any holder of unwrap permission on the master key can later recover
//! the data key from the embedded `EncryptedKey` and restore the
//! document. Cipher primitives live in the `crypto` crate and the KMS
//! round-trips in the `kms` crate; this crate owns the protocol gluing
//! them together and the exact XML structure that makes an encrypted
//! document self-describing.

pub mod credentials;
pub mod decryptor;
pub mod encrypted_key;
pub mod encryptor;
pub mod error;
pub mod ns;
pub mod scheme;
pub mod session_key;

mod document;
mod enc_value;

pub use credentials::CredentialSet;
pub use decryptor::DocumentDecryptor;
pub use enc_value::conceal;
pub use encrypted_key::EncryptedKeyFactory;
pub use encryptor::DocumentEncryptor;
pub use error::*;
pub use scheme::{new_scheme, EncryptionScheme};
pub use session_key::{KeyReference, SecretKeyInfo, SecretKeyInfoFactory};

pub use kms::ProviderSettings;
