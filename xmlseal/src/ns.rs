// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! XML namespace, element and attribute constants of the envelope format.

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML Encryption namespace
pub const ENC: &str = "http://www.w3.org/2001/04/xmlenc#";

/// Encryption scope: the content of the target element was encrypted.
pub const ENC_TYPE_CONTENT: &str = "http://www.w3.org/2001/04/xmlenc#Content";

/// Encryption scope: the target element itself was encrypted. Recognized
/// but not produced.
pub const ENC_TYPE_ELEMENT: &str = "http://www.w3.org/2001/04/xmlenc#Element";

/// Prefix used for XML-DSig elements in generated fragments.
pub const SIG_PREFIX: &str = "ds";

/// Prefix used for XML-Enc elements in generated fragments.
pub const ENC_PREFIX: &str = "xenc";

pub mod node {
    pub const ENCRYPTED_DATA: &str = "EncryptedData";
    pub const ENCRYPTED_KEY: &str = "EncryptedKey";
    pub const ENCRYPTION_METHOD: &str = "EncryptionMethod";
    pub const CIPHER_DATA: &str = "CipherData";
    pub const CIPHER_VALUE: &str = "CipherValue";
    pub const KEY_INFO: &str = "KeyInfo";
    pub const KEY_NAME: &str = "KeyName";
}

pub mod attr {
    pub const ID: &str = "Id";
    pub const TYPE: &str = "Type";
    pub const ALGORITHM: &str = "Algorithm";
}
