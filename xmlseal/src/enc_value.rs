// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Password-based protection for credential property values.
//!
//! A protected value reads `ENC(base64(salt ‖ nonce ‖ ciphertext))`. The
//! key is derived from the password with Argon2 over the stored salt and
//! the payload is sealed with AES-256-GCM, so a tampered value fails
//! authentication instead of yielding garbage.

use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::Zeroizing;

use crypto::{ContentAlgorithm, GCM_IV_LENGTH};

use crate::credentials::{ENC_END_MARKER, ENC_START_MARKER};
use crate::{Error, Result};

const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;

pub(crate) fn is_marked(value: &str) -> bool {
    value.starts_with(ENC_START_MARKER) && value.ends_with(ENC_END_MARKER)
}

/// Recovers the clear value. Unmarked values pass through unchanged, as do
/// marked values when no password is available (the source behavior: the
/// value is then used exactly as written, markers included).
pub(crate) fn reveal(value: &str, password: Option<&str>) -> Result<String> {
    match password {
        Some(password) if is_marked(value) => {
            let payload = &value[ENC_START_MARKER.len()..value.len() - ENC_END_MARKER.len()];
            decrypt_value(payload, password)
        }
        _ => Ok(value.to_owned()),
    }
}

/// Seals a clear value under `password`, producing the `ENC(...)` form.
pub fn conceal(value: &str, password: &str) -> Result<String> {
    let salt = crypto::rand::random_bytes::<SALT_LENGTH>();
    let nonce = crypto::rand::random_bytes::<GCM_IV_LENGTH>();
    let key = derive_key(password.as_bytes(), &salt)?;

    let ciphertext = crypto::encrypt(
        key,
        value.as_bytes().to_vec(),
        nonce.clone(),
        ContentAlgorithm::Aes256Gcm,
    )
    .map_err(|e| Error::Config(format!("conceal credential value failed: {e}")))?;

    let mut payload = salt;
    payload.extend(nonce);
    payload.extend(ciphertext);

    Ok(format!(
        "{ENC_START_MARKER}{}{ENC_END_MARKER}",
        STANDARD.encode(payload)
    ))
}

fn decrypt_value(payload: &str, password: &str) -> Result<String> {
    let payload = STANDARD
        .decode(payload)
        .map_err(|e| Error::Config(format!("base64 decode protected value failed: {e}")))?;
    if payload.len() <= SALT_LENGTH + GCM_IV_LENGTH {
        return Err(Error::Config("protected value is truncated".to_string()));
    }

    let (salt, rest) = payload.split_at(SALT_LENGTH);
    let (nonce, ciphertext) = rest.split_at(GCM_IV_LENGTH);
    let key = derive_key(password.as_bytes(), salt)?;

    let clear = crypto::decrypt(
        key,
        ciphertext.to_vec(),
        nonce.to_vec(),
        ContentAlgorithm::Aes256Gcm,
    )
    .map_err(|_| Error::Config("protected value did not decrypt; wrong password?".to_string()))?;

    String::from_utf8(clear).map_err(|_| Error::Config("protected value is not UTF-8".to_string()))
}

fn derive_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut key = Zeroizing::new(vec![0u8; KEY_LENGTH]);
    Argon2::default()
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| Error::Config(format!("derive key from password failed: {e}")))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{conceal, is_marked, reveal};

    #[test]
    fn conceal_reveal_round_trip() {
        let concealed = conceal("kst-bjj6-master", "password").unwrap();
        assert!(is_marked(&concealed));

        let revealed = reveal(&concealed, Some("password")).unwrap();
        assert_eq!(revealed, "kst-bjj6-master");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let concealed = conceal("kst-bjj6-master", "password").unwrap();
        assert!(matches!(
            reveal(&concealed, Some("nope")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn unmarked_values_pass_through() {
        assert_eq!(
            reveal("alias/payroll", Some("password")).unwrap(),
            "alias/payroll"
        );
    }

    #[test]
    fn marked_values_without_password_pass_through() {
        let concealed = conceal("secret", "password").unwrap();
        assert_eq!(reveal(&concealed, None).unwrap(), concealed);
    }
}
