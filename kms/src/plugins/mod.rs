// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use strum::{AsRefStr, EnumString};

use crate::{DataKeyGenerator, DataKeyUnwrapper, Error, ProviderSettings, Result};

#[cfg(feature = "keyring")]
pub mod keyring;

#[cfg(feature = "rest")]
pub mod rest;

#[derive(AsRefStr, EnumString)]
pub enum KmsProvider {
    #[cfg(feature = "keyring")]
    #[strum(ascii_case_insensitive)]
    Keyring,

    #[cfg(feature = "rest")]
    #[strum(ascii_case_insensitive)]
    Rest,
}

/// Create a new [`DataKeyGenerator`] by given provider name and
/// [`ProviderSettings`].
pub async fn new_generator(
    provider_name: &str,
    _provider_settings: ProviderSettings,
) -> Result<Box<dyn DataKeyGenerator>> {
    let provider = KmsProvider::try_from(provider_name)
        .map_err(|_| Error::UnsupportedProvider(provider_name.to_string()))?;
    match provider {
        #[cfg(feature = "keyring")]
        KmsProvider::Keyring => Ok(Box::new(
            keyring::KeyringKms::from_provider_settings(&_provider_settings).await?,
        ) as Box<dyn DataKeyGenerator>),

        #[cfg(feature = "rest")]
        KmsProvider::Rest => Ok(Box::new(
            rest::RestKmsClient::from_provider_settings(&_provider_settings).await?,
        ) as Box<dyn DataKeyGenerator>),
    }
}

/// Create a new [`DataKeyUnwrapper`] by given provider name and
/// [`ProviderSettings`].
pub async fn new_unwrapper(
    provider_name: &str,
    _provider_settings: ProviderSettings,
) -> Result<Box<dyn DataKeyUnwrapper>> {
    let provider = KmsProvider::try_from(provider_name)
        .map_err(|_| Error::UnsupportedProvider(provider_name.to_string()))?;
    match provider {
        #[cfg(feature = "keyring")]
        KmsProvider::Keyring => Ok(Box::new(
            keyring::KeyringKms::from_provider_settings(&_provider_settings).await?,
        ) as Box<dyn DataKeyUnwrapper>),

        #[cfg(feature = "rest")]
        KmsProvider::Rest => Ok(Box::new(
            rest::RestKmsClient::from_provider_settings(&_provider_settings).await?,
        ) as Box<dyn DataKeyUnwrapper>),
    }
}
