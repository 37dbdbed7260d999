// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use serde::{Deserialize, Serialize};

/// Serialized [`crate::ProviderSettings`] of the REST provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestProviderSettings {
    pub access_identity: String,
    pub endpoint: String,
}
