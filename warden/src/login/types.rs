// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::store::StoreError;
use serde::{Deserialize, Serialize};

/// Query string the provider sends back to the redirect URL.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// The subset of the provider's user document we rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network failure, timeout or an unexpected HTTP status.
    Transport(String),
    /// The provider answered but refused the request.
    Rejected(String),
    /// The profile document could not be decoded.
    InvalidProfile(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "Provider unreachable: {}", msg),
            ProviderError::Rejected(msg) => write!(f, "Provider rejected the request: {}", msg),
            ProviderError::InvalidProfile(msg) => write!(f, "Invalid provider profile: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Missing, expired or mismatching anti-forgery state.
    InvalidState(String),
    /// Callback without a usable authorization code.
    InvalidCallback(String),
    Provider(ProviderError),
    Provisioning(StoreError),
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginError::InvalidState(msg) => write!(f, "Invalid login state: {}", msg),
            LoginError::InvalidCallback(msg) => write!(f, "Invalid login callback: {}", msg),
            LoginError::Provider(err) => write!(f, "{}", err),
            LoginError::Provisioning(err) => write!(f, "User provisioning failed: {}", err),
        }
    }
}

impl std::error::Error for LoginError {}

impl From<ProviderError> for LoginError {
    fn from(err: ProviderError) -> Self {
        LoginError::Provider(err)
    }
}

impl From<StoreError> for LoginError {
    fn from(err: StoreError) -> Self {
        LoginError::Provisioning(err)
    }
}
