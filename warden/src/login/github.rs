// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{AccessToken, ProviderError, ProviderProfile, TokenResponse};
use crate::config::OAuthConfig;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;

/// OAuth2 authorization-code provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the browser is sent to, carrying the anti-forgery `state`.
    fn authorize_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError>;

    async fn fetch_profile(&self, token: &AccessToken) -> Result<ProviderProfile, ProviderError>;
}

pub struct GithubProvider {
    config: OAuthConfig,
    client: Client,
}

impl GithubProvider {
    pub fn new(config: OAuthConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("warden/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn authorize_url(&self, state: &str) -> String {
        build_authorize_url(&self.config, state)
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Transport(format!("invalid token response: {}", err)))?;

        if let Some(error) = body.error {
            let detail = body.error_description.unwrap_or_default();
            return Err(ProviderError::Rejected(if detail.is_empty() {
                error
            } else {
                format!("{}: {}", error, detail)
            }));
        }

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken(token)),
            _ => Err(ProviderError::Rejected(
                "token response carried no access_token".to_string(),
            )),
        }
    }

    async fn fetch_profile(&self, token: &AccessToken) -> Result<ProviderProfile, ProviderError> {
        let response = self
            .client
            .get(&self.config.user_info_url)
            .header(ACCEPT, "application/vnd.github+json")
            .bearer_auth(&token.0)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        parse_profile(&body)
    }
}

pub(crate) fn build_authorize_url(config: &OAuthConfig, state: &str) -> String {
    let separator = if config.authorize_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}client_id={}&redirect_uri={}&scope={}&state={}&response_type=code",
        config.authorize_url,
        separator,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_url),
        urlencoding::encode(&config.scopes.join(" ")),
        urlencoding::encode(state),
    )
}

pub(crate) fn parse_profile(body: &[u8]) -> Result<ProviderProfile, ProviderError> {
    let profile: ProviderProfile = serde_json::from_slice(body)
        .map_err(|err| ProviderError::InvalidProfile(err.to_string()))?;
    if profile.login.trim().is_empty() {
        return Err(ProviderError::InvalidProfile(
            "profile has an empty login".to_string(),
        ));
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_authorize_url, default_token_url, default_user_info_url};

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "Ov23libSvpfP4mzgI5LD".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "http://localhost:4848/login/github/callback".to_string(),
            landing_url: "http://localhost:9090/".to_string(),
            scopes: vec!["user".to_string()],
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            user_info_url: default_user_info_url(),
            timeout_seconds: 10,
        }
    }

    #[test]
    fn authorize_url_carries_all_parameters() {
        let url = build_authorize_url(&config(), "abc-_123");
        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=Ov23libSvpfP4mzgI5LD"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A4848%2Flogin%2Fgithub%2Fcallback"
        ));
        assert!(url.contains("scope=user"));
        assert!(url.contains("state=abc-_123"));
        assert!(url.ends_with("response_type=code"));
    }

    #[test]
    fn profile_with_null_email_decodes() {
        let profile =
            parse_profile(br#"{"login":"octocat","email":null,"id":1}"#).expect("profile");
        assert_eq!(profile.login, "octocat");
        assert_eq!(profile.email, None);
    }

    #[test]
    fn undecodable_profile_is_invalid() {
        assert!(matches!(
            parse_profile(b"<html>"),
            Err(ProviderError::InvalidProfile(_))
        ));
        assert!(matches!(
            parse_profile(br#"{"login":""}"#),
            Err(ProviderError::InvalidProfile(_))
        ));
    }

    #[test]
    fn client_builds_with_configured_timeout() {
        assert!(GithubProvider::new(config()).is_ok());
    }
}
