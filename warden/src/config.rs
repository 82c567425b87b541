// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable carrying the OAuth client secret.
pub const GITHUB_SECRET_ENV: &str = "GITHUB_SECRET";
pub const MIN_SESSION_SECRET_CHARS: usize = 32;
const MAX_OAUTH_TIMEOUT_SECONDS: u64 = 120;
pub const MAX_SESSION_EXPIRATION_HOURS: u64 = 8760;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub oauth: OAuthSettings,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub oauth: OAuthConfig,
    pub data_file: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl ServerConfig {
    pub fn address_tuple(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub secret: String,
    #[serde(default = "default_session_expiration_hours")]
    pub expiration_hours: u64,
    #[serde(default = "default_secure_cookie")]
    pub secure_cookie: bool,
}

fn default_session_expiration_hours() -> u64 {
    12
}

fn default_secure_cookie() -> bool {
    true
}

/// OAuth section as written in config.yaml. The client secret is never
/// read from the file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub redirect_url: String,
    pub landing_url: String,
    #[serde(default = "default_oauth_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_user_info_url")]
    pub user_info_url: String,
    #[serde(default = "default_oauth_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Provider configuration with the client secret resolved. Built once at
/// startup and handed to the login flow.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub landing_url: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .field("landing_url", &self.landing_url)
            .field("scopes", &self.scopes)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("user_info_url", &self.user_info_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn default_oauth_scopes() -> Vec<String> {
    vec!["user".to_string()]
}

pub fn default_authorize_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

pub fn default_token_url() -> String {
    "https://github.com/login/oauth/access_token".to_string()
}

pub fn default_user_info_url() -> String {
    "https://api.github.com/user".to_string()
}

fn default_oauth_timeout_seconds() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

fn default_data_file() -> String {
    "data.yaml".to_string()
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.yaml");
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        let config = Self::load(root)?;
        let client_secret = std::env::var(GITHUB_SECRET_ENV).ok();
        config.validate(root, client_secret)
    }

    pub fn validate(
        self,
        root: &Path,
        client_secret: Option<String>,
    ) -> Result<ValidatedConfig, ConfigError> {
        let client_secret = client_secret
            .map(|secret| secret.trim().to_string())
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| {
                ConfigError::ValidationError(format!("{} is not set", GITHUB_SECRET_ENV))
            })?;

        if self.server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }

        validate_log_level(&self.logging.level)?;

        if self.session.secret.chars().count() < MIN_SESSION_SECRET_CHARS {
            return Err(ConfigError::ValidationError(format!(
                "session.secret must be at least {} characters",
                MIN_SESSION_SECRET_CHARS
            )));
        }
        if self.session.expiration_hours == 0
            || self.session.expiration_hours > MAX_SESSION_EXPIRATION_HOURS
        {
            return Err(ConfigError::ValidationError(format!(
                "session.expiration_hours must be between 1 and {}, got: {}",
                MAX_SESSION_EXPIRATION_HOURS, self.session.expiration_hours
            )));
        }

        let oauth = self.oauth;
        if oauth.client_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "oauth.client_id is required".to_string(),
            ));
        }
        for (label, url) in [
            ("oauth.redirect_url", &oauth.redirect_url),
            ("oauth.landing_url", &oauth.landing_url),
            ("oauth.authorize_url", &oauth.authorize_url),
            ("oauth.token_url", &oauth.token_url),
            ("oauth.user_info_url", &oauth.user_info_url),
        ] {
            validate_http_url(label, url)?;
        }
        if oauth.timeout_seconds == 0 || oauth.timeout_seconds > MAX_OAUTH_TIMEOUT_SECONDS {
            return Err(ConfigError::ValidationError(format!(
                "oauth.timeout_seconds must be between 1 and {}, got: {}",
                MAX_OAUTH_TIMEOUT_SECONDS, oauth.timeout_seconds
            )));
        }

        let data_file = self.storage.data_file.trim();
        if data_file.is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.data_file must not be empty".to_string(),
            ));
        }
        let data_file = if Path::new(data_file).is_absolute() {
            PathBuf::from(data_file)
        } else {
            root.join(data_file)
        };

        Ok(ValidatedConfig {
            server: self.server,
            logging: self.logging,
            session: self.session,
            oauth: OAuthConfig {
                client_id: oauth.client_id.trim().to_string(),
                client_secret,
                redirect_url: oauth.redirect_url,
                landing_url: oauth.landing_url,
                scopes: oauth.scopes,
                authorize_url: oauth.authorize_url,
                token_url: oauth.token_url,
                user_info_url: oauth.user_info_url,
                timeout_seconds: oauth.timeout_seconds,
            },
            data_file,
        })
    }
}

fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        other => Err(ConfigError::ValidationError(format!(
            "logging.level must be one of trace, debug, info, warn, error; got: {}",
            other
        ))),
    }
}

fn validate_http_url(label: &str, url: &str) -> Result<(), ConfigError> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL, got: '{}'",
            label, url
        )));
    }
    Ok(())
}
