// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use crate::config::{
    LoggingConfig, OAuthConfig, ServerConfig, SessionConfig, ValidatedConfig,
    default_authorize_url, default_token_url, default_user_info_url,
};
use std::path::PathBuf;

pub const TEST_SESSION_SECRET: &str = "test-session-secret-0123456789abcdef";
pub const TEST_LANDING_URL: &str = "http://localhost:9090/app";

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 4848,
                    workers: 1,
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                },
                session: SessionConfig {
                    secret: TEST_SESSION_SECRET.to_string(),
                    expiration_hours: 12,
                    secure_cookie: false,
                },
                oauth: OAuthConfig {
                    client_id: "test-client-id".to_string(),
                    client_secret: "test-client-secret".to_string(),
                    redirect_url: "http://localhost:4848/login/github/callback".to_string(),
                    landing_url: TEST_LANDING_URL.to_string(),
                    scopes: vec!["user".to_string()],
                    authorize_url: default_authorize_url(),
                    token_url: default_token_url(),
                    user_info_url: default_user_info_url(),
                    timeout_seconds: 5,
                },
                data_file: PathBuf::from("data.yaml"),
            },
        }
    }

    pub fn with_landing_url(mut self, url: &str) -> Self {
        self.config.oauth.landing_url = url.to_string();
        self
    }

    pub fn with_session_secret(mut self, secret: &str) -> Self {
        self.config.session.secret = secret.to_string();
        self
    }

    pub fn with_data_file(mut self, path: PathBuf) -> Self {
        self.config.data_file = path;
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}
