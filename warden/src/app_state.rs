// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::config::ValidatedConfig;
use crate::login::{LoginFlow, OAuthProvider};
use crate::routes::{RegistryError, RouteRegistry, build_registry};
use crate::session::SessionCodec;
use crate::store::UserStore;

pub struct AppState {
    pub config: Arc<ValidatedConfig>,
    pub registry: RouteRegistry,
    pub store: Arc<dyn UserStore>,
    pub sessions: SessionCodec,
    pub login: LoginFlow,
}

impl AppState {
    pub fn new(
        config: ValidatedConfig,
        store: Arc<dyn UserStore>,
        provider: Arc<dyn OAuthProvider>,
    ) -> Result<Self, RegistryError> {
        let registry = build_registry()?;
        let sessions = SessionCodec::new(&config.session);
        let login = LoginFlow::new(provider, config.oauth.landing_url.clone());

        Ok(Self {
            config: Arc::new(config),
            registry,
            store,
            sessions,
            login,
        })
    }
}
