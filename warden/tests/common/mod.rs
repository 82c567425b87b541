// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use warden::app_state::AppState;
use warden::iam::PermissionEnforcer;
use warden::login::{AccessToken, OAuthProvider, ProviderError, ProviderProfile};
use warden::roles::Role;
use warden::routes;
use warden::session::{SESSION_COOKIE_NAME, Session};
use warden::store::{MemoryStore, User};
use warden::util::test_config;

pub const ADMIN: &str = "root.admin";
pub const MODERATOR: &str = "mod.erator";
pub const USER: &str = "jan";
pub const OTHER_USER: &str = "piet";
pub const GITHUB_LOGIN: &str = "octocat";

/// OAuth provider double that counts token exchanges.
pub struct FakeProvider {
    pub exchanges: AtomicUsize,
    pub profile_fetches: AtomicUsize,
    login: String,
}

impl FakeProvider {
    pub fn new(login: &str) -> Self {
        Self {
            exchanges: AtomicUsize::new(0),
            profile_fetches: AtomicUsize::new(0),
            login: login.to_string(),
        }
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "https://github.test/login/oauth/authorize?client_id=test-client-id&state={}",
            state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if code == "bad-code" {
            return Err(ProviderError::Rejected(
                "bad_verification_code".to_string(),
            ));
        }
        Ok(AccessToken(format!("token-for-{}", code)))
    }

    async fn fetch_profile(&self, _token: &AccessToken) -> Result<ProviderProfile, ProviderError> {
        self.profile_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderProfile {
            login: self.login.clone(),
            email: Some(format!("{}@users.noreply.github.com", self.login)),
            name: Some("The Octocat".to_string()),
        })
    }
}

pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeProvider>,
    pub state: web::Data<AppState>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_users(default_users())
    }

    pub fn with_users(users: Vec<User>) -> Self {
        let store = Arc::new(MemoryStore::from_users(users));
        let provider = Arc::new(FakeProvider::new(GITHUB_LOGIN));
        let state = AppState::new(test_config(), store.clone(), provider.clone())
            .expect("app state");
        Self {
            store,
            provider,
            state: web::Data::new(state),
        }
    }

    /// Signed session cookie for an already authenticated caller.
    pub fn session_cookie(&self, username: &str, role: Role) -> Cookie<'static> {
        let mut session = Session::new();
        session.authenticate(username, role);
        self.state.sessions.cookie(&session).expect("session cookie")
    }

    pub fn admin_cookie(&self) -> Cookie<'static> {
        self.session_cookie(ADMIN, Role::Admin)
    }

    pub fn moderator_cookie(&self) -> Cookie<'static> {
        self.session_cookie(MODERATOR, Role::Moderator)
    }

    pub fn user_cookie(&self) -> Cookie<'static> {
        self.session_cookie(USER, Role::User)
    }
}

pub fn user(username: &str, role: Role) -> User {
    User {
        username: username.to_string(),
        name: format!("{} name", username),
        email: format!("{}@example.com", username),
        role,
    }
}

pub fn default_users() -> Vec<User> {
    vec![
        user(ADMIN, Role::Admin),
        user(MODERATOR, Role::Moderator),
        user(USER, Role::User),
        user(OTHER_USER, Role::User),
    ]
}

pub fn build_test_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(PermissionEnforcer)
        .configure(routes::configure)
}

/// The session cookie set on a response, if any.
pub fn session_cookie_from<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
        .to_string()
}

/// Extracts the `state` query parameter from a provider authorization URL.
pub fn state_param(url: &str) -> String {
    let (_, query) = url.split_once('?').expect("query string");
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("state="))
        .expect("state parameter")
        .to_string()
}
