// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::github::OAuthProvider;
use super::provisioning::get_or_create;
use super::types::{CallbackQuery, LoginError, ProviderError};
use crate::session::{LoginPhase, OAuthState, Session};
use crate::store::{User, UserStore};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use std::sync::Arc;

/// Seconds an issued login state stays valid.
pub const LOGIN_STATE_TTL_SECONDS: i64 = 600;
const STATE_BYTES: usize = 24;

/// Drives the GitHub authorization-code handshake for one session.
pub struct LoginFlow {
    provider: Arc<dyn OAuthProvider>,
    landing_url: String,
}

impl LoginFlow {
    pub fn new(provider: Arc<dyn OAuthProvider>, landing_url: String) -> Self {
        Self {
            provider,
            landing_url,
        }
    }

    pub fn landing_url(&self) -> &str {
        &self.landing_url
    }

    /// Issues a fresh state into the session and returns the provider URL
    /// the browser should be redirected to.
    pub fn begin(&self, session: &mut Session) -> String {
        let from = session.login_phase();
        let state = generate_state();
        session.issue_oauth_state(state.clone(), Utc::now().timestamp());
        log_transition(from, LoginPhase::StateIssued);
        self.provider.authorize_url(&state)
    }

    /// Verifies the callback and, on success, authenticates the session.
    ///
    /// The pending state is consumed whatever the outcome. The session gains
    /// an identity only once every step has succeeded.
    ///
    /// Sessions live only in the client cookie, so single use is enforced
    /// on the session the caller presents. A client that replays its cookie
    /// from before the callback, within `LOGIN_STATE_TTL_SECONDS`, passes the
    /// state check again; only the provider refusing the already redeemed
    /// authorization code stops that second attempt.
    pub async fn complete(
        &self,
        session: &mut Session,
        query: &CallbackQuery,
        store: &dyn UserStore,
    ) -> Result<User, LoginError> {
        let from = session.login_phase();
        let stored = session.take_oauth_state();
        log_transition(from, LoginPhase::CallbackPending);

        let result = self.finish(stored, query, store).await;
        match &result {
            Ok(user) => {
                let session_id = session.authenticate(user.username.clone(), user.role);
                log_transition(LoginPhase::CallbackPending, LoginPhase::Authenticated);
                log::info!(
                    "User {} logged in via GitHub (role {}, session {})",
                    user.username,
                    user.role,
                    session_id
                );
            }
            Err(err) => {
                log_transition(LoginPhase::CallbackPending, LoginPhase::Rejected);
                log::warn!("GitHub login rejected: {}", err);
            }
        }
        result
    }

    async fn finish(
        &self,
        stored: Option<OAuthState>,
        query: &CallbackQuery,
        store: &dyn UserStore,
    ) -> Result<User, LoginError> {
        let stored = stored.ok_or_else(|| {
            LoginError::InvalidState("no login is in progress for this session".to_string())
        })?;

        let age = Utc::now().timestamp() - stored.issued_at;
        if !(0..=LOGIN_STATE_TTL_SECONDS).contains(&age) {
            return Err(LoginError::InvalidState("login state has expired".to_string()));
        }

        let received = query.state.as_deref().unwrap_or_default();
        if !constant_time_eq(received.as_bytes(), stored.value.as_bytes()) {
            return Err(LoginError::InvalidState("state does not match".to_string()));
        }

        if let Some(error) = query.error.as_deref() {
            let detail = query.error_description.as_deref().unwrap_or(error);
            return Err(LoginError::InvalidCallback(format!(
                "provider returned '{}': {}",
                error, detail
            )));
        }

        let code = query
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| LoginError::InvalidCallback("missing authorization code".to_string()))?;

        let token = self.provider.exchange_code(code).await?;
        let profile = self.provider.fetch_profile(&token).await?;
        if profile.login.trim().is_empty() {
            return Err(ProviderError::InvalidProfile("profile has an empty login".to_string()).into());
        }

        Ok(get_or_create(store, &profile)?)
    }
}

fn log_transition(from: LoginPhase, to: LoginPhase) {
    log::debug!("Login phase {} -> {}", from, to);
}

pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::types::{AccessToken, ProviderProfile};
    use crate::roles::Role;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        exchanges: AtomicUsize,
        login: String,
        fail_exchange: bool,
    }

    impl StubProvider {
        fn new(login: &str) -> Self {
            Self {
                exchanges: AtomicUsize::new(0),
                login: login.to_string(),
                fail_exchange: false,
            }
        }
    }

    #[async_trait]
    impl OAuthProvider for StubProvider {
        fn authorize_url(&self, state: &str) -> String {
            format!("https://provider.test/authorize?state={}", state)
        }

        async fn exchange_code(&self, _code: &str) -> Result<AccessToken, ProviderError> {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            if self.fail_exchange {
                return Err(ProviderError::Rejected("bad_verification_code".to_string()));
            }
            Ok(AccessToken("token".to_string()))
        }

        async fn fetch_profile(
            &self,
            _token: &AccessToken,
        ) -> Result<ProviderProfile, ProviderError> {
            Ok(ProviderProfile {
                login: self.login.clone(),
                email: Some(format!("{}@example.com", self.login)),
                name: None,
            })
        }
    }

    fn callback(state: &str, code: &str) -> CallbackQuery {
        CallbackQuery {
            state: Some(state.to_string()),
            code: Some(code.to_string()),
            ..CallbackQuery::default()
        }
    }

    fn issued_state(session: &Session) -> String {
        session.oauth_state().expect("state").value.clone()
    }

    #[test]
    fn generated_states_are_url_safe_and_distinct() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert!(a.len() >= 22);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn begin_issues_state_into_session() {
        let flow = LoginFlow::new(Arc::new(StubProvider::new("octocat")), "/".to_string());
        let mut session = Session::new();

        let url = flow.begin(&mut session);

        assert_eq!(session.login_phase(), LoginPhase::StateIssued);
        assert!(url.ends_with(&issued_state(&session)));
    }

    #[actix_web::test]
    async fn matching_state_authenticates() {
        let provider = Arc::new(StubProvider::new("octocat"));
        let flow = LoginFlow::new(provider.clone(), "/".to_string());
        let store = MemoryStore::new();
        let mut session = Session::new();
        flow.begin(&mut session);
        let state = issued_state(&session);

        let user = flow
            .complete(&mut session, &callback(&state, "code"), &store)
            .await
            .expect("login");

        assert_eq!(user.username, "octocat");
        assert_eq!(user.role, Role::User);
        assert_eq!(session.username(), Some("octocat"));
        assert_eq!(session.login_phase(), LoginPhase::Authenticated);
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn mismatching_state_never_reaches_the_provider() {
        let provider = Arc::new(StubProvider::new("octocat"));
        let flow = LoginFlow::new(provider.clone(), "/".to_string());
        let store = MemoryStore::new();
        let mut session = Session::new();
        flow.begin(&mut session);

        let err = flow
            .complete(&mut session, &callback("forged", "code"), &store)
            .await
            .unwrap_err();

        assert!(matches!(err, LoginError::InvalidState(_)));
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
        assert!(!session.is_authenticated());
        assert!(session.oauth_state().is_none());
        assert_eq!(store.mutation_count(), 0);
    }

    #[actix_web::test]
    async fn state_cannot_be_used_twice() {
        let provider = Arc::new(StubProvider::new("octocat"));
        let flow = LoginFlow::new(provider.clone(), "/".to_string());
        let store = MemoryStore::new();
        let mut session = Session::new();
        flow.begin(&mut session);
        let state = issued_state(&session);
        let mut replayed = session.clone();

        flow.complete(&mut session, &callback(&state, "code"), &store)
            .await
            .expect("first login");
        let err = flow
            .complete(&mut session, &callback(&state, "code"), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::InvalidState(_)));

        // A copy taken before the first callback still holds the state but
        // is refused once it has aged past the TTL.
        let stale = replayed.take_oauth_state().expect("state");
        replayed.issue_oauth_state(stale.value, stale.issued_at - LOGIN_STATE_TTL_SECONDS - 1);
        let err = flow
            .complete(&mut replayed, &callback(&state, "code"), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::InvalidState(_)));
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn fresh_pre_callback_copy_reaches_provider_again() {
        let provider = Arc::new(StubProvider::new("octocat"));
        let flow = LoginFlow::new(provider.clone(), "/".to_string());
        let store = MemoryStore::new();
        let mut session = Session::new();
        flow.begin(&mut session);
        let state = issued_state(&session);
        let mut replayed = session.clone();

        flow.complete(&mut session, &callback(&state, "code"), &store)
            .await
            .expect("first login");
        flow.complete(&mut replayed, &callback(&state, "code"), &store)
            .await
            .expect("state still valid in the copy");

        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 2);
        assert!(replayed.oauth_state().is_none());
    }

    #[actix_web::test]
    async fn missing_code_is_rejected_before_exchange() {
        let provider = Arc::new(StubProvider::new("octocat"));
        let flow = LoginFlow::new(provider.clone(), "/".to_string());
        let store = MemoryStore::new();
        let mut session = Session::new();
        flow.begin(&mut session);
        let state = issued_state(&session);

        let err = flow
            .complete(&mut session, &callback(&state, ""), &store)
            .await
            .unwrap_err();

        assert!(matches!(err, LoginError::InvalidCallback(_)));
        assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn provider_failure_leaves_session_anonymous() {
        let provider = Arc::new(StubProvider {
            fail_exchange: true,
            ..StubProvider::new("octocat")
        });
        let flow = LoginFlow::new(provider, "/".to_string());
        let store = MemoryStore::new();
        let mut session = Session::new();
        flow.begin(&mut session);
        let state = issued_state(&session);

        let err = flow
            .complete(&mut session, &callback(&state, "code"), &store)
            .await
            .unwrap_err();

        assert!(matches!(err, LoginError::Provider(ProviderError::Rejected(_))));
        assert!(!session.is_authenticated());
        assert_eq!(store.mutation_count(), 0);
    }

    #[test]
    fn constant_time_eq_compares_content_and_length() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"a"));
    }
}
