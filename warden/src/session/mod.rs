// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod codec;

pub use codec::{SESSION_COOKIE_NAME, SessionCodec, SessionError};

use crate::roles::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Anti-forgery value issued when a login starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    pub value: String,
    pub issued_at: i64,
}

/// Where a session stands in the GitHub login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPhase {
    Idle,
    StateIssued,
    CallbackPending,
    Authenticated,
    Rejected,
}

impl fmt::Display for LoginPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoginPhase::Idle => "idle",
            LoginPhase::StateIssued => "state-issued",
            LoginPhase::CallbackPending => "callback-pending",
            LoginPhase::Authenticated => "authenticated",
            LoginPhase::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Borrowed view of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity<'a> {
    pub username: &'a str,
    pub role: Role,
    pub session_id: Uuid,
}

/// Per-client session carried in the signed session cookie.
///
/// Identity fields are only ever written together by [`Session::authenticate`],
/// so a session is either fully authenticated or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "Username", default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(rename = "Role", default, skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(rename = "SessionID", default, skip_serializing_if = "Option::is_none")]
    session_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    oauth_state: Option<OAuthState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<SessionIdentity<'_>> {
        match (&self.username, self.role, self.session_id) {
            (Some(username), Some(role), Some(session_id)) if !username.is_empty() => {
                Some(SessionIdentity {
                    username,
                    role,
                    session_id,
                })
            }
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.identity().map(|identity| identity.username)
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }

    /// Marks the session as logged in and returns the fresh session id.
    /// Any pending login state is discarded.
    pub fn authenticate(&mut self, username: impl Into<String>, role: Role) -> Uuid {
        let session_id = Uuid::new_v4();
        self.username = Some(username.into());
        self.role = Some(role);
        self.session_id = Some(session_id);
        self.oauth_state = None;
        session_id
    }

    pub fn issue_oauth_state(&mut self, value: String, issued_at: i64) {
        self.oauth_state = Some(OAuthState { value, issued_at });
    }

    pub fn take_oauth_state(&mut self) -> Option<OAuthState> {
        self.oauth_state.take()
    }

    pub fn oauth_state(&self) -> Option<&OAuthState> {
        self.oauth_state.as_ref()
    }

    pub fn login_phase(&self) -> LoginPhase {
        if self.oauth_state.is_some() {
            LoginPhase::StateIssued
        } else if self.is_authenticated() {
            LoginPhase::Authenticated
        } else {
            LoginPhase::Idle
        }
    }
}
