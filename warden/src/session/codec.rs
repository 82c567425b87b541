// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::Session;
use crate::config::SessionConfig;
use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE_NAME: &str = "warden_session";
const SESSION_ISSUER: &str = "warden";

#[derive(Debug, Clone)]
pub enum SessionError {
    Encode(String),
    Decode(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Encode(msg) => write!(f, "Session encode error: {}", msg),
            SessionError::Decode(msg) => write!(f, "Session decode error: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    session: Session,
    iat: i64,
    exp: i64,
    iss: String,
}

/// Signs sessions into HS256 tokens and carries them in an HTTP-only cookie.
pub struct SessionCodec {
    secret: String,
    expiration_hours: u64,
    secure: bool,
}

impl SessionCodec {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            expiration_hours: config.expiration_hours,
            secure: config.secure_cookie,
        }
    }

    pub fn cookie_name(&self) -> &'static str {
        SESSION_COOKIE_NAME
    }

    fn expires_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SessionError> {
        i64::try_from(self.expiration_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                SessionError::Encode(format!(
                    "session lifetime of {} hours is out of range",
                    self.expiration_hours
                ))
            })
    }

    pub fn encode(&self, session: &Session) -> Result<String, SessionError> {
        let now = Utc::now();
        let expiration = self.expires_at(now)?;
        let claims = SessionClaims {
            session: session.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: SESSION_ISSUER.to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| SessionError::Encode(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Session, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SESSION_ISSUER]);

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|e| SessionError::Decode(e.to_string()))?;

        Ok(data.claims.session)
    }

    /// Reads the session carried by a request. A missing, tampered or
    /// expired cookie yields a fresh empty session.
    pub fn load(&self, req: &HttpRequest) -> Session {
        let Some(cookie) = req.cookie(SESSION_COOKIE_NAME) else {
            return Session::new();
        };
        match self.decode(cookie.value()) {
            Ok(session) => session,
            Err(err) => {
                log::debug!("Discarding session cookie: {}", err);
                Session::new()
            }
        }
    }

    pub fn cookie(&self, session: &Session) -> Result<Cookie<'static>, SessionError> {
        let token = self.encode(session)?;
        let expiration = self.expires_at(Utc::now())?;

        let expires = match actix_web::cookie::time::OffsetDateTime::from_unix_timestamp(
            expiration.timestamp(),
        ) {
            Ok(val) => val,
            Err(e) => {
                log::error!("Failed to convert session cookie expiration: {}", e);
                actix_web::cookie::time::OffsetDateTime::UNIX_EPOCH
            }
        };

        Ok(Cookie::build(SESSION_COOKIE_NAME, token)
            .path("/")
            .secure(self.secure)
            .http_only(true)
            .same_site(SameSite::Lax)
            .expires(expires)
            .finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;
    use actix_web::test::TestRequest;

    fn codec(secret: &str) -> SessionCodec {
        codec_with_lifetime(secret, 1)
    }

    fn codec_with_lifetime(secret: &str, expiration_hours: u64) -> SessionCodec {
        SessionCodec::new(&SessionConfig {
            secret: secret.to_string(),
            expiration_hours,
            secure_cookie: false,
        })
    }

    #[test]
    fn authenticated_session_survives_the_cookie() {
        let codec = codec("0123456789abcdef0123456789abcdef");
        let mut session = Session::new();
        session.authenticate("w.narchi", Role::Admin);

        let cookie = codec.cookie(&session).expect("cookie");
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));

        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(codec.load(&req), session);
    }

    #[test]
    fn token_signed_with_another_secret_is_ignored() {
        let mut session = Session::new();
        session.authenticate("mallory", Role::Admin);
        let forged = codec("ffffffffffffffffffffffffffffffff")
            .encode(&session)
            .expect("token");

        let codec = codec("0123456789abcdef0123456789abcdef");
        assert!(codec.decode(&forged).is_err());

        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE_NAME, forged))
            .to_http_request();
        assert!(!codec.load(&req).is_authenticated());
    }

    #[test]
    fn garbage_cookie_yields_empty_session() {
        let codec = codec("0123456789abcdef0123456789abcdef");
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE_NAME, "not-a-token"))
            .to_http_request();
        assert_eq!(codec.load(&req), Session::new());
    }

    #[test]
    fn out_of_range_lifetime_is_an_encode_error() {
        let session = Session::new();
        for hours in [10_000_000_000, u64::MAX] {
            let codec = codec_with_lifetime("0123456789abcdef0123456789abcdef", hours);
            assert!(matches!(codec.encode(&session), Err(SessionError::Encode(_))));
            assert!(matches!(codec.cookie(&session), Err(SessionError::Encode(_))));
        }
    }
}
