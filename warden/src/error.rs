// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::iam::Denied;
use crate::login::{LoginError, ProviderError};
use crate::session::SessionError;
use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

/// Stable machine-readable codes carried in every error body.
pub mod error_code {
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
    pub const UPSTREAM: &str = "UPSTREAM_FAILURE";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Error returned by route handlers and the permission enforcer.
///
/// Renders as `{"code": "...", "message": "..."}` with the matching status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthenticated(String),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed(String),
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => error_code::UNAUTHENTICATED,
            ApiError::Forbidden(_) => error_code::FORBIDDEN,
            ApiError::BadRequest(_) => error_code::BAD_REQUEST,
            ApiError::NotFound(_) => error_code::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => error_code::METHOD_NOT_ALLOWED,
            ApiError::Upstream(_) => error_code::UPSTREAM,
            ApiError::Internal(_) => error_code::INTERNAL,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::Upstream(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "code": self.code(),
            "message": self.message(),
        }))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("Not found: {}", what)),
            StoreError::AlreadyExists(what) => {
                ApiError::BadRequest(format!("Already exists: {}", what))
            }
            other => {
                log::error!("Store failure: {}", other);
                ApiError::Internal("Internal storage error".to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        log::error!("Session failure: {}", err);
        ApiError::Internal("Failed to issue session".to_string())
    }
}

impl From<Denied> for ApiError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => ApiError::Unauthenticated("Authentication required".to_string()),
            Denied::Forbidden => ApiError::Forbidden("Insufficient permissions".to_string()),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidState(msg) | LoginError::InvalidCallback(msg) => {
                ApiError::BadRequest(msg)
            }
            LoginError::Provider(ProviderError::InvalidProfile(msg)) => ApiError::BadRequest(msg),
            LoginError::Provider(other) => ApiError::Upstream(other.to_string()),
            LoginError::Provisioning(store_err) => ApiError::from(store_err),
        }
    }
}
