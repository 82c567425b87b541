// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::pattern::PathParams;
use super::registry::MatchedRoute;
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::session::{Session, SessionIdentity};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;

pub type HandlerFuture = LocalBoxFuture<'static, Result<HttpResponse, ApiError>>;

/// Route handlers are plain function values.
pub type Handler = fn(RouteContext) -> HandlerFuture;

/// Everything a handler needs about the request it serves.
pub struct RouteContext {
    pub state: web::Data<AppState>,
    pub request: HttpRequest,
    pub session: Session,
    pub params: PathParams,
    pub body: web::Bytes,
}

impl RouteContext {
    pub fn param(&self, name: &str) -> Result<&str, ApiError> {
        self.params
            .get(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Missing path parameter '{}'", name)))
    }

    /// The authenticated caller. Public routes may be reached without one.
    pub fn caller(&self) -> Result<SessionIdentity<'_>, ApiError> {
        self.session
            .identity()
            .ok_or_else(|| ApiError::Unauthenticated("Authentication required".to_string()))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if self.body.is_empty() {
            return Err(ApiError::BadRequest("Request body is required".to_string()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
    }
}

/// Sends every request to the registry dispatcher.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.default_service(web::to(dispatch));
}

async fn dispatch(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let matched = req.extensions_mut().remove::<MatchedRoute>();
    let Some(matched) = matched else {
        log::error!(
            "{} {} reached the dispatcher without passing the permission enforcer",
            req.method(),
            req.path()
        );
        return Err(ApiError::Internal("Request was not authorized".to_string()));
    };
    let session = req
        .extensions_mut()
        .remove::<Session>()
        .unwrap_or_default();

    log::debug!(
        "Dispatching {} {} to {}",
        req.method(),
        req.path(),
        matched.route.pattern
    );

    let ctx = RouteContext {
        state,
        request: req,
        session,
        params: matched.params,
        body,
    };
    (matched.route.handler)(ctx).await
}
