// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{Access, authorize};
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::routes::RouteMatch;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web::Data,
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Loads the caller's session, resolves the route and applies its role
/// gate before anything else runs. Rejections are answered here with the
/// JSON error body; allowed requests carry the session and matched route
/// in their extensions.
pub struct PermissionEnforcer;

impl<S, B> Transform<S, ServiceRequest> for PermissionEnforcer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = PermissionEnforcerService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PermissionEnforcerService { service }))
    }
}

pub struct PermissionEnforcerService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PermissionEnforcerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(state) = req.app_data::<Data<AppState>>().cloned() else {
            log::error!("Application state missing; refusing {}", req.path());
            return reject(req, ApiError::Internal("Server misconfigured".to_string()));
        };

        let matched = match state.registry.match_route(req.method(), req.path()) {
            RouteMatch::Found(matched) => matched,
            RouteMatch::MethodNotAllowed => {
                let err = ApiError::MethodNotAllowed(format!(
                    "Method {} not allowed for {}",
                    req.method(),
                    req.path()
                ));
                return reject(req, err);
            }
            RouteMatch::NotFound => {
                let err = ApiError::NotFound(format!("No route for {}", req.path()));
                return reject(req, err);
            }
        };

        let session = state.sessions.load(req.request());

        match authorize(&matched.route, &session, &matched.params) {
            Ok(access) => {
                match access {
                    Access::Public => {}
                    Access::SelfService => log::debug!(
                        "Self-access granted to {} for {} {}",
                        session.username().unwrap_or_default(),
                        req.method(),
                        req.path()
                    ),
                    Access::Role(role) => log::debug!(
                        "Role {} granted {} {}",
                        role,
                        req.method(),
                        req.path()
                    ),
                }
                req.extensions_mut().insert(session);
                req.extensions_mut().insert(matched);

                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(denied) => {
                log::info!(
                    "Denied {} {} for {}: {}",
                    req.method(),
                    req.path(),
                    session.username().unwrap_or("anonymous"),
                    denied
                );
                reject(req, ApiError::from(denied))
            }
        }
    }
}

fn reject<B: 'static>(
    req: ServiceRequest,
    err: ApiError,
) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>> {
    let (req, _) = req.into_parts();
    let response = err.error_response().map_into_right_body();
    Box::pin(async move { Ok(ServiceResponse::new(req, response)) })
}
