// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod flow;
mod github;
mod provisioning;
pub mod types;

pub use flow::{LOGIN_STATE_TTL_SECONDS, LoginFlow, generate_state};
pub use github::{GithubProvider, OAuthProvider};
pub use provisioning::get_or_create;
pub use types::{AccessToken, CallbackQuery, LoginError, ProviderError, ProviderProfile};

use crate::error::ApiError;
use crate::roles::RoleSet;
use crate::routes::{HandlerFuture, RegistryError, Route, RouteContext, RouteRegistry};
use actix_web::http::Method;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, ResponseError, web};
use futures_util::FutureExt;

pub fn register_routes(registry: &mut RouteRegistry) -> Result<(), RegistryError> {
    registry.register(
        Route::new(
            Method::GET,
            "/login/github",
            RoleSet::empty(),
            start_github_login,
        )?
        .describe("Redirect to GitHub to start a login"),
    )?;
    registry.register(
        Route::new(
            Method::GET,
            "/login/github/callback",
            RoleSet::empty(),
            github_callback,
        )?
        .describe("Complete a GitHub login"),
    )?;
    Ok(())
}

fn start_github_login(ctx: RouteContext) -> HandlerFuture {
    async move {
        let mut session = ctx.session;
        let authorize_url = ctx.state.login.begin(&mut session);
        let cookie = ctx.state.sessions.cookie(&session)?;

        Ok(HttpResponse::Found()
            .insert_header((LOCATION, authorize_url))
            .cookie(cookie)
            .finish())
    }
    .boxed_local()
}

/// Completes the handshake. The session cookie is rewritten on every
/// outcome so the consumed state is gone from the browser as well.
fn github_callback(ctx: RouteContext) -> HandlerFuture {
    async move {
        let query = web::Query::<CallbackQuery>::from_query(ctx.request.query_string())
            .map(web::Query::into_inner)
            .unwrap_or_else(|err| {
                log::debug!("Unparseable login callback query: {}", err);
                CallbackQuery::default()
            });

        let mut session = ctx.session;
        let outcome = ctx
            .state
            .login
            .complete(&mut session, &query, ctx.state.store.as_ref())
            .await;
        let cookie = ctx.state.sessions.cookie(&session)?;

        match outcome {
            Ok(_) => Ok(HttpResponse::Found()
                .insert_header((LOCATION, ctx.state.login.landing_url().to_string()))
                .cookie(cookie)
                .finish()),
            Err(err) => {
                let mut response = ApiError::from(err).error_response();
                response.add_cookie(&cookie).map_err(|e| {
                    log::error!("Failed to set session cookie: {}", e);
                    ApiError::Internal("Failed to issue session".to_string())
                })?;
                Ok(response)
            }
        }
    }
    .boxed_local()
}
