// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::error::ApiError;
use crate::roles::Role;
use crate::routes::{HandlerFuture, RouteContext};
use crate::store::User;
use actix_web::HttpResponse;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(rename = "Username")]
    username: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Email")]
    email: Option<String>,
    #[serde(rename = "Role")]
    role: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    message: String,
}

fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

fn parse_role(value: &str) -> Result<Role, ApiError> {
    value
        .parse::<Role>()
        .map_err(|err| ApiError::BadRequest(err.to_string()))
}

impl UserPayload {
    fn into_new_user(self) -> Result<User, ApiError> {
        let username = required("Username", self.username)?;
        let name = required("Name", self.name)?;
        let email = required("Email", self.email)?;
        let role = parse_role(&required("Role", self.role)?)?;
        Ok(User {
            username,
            name,
            email,
            role,
        })
    }
}

/// Resolves `{name}` for the per-user routes. Only an admin or the owner
/// may act on a record; the check happens before the store is consulted.
fn target_username(ctx: &RouteContext) -> Result<String, ApiError> {
    let caller = ctx.caller()?;
    let name = ctx.param("name")?;
    if caller.role != Role::Admin && caller.username != name {
        log::info!(
            "{} ({}) may not act on user {}",
            caller.username,
            caller.role,
            name
        );
        return Err(ApiError::Forbidden(
            "Only administrators may act on other users".to_string(),
        ));
    }
    Ok(name.to_string())
}

pub fn list_users(ctx: RouteContext) -> HandlerFuture {
    async move {
        let users = ctx.state.store.get_users()?;
        Ok(HttpResponse::Ok().json(users))
    }
    .boxed_local()
}

pub fn create_user(ctx: RouteContext) -> HandlerFuture {
    async move {
        let user = ctx.json::<UserPayload>()?.into_new_user()?;
        ctx.state.store.create_user(&user)?;
        log::info!(
            "User {} created by {}",
            user.username,
            ctx.session.username().unwrap_or("unknown")
        );
        Ok(HttpResponse::Created().json(user))
    }
    .boxed_local()
}

pub fn current_user(ctx: RouteContext) -> HandlerFuture {
    async move {
        let caller = ctx.caller()?;
        let user = ctx.state.store.get_user_by_username(caller.username)?;
        Ok(HttpResponse::Ok().json(user))
    }
    .boxed_local()
}

pub fn get_user(ctx: RouteContext) -> HandlerFuture {
    async move {
        let username = target_username(&ctx)?;
        let user = ctx.state.store.get_user_by_username(&username)?;
        Ok(HttpResponse::Ok().json(user))
    }
    .boxed_local()
}

pub fn modify_user(ctx: RouteContext) -> HandlerFuture {
    async move {
        let username = target_username(&ctx)?;
        let caller_role = ctx.caller()?.role;
        let payload = ctx.json::<UserPayload>()?;
        let current = ctx.state.store.get_user_by_username(&username)?;

        if let Some(sent) = payload.username.as_deref().map(str::trim)
            && !sent.is_empty()
            && sent != current.username
        {
            log::debug!(
                "Ignoring Username '{}' in update of {}",
                sent,
                current.username
            );
        }

        let mut updated = current.clone();
        if let Some(name) = payload.name.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            updated.name = name;
        }
        if let Some(email) = payload
            .email
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            updated.email = email;
        }
        if let Some(role) = payload.role.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            let role = parse_role(role)?;
            if role != current.role && caller_role != Role::Admin {
                return Err(ApiError::Forbidden(
                    "Only administrators may change roles".to_string(),
                ));
            }
            updated.role = role;
        }

        ctx.state.store.modify_user(&updated)?;
        log::info!("User {} modified", updated.username);
        Ok(HttpResponse::Ok().json(updated))
    }
    .boxed_local()
}

pub fn delete_user(ctx: RouteContext) -> HandlerFuture {
    async move {
        let username = target_username(&ctx)?;
        ctx.state.store.remove_user(&username)?;
        log::info!(
            "User {} removed by {}",
            username,
            ctx.session.username().unwrap_or("unknown")
        );
        Ok(HttpResponse::Ok().json(StatusResponse {
            message: format!("User '{}' removed", username),
        }))
    }
    .boxed_local()
}
