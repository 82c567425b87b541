// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::roles::{Role, RoleSet};
use crate::routes::{RegistryError, Route, RouteRegistry};
use actix_web::http::Method;

mod images;
mod users;

pub fn register_routes(registry: &mut RouteRegistry) -> Result<(), RegistryError> {
    let staff = RoleSet::of(&[Role::Moderator, Role::Admin]);
    let admin = RoleSet::of(&[Role::Admin]);
    let everyone = RoleSet::of(&Role::ALL);

    registry.register(
        Route::new(Method::GET, "/users", staff, users::list_users)?.describe("List all users"),
    )?;
    registry.register(
        Route::new(Method::POST, "/user", admin, users::create_user)?.describe("Create a user"),
    )?;
    // Must precede /user/{name} so the literal wins.
    registry.register(
        Route::new(Method::GET, "/user/me", everyone, users::current_user)?
            .describe("Fetch the caller's own record"),
    )?;
    registry.register(
        Route::new(Method::GET, "/user/{name}", staff, users::get_user)?
            .with_self_access()
            .describe("Fetch a user"),
    )?;
    registry.register(
        Route::new(Method::DELETE, "/user/{name}", staff, users::delete_user)?
            .with_self_access()
            .describe("Remove a user and their images"),
    )?;
    registry.register(
        Route::new(Method::PUT, "/user/{name}", staff, users::modify_user)?
            .with_self_access()
            .describe("Modify a user"),
    )?;
    registry.register(
        Route::new(Method::POST, "/user/{name}/image", staff, images::create_image)?
            .with_self_access()
            .describe("Register an image for a user"),
    )?;
    registry.register(
        Route::new(Method::GET, "/user/{name}/images", staff, images::list_images)?
            .with_self_access()
            .describe("List a user's images"),
    )?;
    registry.register(
        Route::new(
            Method::GET,
            "/user/{name}/images/{image_name}",
            staff,
            images::images_by_name,
        )?
        .with_self_access()
        .describe("List a user's images with a given name"),
    )?;
    Ok(())
}
