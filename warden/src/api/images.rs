// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::error::ApiError;
use crate::routes::{HandlerFuture, RouteContext};
use crate::store::Image;
use actix_web::HttpResponse;
use futures_util::FutureExt;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ImagePayload {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "DiskUUID")]
    disk_uuid: Option<String>,
}

pub fn create_image(ctx: RouteContext) -> HandlerFuture {
    async move {
        let owner = ctx.param("name")?.to_string();
        let payload = ctx.json::<ImagePayload>()?;

        let name = payload
            .name
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Name is required".to_string()))?;
        let disk_uuid = payload
            .disk_uuid
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BadRequest("DiskUUID is required".to_string()))?;

        let image = Image {
            name,
            uuid: Uuid::new_v4(),
            disk_uuid,
            username: owner,
        };
        ctx.state.store.create_image(&image)?;
        log::info!(
            "Image {} ({}) registered for {}",
            image.name,
            image.uuid,
            image.username
        );
        Ok(HttpResponse::Created().json(image))
    }
    .boxed_local()
}

pub fn list_images(ctx: RouteContext) -> HandlerFuture {
    async move {
        let owner = ctx.param("name")?;
        ctx.state.store.get_user_by_username(owner)?;
        let images = ctx.state.store.get_images_by_username(owner)?;
        Ok(HttpResponse::Ok().json(images))
    }
    .boxed_local()
}

pub fn images_by_name(ctx: RouteContext) -> HandlerFuture {
    async move {
        let owner = ctx.param("name")?;
        let image_name = ctx.param("image_name")?;
        ctx.state.store.get_user_by_username(owner)?;
        let images = ctx
            .state
            .store
            .get_images_by_name_and_username(image_name, owner)?;
        Ok(HttpResponse::Ok().json(images))
    }
    .boxed_local()
}
