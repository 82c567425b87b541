// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod dispatch;
mod pattern;
mod registry;

pub use dispatch::{Handler, HandlerFuture, RouteContext, configure};
pub use pattern::{PathParams, RoutePattern, Segment};
pub use registry::{MatchedRoute, RegistryError, Route, RouteMatch, RouteRegistry};

/// Builds the full route table served by the application.
pub fn build_registry() -> Result<RouteRegistry, RegistryError> {
    let mut registry = RouteRegistry::new();
    crate::api::register_routes(&mut registry)?;
    crate::login::register_routes(&mut registry)?;
    Ok(registry)
}
