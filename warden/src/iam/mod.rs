// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod middleware;

pub use middleware::PermissionEnforcer;

use crate::roles::{Role, satisfies};
use crate::routes::{PathParams, Route};
use crate::session::Session;

/// Path parameter compared against the session username for self-access.
pub const SELF_PARAM: &str = "name";

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    SelfService,
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    Unauthenticated,
    Forbidden,
}

impl std::fmt::Display for Denied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Denied::Unauthenticated => f.write_str("authentication required"),
            Denied::Forbidden => f.write_str("insufficient permissions"),
        }
    }
}

impl std::error::Error for Denied {}

pub fn authorize(route: &Route, session: &Session, params: &PathParams) -> Result<Access, Denied> {
    if route.is_public() {
        return Ok(Access::Public);
    }

    let identity = session.identity().ok_or(Denied::Unauthenticated)?;

    if route.self_access && params.get(SELF_PARAM) == Some(identity.username) {
        return Ok(Access::SelfService);
    }

    if satisfies(&route.permissions, identity.role) {
        Ok(Access::Role(identity.role))
    } else {
        Err(Denied::Forbidden)
    }
}
