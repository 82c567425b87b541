// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::ProviderProfile;
use crate::roles::Role;
use crate::store::{StoreResult, User, UserStore};

/// Returns the local user for a provider identity, creating a `user`-role
/// record on first login. Creation failures are returned to the caller.
pub fn get_or_create(store: &dyn UserStore, profile: &ProviderProfile) -> StoreResult<User> {
    match store.get_user_by_username(&profile.login) {
        Ok(user) => Ok(user),
        Err(err) if err.is_not_found() => {
            let user = User {
                username: profile.login.clone(),
                name: profile
                    .name
                    .clone()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| profile.login.clone()),
                email: profile.email.clone().unwrap_or_default(),
                role: Role::User,
            };
            store.create_user(&user)?;
            log::info!("Provisioned new user {} from GitHub", user.username);
            Ok(user)
        }
        Err(err) => Err(err),
    }
}
