// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod file;
mod memory;
mod types;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use types::{Image, StoreData, StoreError, StoreResult, User};

/// Persistence for user and image records.
///
/// Implementations must report a missing record as `StoreError::NotFound`
/// so callers can tell it apart from I/O failures.
pub trait UserStore: Send + Sync {
    fn get_user_by_username(&self, username: &str) -> StoreResult<User>;
    fn get_users(&self) -> StoreResult<Vec<User>>;
    fn create_user(&self, user: &User) -> StoreResult<()>;
    fn modify_user(&self, user: &User) -> StoreResult<()>;
    fn remove_user(&self, username: &str) -> StoreResult<()>;
    fn create_image(&self, image: &Image) -> StoreResult<()>;
    fn get_images_by_username(&self, username: &str) -> StoreResult<Vec<Image>>;
    fn get_images_by_name_and_username(
        &self,
        name: &str,
        username: &str,
    ) -> StoreResult<Vec<Image>>;
}
