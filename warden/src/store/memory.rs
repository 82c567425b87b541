// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::UserStore;
use super::types::{Image, StoreData, StoreResult, User};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-local store used by tests and embedders that do not need persistence.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
    mutations: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_users(users: Vec<User>) -> Self {
        let data = StoreData {
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
            images: Vec::new(),
        };
        Self {
            data: RwLock::new(data),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Number of successful writes since construction.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StoreData {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreData> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("MemoryStore lock poisoned on read; recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreData> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("MemoryStore lock poisoned on write; recovering");
                poisoned.into_inner()
            }
        }
    }

    fn mutate<F>(&self, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut StoreData) -> StoreResult<()>,
    {
        apply(&mut self.write())?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl UserStore for MemoryStore {
    fn get_user_by_username(&self, username: &str) -> StoreResult<User> {
        self.read().get_user(username)
    }

    fn get_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read().users.values().cloned().collect())
    }

    fn create_user(&self, user: &User) -> StoreResult<()> {
        self.mutate(|data| data.insert_user(user))
    }

    fn modify_user(&self, user: &User) -> StoreResult<()> {
        self.mutate(|data| data.replace_user(user))
    }

    fn remove_user(&self, username: &str) -> StoreResult<()> {
        self.mutate(|data| data.delete_user(username))
    }

    fn create_image(&self, image: &Image) -> StoreResult<()> {
        self.mutate(|data| data.insert_image(image))
    }

    fn get_images_by_username(&self, username: &str) -> StoreResult<Vec<Image>> {
        Ok(self.read().images_of(username))
    }

    fn get_images_by_name_and_username(
        &self,
        name: &str,
        username: &str,
    ) -> StoreResult<Vec<Image>> {
        Ok(self.read().images_named(name, username))
    }
}
