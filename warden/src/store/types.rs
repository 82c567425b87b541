// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::roles::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Role")]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    #[serde(rename = "DiskUUID")]
    pub disk_uuid: String,
    #[serde(rename = "Username")]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(String),
    AlreadyExists(String),
    FileError(String),
    ParseError(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "Record not found: {}", what),
            StoreError::AlreadyExists(what) => write!(f, "Record already exists: {}", what),
            StoreError::FileError(msg) => write!(f, "File error: {}", msg),
            StoreError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the store persists. Users are keyed by username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub users: BTreeMap<String, User>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl StoreData {
    pub fn get_user(&self, username: &str) -> StoreResult<User> {
        self.users
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", username)))
    }

    pub fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        if self.users.contains_key(&user.username) {
            return Err(StoreError::AlreadyExists(format!(
                "user '{}'",
                user.username
            )));
        }
        self.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    pub fn replace_user(&mut self, user: &User) -> StoreResult<()> {
        match self.users.get_mut(&user.username) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("user '{}'", user.username))),
        }
    }

    /// Removes the user together with every image they own.
    pub fn delete_user(&mut self, username: &str) -> StoreResult<()> {
        if self.users.remove(username).is_none() {
            return Err(StoreError::NotFound(format!("user '{}'", username)));
        }
        self.images.retain(|image| image.username != username);
        Ok(())
    }

    pub fn insert_image(&mut self, image: &Image) -> StoreResult<()> {
        if !self.users.contains_key(&image.username) {
            return Err(StoreError::NotFound(format!("user '{}'", image.username)));
        }
        if self.images.iter().any(|existing| existing.uuid == image.uuid) {
            return Err(StoreError::AlreadyExists(format!("image {}", image.uuid)));
        }
        self.images.push(image.clone());
        Ok(())
    }

    pub fn images_of(&self, username: &str) -> Vec<Image> {
        self.images
            .iter()
            .filter(|image| image.username == username)
            .cloned()
            .collect()
    }

    pub fn images_named(&self, name: &str, username: &str) -> Vec<Image> {
        self.images
            .iter()
            .filter(|image| image.username == username && image.name == name)
            .cloned()
            .collect()
    }
}
