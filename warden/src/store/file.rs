// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::UserStore;
use super::types::{Image, StoreData, StoreError, StoreResult, User};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

/// YAML-backed store. The whole data set is cached in memory and the file
/// is rewritten atomically on every mutation.
pub struct FileStore {
    data_file: PathBuf,
    data: Mutex<StoreData>,
}

impl FileStore {
    /// Opens the data file, creating an empty one if it does not exist yet.
    pub fn open(data_file: PathBuf) -> StoreResult<Self> {
        if data_file.as_os_str().is_empty() {
            return Err(StoreError::FileError("Data file path is empty".to_string()));
        }

        let data = if data_file.exists() {
            let content = std::fs::read_to_string(&data_file)
                .map_err(|e| StoreError::FileError(format!("Failed to read data file: {}", e)))?;
            parse_data(&content)?
        } else {
            log::info!(
                "Data file {} not found; starting with an empty store",
                data_file.display()
            );
            let empty = StoreData::default();
            write_data_file(&data_file, &serialize_data(&empty)?)?;
            empty
        };

        log::info!(
            "Loaded {} user(s) and {} image(s) from {}",
            data.users.len(),
            data.images.len(),
            data_file.display()
        );

        Ok(Self {
            data_file,
            data: Mutex::new(data),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreData> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("FileStore lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Applies `apply` to a copy, persists the copy, then commits it.
    /// A failed write leaves both the file and the cache untouched.
    fn mutate<F>(&self, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut StoreData) -> StoreResult<()>,
    {
        let mut guard = self.lock();
        let mut next = guard.clone();
        apply(&mut next)?;
        write_data_file(&self.data_file, &serialize_data(&next)?)?;
        *guard = next;
        Ok(())
    }
}

fn parse_data(content: &str) -> StoreResult<StoreData> {
    if content.trim().is_empty() {
        return Ok(StoreData::default());
    }
    let data: StoreData = serde_yaml::from_str(content)
        .map_err(|e| StoreError::ParseError(format!("Failed to parse data file: {}", e)))?;
    for (key, user) in &data.users {
        if key != &user.username {
            return Err(StoreError::ParseError(format!(
                "User entry '{}' carries mismatched Username '{}'",
                key, user.username
            )));
        }
    }
    Ok(data)
}

fn serialize_data(data: &StoreData) -> StoreResult<String> {
    serde_yaml::to_string(data)
        .map_err(|e| StoreError::ParseError(format!("Failed to serialize data: {}", e)))
}

/// Replaces the data file through a synced sibling temp file, so a crash
/// leaves either the old or the new content on disk.
fn write_data_file(data_file: &Path, content: &str) -> StoreResult<()> {
    let dir = data_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_error = |action: &str, err: std::io::Error| {
        StoreError::FileError(format!("{} {}: {}", action, data_file.display(), err))
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| io_error("Failed to stage", e))?;
    staged
        .write_all(content.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| io_error("Failed to write", e))?;
    staged
        .persist(data_file)
        .map_err(|e| io_error("Failed to replace", e.error))?;

    #[cfg(unix)]
    {
        if let Err(err) = std::fs::File::open(dir).and_then(|handle| handle.sync_all()) {
            log::warn!("Syncing {} failed: {}", dir.display(), err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;

    fn narchi() -> User {
        User {
            username: "w.narchi".to_string(),
            name: "William Narchi".to_string(),
            email: "w.narchi1@student.tudelft.nl".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn open_creates_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("data.yaml");

        let store = FileStore::open(path.clone()).expect("open");

        assert!(path.exists());
        assert!(store.get_users().expect("users").is_empty());
    }

    #[test]
    fn writes_survive_reopen() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("data.yaml");

        let store = FileStore::open(path.clone()).expect("open");
        store.create_user(&narchi()).expect("create");
        drop(store);

        let reopened = FileStore::open(path).expect("reopen");
        assert_eq!(
            reopened.get_user_by_username("w.narchi").expect("user"),
            narchi()
        );
    }

    #[test]
    fn repeated_writes_leave_only_the_data_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("data.yaml");
        let store = FileStore::open(path.clone()).expect("open");

        store.create_user(&narchi()).expect("create");
        let mut renamed = narchi();
        renamed.name = "W. Narchi".to_string();
        store.modify_user(&renamed).expect("modify");

        let entries: Vec<_> = std::fs::read_dir(temp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("data.yaml")]);
        let on_disk = std::fs::read_to_string(&path).expect("read");
        assert!(on_disk.contains("W. Narchi"));
    }

    #[test]
    fn rejects_entries_keyed_under_another_username() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("data.yaml");
        let yaml = "users:\n  alice:\n    Username: bob\n    Name: Bob\n    Email: bob@example.com\n    Role: user\n";
        std::fs::write(&path, yaml).expect("write");

        let err = FileStore::open(path).err().expect("parse error");
        assert!(matches!(err, StoreError::ParseError(_)));
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_keeps_previous_state() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("data.yaml");
        let store = FileStore::open(path.clone()).expect("open");
        let before = std::fs::read_to_string(&path).expect("read");

        let dir = temp.path();
        let original = std::fs::metadata(dir).expect("metadata").permissions().mode();
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(original & 0o555))
            .expect("set read-only");

        let result = store.create_user(&narchi());

        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(original))
            .expect("restore permissions");

        // Root ignores directory permissions, so only assert when the write failed.
        if result.is_err() {
            assert!(store.get_user_by_username("w.narchi").unwrap_err().is_not_found());
            assert_eq!(std::fs::read_to_string(&path).expect("read"), before);
        }
    }
}
