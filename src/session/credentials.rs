//! Persisted session credential.
//!
//! One JSON file holding the auth token and user id of the signed-in user.
//! Its presence at startup is what decides the initial auth state.

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    pub user_id: u64,
}

pub struct CredentialStore {
    file_path: PathBuf,
}

impl CredentialStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    /// The persisted credential, if a readable one exists. An unreadable
    /// file is treated as absent.
    pub fn load(&self) -> Option<StoredCredential> {
        let mut file = File::open(&self.file_path).ok()?;
        let mut content = String::new();
        file.read_to_string(&mut content).ok()?;

        match serde_json::from_str(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!("ignoring unreadable credential file: {}", e);
                None
            }
        }
    }

    pub fn save(&self, credential: &StoredCredential) -> Result<()> {
        let json_string = serde_json::to_string_pretty(credential)?;
        let mut file = File::create(&self.file_path)
            .with_context(|| format!("creating credential file {:?}", self.file_path))?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }

    /// Remove the persisted credential. Already-absent files are fine.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("removing credential file {:?}", self.file_path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> StoredCredential {
        StoredCredential {
            token: "secret".to_string(),
            user_id: 7,
        }
    }

    #[test]
    fn load_returns_none_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        store.save(&credential()).unwrap();

        assert_eq!(store.load(), Some(credential()));
    }

    #[test]
    fn clear_removes_the_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        store.save(&credential()).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());

        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = CredentialStore::new(path);
        assert!(store.load().is_none());
    }
}
