//! Central EGA users directory.
//!
//! Central EGA is simulated by a directory mounted into the LocalEGA
//! containers: one `<user>.yml` record per account, with the user's key
//! material (`<user>.sec`, `<user>.pub`) next to it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CredentialsError;

/// A CEGA user record as stored in `<user>.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CegaUser {
    /// OpenSSH public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    /// Password hash (bootstrap-created users only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

/// Handle on the mounted users directory.
#[derive(Debug, Clone)]
pub struct CegaUsers {
    dir: PathBuf,
}

impl CegaUsers {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{user}.yml"))
    }

    pub fn private_key_path(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{user}.sec"))
    }

    pub fn public_key_path(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{user}.pub"))
    }

    /// Writes `<user>.yml` holding the given public key.
    pub async fn write_user(&self, user: &str, public_key: &str) -> Result<PathBuf, CredentialsError> {
        let record = CegaUser {
            pubkey: Some(public_key.trim().to_owned()),
            password_hash: None,
        };
        let body = serde_yaml::to_string(&record).map_err(|e| self.dir_error(&self.dir, e))?;
        let path = self.record_path(user);
        tokio::fs::write(&path, format!("---\n{body}"))
            .await
            .map_err(|e| self.dir_error(&path, e))?;
        info!(user = %user, path = %path.display(), "cega user record written");
        Ok(path)
    }

    /// Reads `<user>.yml`.
    pub async fn read_user(&self, user: &str) -> Result<CegaUser, CredentialsError> {
        let path = self.record_path(user);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| self.dir_error(&path, e))?;
        serde_yaml::from_str(&content).map_err(|e| self.dir_error(&path, e))
    }

    /// Basename of the first `*.yml` record, in file name order.
    pub async fn first_user(&self) -> Result<Option<String>, CredentialsError> {
        Ok(self.list_users().await?.into_iter().next())
    }

    /// Basenames of all `*.yml` records, sorted.
    pub async fn list_users(&self) -> Result<Vec<String>, CredentialsError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| self.dir_error(&self.dir, e))?;

        let mut users = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.dir_error(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yml") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                users.push(stem.to_owned());
            }
        }
        users.sort();
        debug!(dir = %self.dir.display(), count = users.len(), "cega users listed");
        Ok(users)
    }

    fn dir_error(&self, path: &Path, e: impl std::fmt::Display) -> CredentialsError {
        CredentialsError::UserDirectory {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    }
}
