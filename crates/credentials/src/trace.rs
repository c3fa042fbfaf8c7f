//! Trace file reader.
//!
//! The LocalEGA bootstrap records every generated secret as a `KEY = value`
//! line in a trace file. Lookups are line-oriented: a key matches the first
//! line that *starts with* it, which is how the bootstrap's own tooling reads
//! the file back.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CredentialsError;

const SEPARATOR: &str = " = ";

/// In-memory copy of a trace file.
#[derive(Debug, Clone)]
pub struct TraceFile {
    path: PathBuf,
    lines: Vec<String>,
}

impl TraceFile {
    /// Reads the whole file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CredentialsError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| CredentialsError::TraceRead {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
        debug!(path = %path.display(), "trace file loaded");
        Ok(Self::parse(path, &content))
    }

    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        Self {
            path: path.into(),
            lines: content.lines().map(str::to_owned).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of the first line starting with `key`.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .filter(|l| l.starts_with(key))
            .find_map(|l| value_of(l))
    }

    /// Like [`property`](Self::property) but missing keys are an error.
    pub fn require(&self, key: &str) -> Result<&str, CredentialsError> {
        self.property(key)
            .ok_or_else(|| CredentialsError::PropertyMissing(key.to_owned()))
    }

    /// Value of the first line containing `needle` anywhere.
    ///
    /// Used for per-user secrets, which are keyed by the upper-cased username
    /// inside a longer key (e.g. `CEGA_USERS_JOHN = ...`).
    pub fn find_containing(&self, needle: &str) -> Option<&str> {
        self.lines
            .iter()
            .filter(|l| l.contains(needle))
            .find_map(|l| value_of(l))
    }

    /// Password recorded for a CEGA user.
    pub fn user_password(&self, username: &str) -> Option<&str> {
        self.find_containing(&username.to_uppercase())
    }
}

fn value_of(line: &str) -> Option<&str> {
    line.split(SEPARATOR).nth(1)
}
