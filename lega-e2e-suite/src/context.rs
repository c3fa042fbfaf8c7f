//! Per-scenario state.
//!
//! A [`ScenarioContext`] is created when a scenario starts, filled in by the
//! `Given`/`When` steps and read by the `Then` steps. Nothing is shared
//! between scenarios.

use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use lega_e2e_inbox::InboxSession;

use crate::error::StepError;

/// Scenario state, generic over the inbox session type.
#[derive(Debug)]
pub struct ScenarioContext<S> {
    user: Option<String>,
    password: Option<String>,
    private_key: Option<PathBuf>,
    authentication_failed: bool,
    session: Option<S>,
    data_folder: String,
}

impl<S> Default for ScenarioContext<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ScenarioContext<S> {
    pub fn new() -> Self {
        Self {
            user: None,
            password: None,
            private_key: None,
            authentication_failed: false,
            session: None,
            data_folder: format!("data-{}", Uuid::new_v4().simple()),
        }
    }

    pub fn user(&self) -> Result<&str, StepError> {
        self.user.as_deref().ok_or(StepError::NotSet("user"))
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = Some(user.into());
    }

    pub fn password(&self) -> Result<&str, StepError> {
        self.password.as_deref().ok_or(StepError::NotSet("password"))
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    pub fn private_key(&self) -> Result<&Path, StepError> {
        self.private_key
            .as_deref()
            .ok_or(StepError::NotSet("private key"))
    }

    pub fn set_private_key(&mut self, path: impl Into<PathBuf>) {
        self.private_key = Some(path.into());
    }

    pub fn authentication_failed(&self) -> bool {
        self.authentication_failed
    }

    pub fn set_authentication_failed(&mut self, failed: bool) {
        self.authentication_failed = failed;
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_mut(&mut self) -> Result<&mut S, StepError> {
        self.session.as_mut().ok_or(StepError::NotSet("session"))
    }

    /// Mount point name used when the CEGA users directory is bound into a worker.
    pub fn data_folder(&self) -> &str {
        &self.data_folder
    }
}

impl<S: InboxSession> ScenarioContext<S> {
    /// Stores `session`, closing the one it replaces.
    pub async fn replace_session(&mut self, session: Option<S>) {
        if let Some(previous) = std::mem::replace(&mut self.session, session) {
            if let Err(e) = previous.close().await {
                warn!(error = %e, "failed to close replaced inbox session");
            }
        }
    }

    /// Closes the current session, if any.
    pub async fn close(&mut self) {
        self.replace_session(None).await;
    }
}
