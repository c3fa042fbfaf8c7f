//! `lega-e2e account` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use lega_e2e_credentials::{CegaUsers, KeyProvisioner};
use lega_e2e_inbox::{
    AttemptResult, AuthOutcome, AuthPolicy, Authenticator, InboxSession, RusshConnector,
};

use crate::cli::{AccountAction, AccountArgs, LoginCredential};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `account` command.
pub async fn execute(
    args: AccountArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        AccountAction::Create { user } => execute_create(config_path, user, writer).await,
        AccountAction::Login { user, credential } => {
            execute_login(config_path, &user, credential, writer).await
        }
    }
}

async fn execute_create(
    config_path: &Path,
    user: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let harness = super::connect_harness(&config)?;
    let users = CegaUsers::new(config.paths.cega_users_dir());
    let provisioner = KeyProvisioner::new(harness, users, config.credentials.key_bits);

    let user = user.unwrap_or_else(|| Uuid::new_v4().to_string());
    let data_folder = format!("data-{}", Uuid::new_v4().simple());
    info!(user = %user, "creating cega account");

    let account = provisioner.provision(&user, &data_folder).await?;
    writer.render(&AccountReport {
        user: account.user,
        private_key: account.private_key.display().to_string(),
        record: account.record.display().to_string(),
        public_key: account.public_key,
    })?;
    Ok(())
}

async fn execute_login(
    config_path: &Path,
    user: &str,
    credential: LoginCredential,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let authenticator = Authenticator::new(
        RusshConnector::from_config(&config.inbox),
        AuthPolicy::from_config(&config.inbox),
    );

    let report = match (credential.key, credential.password) {
        (Some(key), _) => {
            let outcome = authenticator.authenticate_with_key(user, &key).await;
            LoginReport::from_outcome(user, outcome).await
        }
        (None, Some(password)) => {
            let result = authenticator
                .authenticate_with_password(user, &password)
                .await;
            let (session, error) = match result {
                Ok(session) => (Some(session), None),
                Err(e) => (None, Some(e)),
            };
            let outcome = AuthOutcome {
                failed: session.is_none(),
                session,
                attempts: vec![AttemptResult { attempt: 1, error }],
            };
            LoginReport::from_outcome(user, outcome).await
        }
        (None, None) => {
            return Err(CliError::Command(
                "either --key or --password is required".to_owned(),
            ));
        }
    };

    writer.render(&report)?;

    if !report.success {
        let reason = report
            .attempts
            .last()
            .and_then(|a| a.error.clone())
            .unwrap_or_else(|| "unknown error".to_owned());
        return Err(CliError::AuthenticationFailed(format!("{user}: {reason}")));
    }
    Ok(())
}

/// Created account.
#[derive(Debug, Serialize)]
pub struct AccountReport {
    pub user: String,
    pub private_key: String,
    pub record: String,
    pub public_key: String,
}

impl Render for AccountReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Account created: {}", self.user.bold())?;
        writeln!(w, "  Private key: {}", self.private_key)?;
        writeln!(w, "  Record:      {}", self.record)?;
        writeln!(w, "  Public key:  {}", self.public_key)?;
        Ok(())
    }
}

/// One login attempt as shown to the user.
#[derive(Debug, Serialize)]
pub struct AttemptReport {
    pub attempt: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Login result, with the root listing when the login succeeded.
#[derive(Debug, Serialize)]
pub struct LoginReport {
    pub user: String,
    pub success: bool,
    pub attempts: Vec<AttemptReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_entries: Option<Vec<String>>,
}

impl LoginReport {
    /// Lists `/` on the surviving session and closes it.
    async fn from_outcome<S: InboxSession>(user: &str, outcome: AuthOutcome<S>) -> Self {
        let attempts = outcome
            .attempts
            .iter()
            .map(|a| AttemptReport {
                attempt: a.attempt,
                ok: a.succeeded(),
                error: a.error.as_ref().map(ToString::to_string),
            })
            .collect();

        let mut success = !outcome.failed;
        let mut root_entries = None;
        if let Some(mut session) = outcome.session {
            match session.list_dir("/").await {
                Ok(entries) => root_entries = Some(entries),
                Err(e) => {
                    tracing::error!(error = %e, "listing inbox root failed");
                    success = false;
                }
            }
            if let Err(e) = session.close().await {
                tracing::warn!(error = %e, "failed to close inbox session");
            }
        }

        Self {
            user: user.to_owned(),
            success,
            attempts,
            root_entries,
        }
    }
}

impl Render for LoginReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let result = if self.success {
            "SUCCESS".green().bold()
        } else {
            "FAILED".red().bold()
        };
        writeln!(w, "Inbox login for {}: {}", self.user.bold(), result)?;
        for attempt in &self.attempts {
            match &attempt.error {
                None => writeln!(w, "  attempt {}: ok", attempt.attempt)?,
                Some(e) => writeln!(w, "  attempt {}: {}", attempt.attempt, e)?,
            }
        }
        if let Some(entries) = &self.root_entries {
            writeln!(w, "  /: {}", entries.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lega_e2e_inbox::InboxClientError;

    #[derive(Debug)]
    struct ListingSession {
        fail_listing: bool,
    }

    impl InboxSession for ListingSession {
        async fn list_dir(&mut self, _path: &str) -> Result<Vec<String>, InboxClientError> {
            if self.fail_listing {
                return Err(InboxClientError::Sftp("channel closed".to_owned()));
            }
            Ok(vec!["inbox".to_owned()])
        }

        async fn close(self) -> Result<(), InboxClientError> {
            Ok(())
        }
    }

    fn attempts(errors: Vec<Option<InboxClientError>>) -> Vec<AttemptResult> {
        errors
            .into_iter()
            .enumerate()
            .map(|(i, error)| AttemptResult {
                attempt: i as u32 + 1,
                error,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_login_report_lists_root_on_success() {
        let outcome = AuthOutcome {
            session: Some(ListingSession {
                fail_listing: false,
            }),
            failed: false,
            attempts: attempts(vec![
                Some(InboxClientError::Rejected("john".to_owned())),
                None,
            ]),
        };
        let report = LoginReport::from_outcome("john", outcome).await;
        assert!(report.success);
        assert_eq!(report.root_entries, Some(vec!["inbox".to_owned()]));
        assert!(!report.attempts[0].ok);
        assert!(report.attempts[1].ok);
    }

    #[tokio::test]
    async fn test_login_report_failed_outcome() {
        let outcome: AuthOutcome<ListingSession> = AuthOutcome {
            session: None,
            failed: true,
            attempts: attempts(vec![None, Some(InboxClientError::Timeout(30))]),
        };
        let report = LoginReport::from_outcome("john", outcome).await;
        assert!(!report.success);
        assert!(report.root_entries.is_none());
        assert_eq!(
            report.attempts[1].error.as_deref(),
            Some("connect timed out after 30s")
        );
    }

    #[tokio::test]
    async fn test_login_report_listing_failure_is_failure() {
        let outcome = AuthOutcome {
            session: Some(ListingSession { fail_listing: true }),
            failed: false,
            attempts: attempts(vec![None]),
        };
        let report = LoginReport::from_outcome("john", outcome).await;
        assert!(!report.success);
    }

    #[test]
    fn test_login_report_json_omits_missing_fields() {
        let report = LoginReport {
            user: "john".to_owned(),
            success: false,
            attempts: vec![AttemptReport {
                attempt: 1,
                ok: true,
                error: None,
            }],
            root_entries: None,
        };
        let json = serde_json::to_value(&report).expect("json");
        assert!(json.get("root_entries").is_none());
        assert!(json["attempts"][0].get("error").is_none());
    }

    #[test]
    fn test_account_report_render_text() {
        let report = AccountReport {
            user: "alice".to_owned(),
            private_key: "/cega/users/alice.sec".to_owned(),
            record: "/cega/users/alice.yml".to_owned(),
            public_key: "ssh-rsa AAAA".to_owned(),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("utf8");
        assert!(output.contains("alice"));
        assert!(output.contains("/cega/users/alice.sec"));
        assert!(output.contains("ssh-rsa AAAA"));
    }
}
