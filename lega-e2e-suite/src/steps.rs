//! Step operations.
//!
//! One method per Gherkin step. Setup steps (`I have an account at Central
//! EGA`, `my account expires`, the password login) log failures and carry on
//! so that the verification steps report the outcome; verification steps
//! return a [`StepError`] that the runner turns into a failed step.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};
use uuid::Uuid;

use lega_e2e_core::config::HarnessConfig;
use lega_e2e_credentials::{CegaUsers, KeyProvisioner, ProvisionedAccount, TraceFile};
use lega_e2e_docker::{DockerClient, DockerHarness, LocalDatabase, WorkerSettings};
use lega_e2e_inbox::{AuthPolicy, Authenticator, InboxConnector, InboxSession};

use crate::context::ScenarioContext;
use crate::error::StepError;

/// Context type the steps operate on for a given connector.
pub type Context<C> = ScenarioContext<<C as InboxConnector>::Session>;

/// Everything a scenario talks to: Docker, the CEGA directory, the inbox and
/// the local database.
pub struct ScenarioSteps<D: DockerClient, C: InboxConnector> {
    config: HarnessConfig,
    harness: DockerHarness<D>,
    users: CegaUsers,
    provisioner: KeyProvisioner<D>,
    authenticator: Authenticator<C>,
}

impl<D: DockerClient, C: InboxConnector> ScenarioSteps<D, C> {
    pub fn new(config: HarnessConfig, docker: Arc<D>, connector: C) -> Self {
        let harness = DockerHarness::new(docker, WorkerSettings::from_config(&config));
        let users = CegaUsers::new(config.paths.cega_users_dir());
        let provisioner =
            KeyProvisioner::new(harness.clone(), users.clone(), config.credentials.key_bits);
        let authenticator = Authenticator::new(connector, AuthPolicy::from_config(&config.inbox));
        Self {
            config,
            harness,
            users,
            provisioner,
            authenticator,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn authenticator(&self) -> &Authenticator<C> {
        &self.authenticator
    }

    /// Local database handle; the role name comes from the trace file.
    pub async fn database(&self) -> Result<LocalDatabase<D>, StepError> {
        let trace = TraceFile::load(self.config.paths.trace_file()).await?;
        let db_user = trace.require(&self.config.database.user_trace_key)?;
        Ok(LocalDatabase::new(self.harness.clone(), &self.config, db_user))
    }

    // --- Given ---

    /// `I am a user`
    pub fn i_am_a_user(&self, ctx: &mut Context<C>) {
        let user = Uuid::new_v4().to_string();
        debug!(user = %user, "new scenario user");
        ctx.set_user(user);
    }

    /// `I have an account at Central EGA`
    ///
    /// Failures are logged; the scenario continues without an account.
    pub async fn i_have_an_account_at_central_ega(
        &self,
        ctx: &mut Context<C>,
    ) -> Option<ProvisionedAccount> {
        let user = match ctx.user() {
            Ok(user) => user.to_owned(),
            Err(e) => {
                error!(error = %e, "cannot create cega account");
                return None;
            }
        };
        match self.provisioner.provision(&user, ctx.data_folder()).await {
            Ok(account) => Some(account),
            Err(e) => {
                error!(user = %user, error = %e, "cega account creation failed");
                None
            }
        }
    }

    /// `I have correct private key`
    pub fn i_have_correct_private_key(&self, ctx: &mut Context<C>) -> Result<(), StepError> {
        let key = self.users.private_key_path(ctx.user()?);
        ctx.set_private_key(key);
        Ok(())
    }

    /// `I have incorrect private key`: another user's key.
    pub fn i_have_incorrect_private_key(&self, ctx: &mut Context<C>) {
        let key = self
            .users
            .private_key_path(&self.config.credentials.incorrect_key_user);
        ctx.set_private_key(key);
    }

    /// `I have username and password`: the first CEGA user and its bootstrap password.
    pub async fn i_have_username_and_password(
        &self,
        ctx: &mut Context<C>,
    ) -> Result<(), StepError> {
        let user = self
            .users
            .first_user()
            .await?
            .ok_or_else(|| StepError::assertion("no user records in the cega directory"))?;
        let trace = TraceFile::load(self.config.paths.legacy_trace_file()).await?;
        let password = trace
            .user_password(&user)
            .ok_or_else(|| StepError::assertion(format!("no password for {user} in trace file")))?
            .to_owned();
        debug!(user = %user, "using bootstrap credentials");
        ctx.set_user(user);
        ctx.set_password(password);
        Ok(())
    }

    // --- When ---

    /// `I connect to the LocalEGA inbox via SFTP using private key`
    pub async fn i_connect_with_private_key(&self, ctx: &mut Context<C>) -> Result<(), StepError> {
        self.authenticate(ctx).await
    }

    /// `my account expires`: log in once so the inbox caches the account,
    /// then expire it in the local database.
    ///
    /// Failures are logged; the verification steps observe the result.
    pub async fn my_account_expires(&self, ctx: &mut Context<C>) {
        if let Err(e) = self.authenticate(ctx).await {
            error!(error = %e, "login before expiry failed");
        }
        tokio::time::sleep(Duration::from_millis(self.config.database.expire_delay_ms)).await;

        let result = async {
            let user = ctx.user()?;
            self.database()
                .await?
                .expire_user(user, &self.config.database.expiration)
                .await?;
            Ok::<_, StepError>(())
        }
        .await;
        if let Err(e) = result {
            error!(error = %e, "account expiry failed");
        }
    }

    /// `I try to connect to the LocalEGA inbox via SFTP using these credentials`
    ///
    /// A failed login is logged and recorded in the context.
    pub async fn i_connect_with_password(&self, ctx: &mut Context<C>) -> Result<(), StepError> {
        let user = ctx.user()?.to_owned();
        let password = ctx.password()?.to_owned();
        match self
            .authenticator
            .authenticate_with_password(&user, &password)
            .await
        {
            Ok(session) => {
                ctx.set_authentication_failed(false);
                ctx.replace_session(Some(session)).await;
            }
            Err(_) => {
                ctx.set_authentication_failed(true);
                ctx.close().await;
            }
        }
        Ok(())
    }

    // --- Then ---

    /// `I am in the local database`
    pub async fn i_am_in_the_local_database(&self, ctx: &Context<C>) -> Result<(), StepError> {
        self.expect_user_count(ctx, 1).await
    }

    /// `I am not in the local database`
    pub async fn i_am_not_in_the_local_database(&self, ctx: &Context<C>) -> Result<(), StepError> {
        self.expect_user_count(ctx, 0).await
    }

    /// `I'm logged in successfully`
    pub fn i_am_logged_in_successfully(&self, ctx: &Context<C>) -> Result<(), StepError> {
        if ctx.authentication_failed() {
            return Err(StepError::assertion("expected login to succeed, but it failed"));
        }
        Ok(())
    }

    /// `authentication fails`
    pub fn authentication_fails(&self, ctx: &Context<C>) -> Result<(), StepError> {
        if !ctx.authentication_failed() {
            return Err(StepError::assertion("expected login to fail, but it succeeded"));
        }
        Ok(())
    }

    /// `the operation is successful`: the first root entry is the inbox directory.
    pub async fn the_operation_is_successful(&self, ctx: &mut Context<C>) -> Result<(), StepError> {
        let entries = ctx.session_mut()?.list_dir("/").await?;
        let expected = &self.config.inbox.root_entry;
        match entries.first() {
            Some(first) if first == expected => Ok(()),
            Some(first) => Err(StepError::assertion(format!(
                "expected first root entry {expected:?}, got {first:?}"
            ))),
            None => Err(StepError::assertion("root directory is empty")),
        }
    }

    // --- helpers ---

    async fn authenticate(&self, ctx: &mut Context<C>) -> Result<(), StepError> {
        let user = ctx.user()?.to_owned();
        let key: PathBuf = ctx.private_key()?.to_path_buf();
        let outcome = self.authenticator.authenticate_with_key(&user, &key).await;
        info!(
            user = %user,
            failed = outcome.failed,
            attempts = outcome.attempts.len(),
            "inbox login finished"
        );
        ctx.set_authentication_failed(outcome.failed);
        ctx.replace_session(outcome.session).await;
        Ok(())
    }

    async fn expect_user_count(&self, ctx: &Context<C>, expected: i64) -> Result<(), StepError> {
        let user = ctx.user()?;
        let count = self.database().await?.user_count(user).await?;
        if count != expected {
            return Err(StepError::assertion(format!(
                "expected {expected} row(s) for {user} in users, found {count}"
            )));
        }
        Ok(())
    }
}
