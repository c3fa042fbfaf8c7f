//! Scenario step tests against scripted Docker and inbox doubles.
//!
//! Each test lays out a fake LocalEGA checkout in a temp directory (trace
//! files and the CEGA users directory), then drives `ScenarioSteps` through
//! the same step sequence as the feature files.

use std::path::Path;
use std::sync::Arc;

use lega_e2e_core::config::HarnessConfig;
use lega_e2e_suite::{ScenarioContext, ScenarioSteps, StepError};

mod mock {
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    use lega_e2e_core::types::{ContainerInfo, ExecOutput};
    use lega_e2e_docker::{ContainerSpec, DockerClient, DockerError};
    use lega_e2e_inbox::{InboxClientError, InboxConnector, InboxSession};

    pub const PUBKEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAABAQCz test";

    /// Docker double: a running `ega_db`, canned `psql` and `ssh-keygen` output.
    pub struct TestDockerClient {
        pub user_count: AtomicI64,
        pub fail_keygen: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl TestDockerClient {
        pub fn new(user_count: i64) -> Self {
            Self {
                user_count: AtomicI64::new(user_count),
                fail_keygen: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn ok(stdout: impl Into<String>) -> ExecOutput {
            ExecOutput {
                stdout: stdout.into(),
                stderr: String::new(),
                exit_code: Some(0),
            }
        }
    }

    impl DockerClient for TestDockerClient {
        async fn list_containers(&self, _all: bool) -> Result<Vec<ContainerInfo>, DockerError> {
            Ok(vec![ContainerInfo {
                id: "d0d0".to_owned(),
                names: vec!["/ega_db".to_owned()],
                image: "nbis/ega:db".to_owned(),
                state: "running".to_owned(),
            }])
        }

        async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DockerError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create {}", spec.image));
            Ok("beef".to_owned())
        }

        async fn start_container(&self, _id: &str) -> Result<(), DockerError> {
            Ok(())
        }

        async fn exec(&self, id: &str, cmd: &[String]) -> Result<ExecOutput, DockerError> {
            let joined = cmd.join(" ");
            self.calls.lock().unwrap().push(format!("exec {id} {joined}"));
            match cmd.first().map(String::as_str) {
                Some("openssl") if self.fail_keygen => Ok(ExecOutput {
                    stdout: String::new(),
                    stderr: "openssl: not found".to_owned(),
                    exit_code: Some(127),
                }),
                Some("ssh-keygen") => Ok(Self::ok(format!("{PUBKEY}\n"))),
                Some("psql") if joined.contains("select count(*)") => {
                    let n = self.user_count.load(Ordering::SeqCst);
                    Ok(Self::ok(format!(" count \n-------\n     {n}\n(1 row)\n\n")))
                }
                Some("psql") if joined.contains("update users") => {
                    self.user_count.store(0, Ordering::SeqCst);
                    Ok(Self::ok("UPDATE 1\n"))
                }
                _ => Ok(Self::ok("")),
            }
        }

        async fn wait_container(&self, _id: &str) -> Result<i64, DockerError> {
            Ok(0)
        }

        async fn remove_container(&self, id: &str, force: bool) -> Result<(), DockerError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("remove {id} force={force}"));
            Ok(())
        }

        async fn ping(&self) -> Result<(), DockerError> {
            Ok(())
        }
    }

    /// Inbox double.
    ///
    /// A key login succeeds when the key file is named after the user. With
    /// `reject_first_key_login` the very first key login is rejected, like
    /// the inbox does for a freshly created account.
    pub struct TestConnector {
        pub reject_first_key_login: bool,
        pub password: Option<(String, String)>,
        pub root_entries: Vec<String>,
        pub key_logins: AtomicUsize,
    }

    impl TestConnector {
        pub fn new() -> Self {
            Self {
                reject_first_key_login: false,
                password: None,
                root_entries: vec!["inbox".to_owned()],
                key_logins: AtomicUsize::new(0),
            }
        }
    }

    #[derive(Debug)]
    pub struct TestSession {
        pub entries: Vec<String>,
    }

    impl InboxSession for TestSession {
        async fn list_dir(&mut self, _path: &str) -> Result<Vec<String>, InboxClientError> {
            Ok(self.entries.clone())
        }

        async fn close(self) -> Result<(), InboxClientError> {
            Ok(())
        }
    }

    impl InboxConnector for TestConnector {
        type Session = TestSession;

        async fn connect_with_key(
            &self,
            user: &str,
            key: &Path,
        ) -> Result<TestSession, InboxClientError> {
            let n = self.key_logins.fetch_add(1, Ordering::SeqCst);
            if self.reject_first_key_login && n == 0 {
                return Err(InboxClientError::Rejected(user.to_owned()));
            }
            let expected = format!("{user}.sec");
            if key.file_name().and_then(|f| f.to_str()) != Some(expected.as_str()) {
                return Err(InboxClientError::Rejected(user.to_owned()));
            }
            Ok(TestSession {
                entries: self.root_entries.clone(),
            })
        }

        async fn connect_with_password(
            &self,
            user: &str,
            password: &str,
        ) -> Result<TestSession, InboxClientError> {
            match &self.password {
                Some((u, p)) if u == user && p == password => Ok(TestSession {
                    entries: self.root_entries.clone(),
                }),
                _ => Err(InboxClientError::Rejected(user.to_owned())),
            }
        }
    }
}

use mock::{PUBKEY, TestConnector, TestDockerClient};

/// Fake checkout: trace files plus the CEGA users directory with `john`.
fn checkout(root: &Path) -> HarnessConfig {
    let users = root.join("docker/bootstrap/private/cega/users");
    std::fs::create_dir_all(&users).unwrap();
    std::fs::create_dir_all(root.join("docker/private")).unwrap();
    std::fs::write(users.join("john.yml"), "---\npubkey: ssh-rsa AAAA john\n").unwrap();
    std::fs::write(
        root.join("docker/private/.trace"),
        "DB_USER = lega\nDB_PASSWORD = pw\n",
    )
    .unwrap();
    std::fs::write(
        root.join("docker/bootstrap/private/.trace"),
        "CEGA_USERS_JOHN = j0hn-s3cret\n",
    )
    .unwrap();

    let mut config = HarnessConfig::default();
    config.paths.project_root = root.to_path_buf();
    config.database.expire_delay_ms = 0;
    config
}

fn steps(
    config: HarnessConfig,
    docker: TestDockerClient,
    connector: TestConnector,
) -> (ScenarioSteps<TestDockerClient, TestConnector>, Arc<TestDockerClient>) {
    let docker = Arc::new(docker);
    (
        ScenarioSteps::new(config, Arc::clone(&docker), connector),
        docker,
    )
}

#[tokio::test]
async fn user_with_correct_key_logs_in_and_is_in_database() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let (steps, docker) = steps(checkout(dir.path()), TestDockerClient::new(1), TestConnector::new());
    let mut ctx = ScenarioContext::new();

    steps.i_am_a_user(&mut ctx);
    let account = steps.i_have_an_account_at_central_ega(&mut ctx).await.unwrap();
    steps.i_have_correct_private_key(&mut ctx).unwrap();

    // When
    steps.i_connect_with_private_key(&mut ctx).await.unwrap();

    // Then
    steps.i_am_logged_in_successfully(&ctx).unwrap();
    steps.i_am_in_the_local_database(&ctx).await.unwrap();
    assert!(ctx.has_session());

    let user = ctx.user().unwrap().to_owned();
    let record = std::fs::read_to_string(&account.record).unwrap();
    assert_eq!(record, format!("---\npubkey: {PUBKEY}\n"));
    assert!(
        docker
            .calls()
            .iter()
            .any(|c| c.contains(&format!("elixir_id = '{user}'")))
    );
    // temporary key worker was force-removed
    assert!(docker.calls().contains(&"remove beef force=true".to_owned()));
}

#[tokio::test]
async fn incorrect_key_fails_and_user_stays_out_of_database() {
    let dir = tempfile::tempdir().unwrap();
    let (steps, _) = steps(checkout(dir.path()), TestDockerClient::new(0), TestConnector::new());
    let mut ctx = ScenarioContext::new();

    steps.i_am_a_user(&mut ctx);
    steps.i_have_an_account_at_central_ega(&mut ctx).await;
    steps.i_have_incorrect_private_key(&mut ctx);
    steps.i_connect_with_private_key(&mut ctx).await.unwrap();

    steps.authentication_fails(&ctx).unwrap();
    steps.i_am_not_in_the_local_database(&ctx).await.unwrap();
    assert!(ctx.private_key().unwrap().ends_with("john.sec"));
    assert!(!ctx.has_session());

    let err = steps.i_am_logged_in_successfully(&ctx).unwrap_err();
    assert!(matches!(err, StepError::Assertion(_)));
}

#[tokio::test]
async fn rejected_first_attempt_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let connector = TestConnector {
        reject_first_key_login: true,
        ..TestConnector::new()
    };
    let (steps, _) = steps(checkout(dir.path()), TestDockerClient::new(1), connector);
    let mut ctx = ScenarioContext::new();

    steps.i_am_a_user(&mut ctx);
    steps.i_have_an_account_at_central_ega(&mut ctx).await;
    steps.i_have_correct_private_key(&mut ctx).unwrap();
    steps.i_connect_with_private_key(&mut ctx).await.unwrap();

    steps.i_am_logged_in_successfully(&ctx).unwrap();
    assert_eq!(
        steps
            .authenticator()
            .connector()
            .key_logins
            .load(std::sync::atomic::Ordering::SeqCst),
        2
    );
}

#[tokio::test]
async fn expired_account_is_removed_from_database() {
    let dir = tempfile::tempdir().unwrap();
    let (steps, docker) = steps(checkout(dir.path()), TestDockerClient::new(1), TestConnector::new());
    let mut ctx = ScenarioContext::new();

    steps.i_am_a_user(&mut ctx);
    steps.i_have_an_account_at_central_ega(&mut ctx).await;
    steps.i_have_correct_private_key(&mut ctx).unwrap();
    steps.my_account_expires(&mut ctx).await;

    let user = ctx.user().unwrap().to_owned();
    assert!(docker.calls().iter().any(|c| c.ends_with(&format!(
        "update users set expiration = '1 second' where elixir_id = '{user}'"
    ))));
    steps.i_am_not_in_the_local_database(&ctx).await.unwrap();
    assert!(steps.i_am_in_the_local_database(&ctx).await.is_err());
}

#[tokio::test]
async fn failed_provisioning_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let docker = TestDockerClient {
        fail_keygen: true,
        ..TestDockerClient::new(0)
    };
    let (steps, docker) = steps(checkout(dir.path()), docker, TestConnector::new());
    let mut ctx = ScenarioContext::new();

    steps.i_am_a_user(&mut ctx);
    assert!(steps.i_have_an_account_at_central_ega(&mut ctx).await.is_none());
    assert!(docker.calls().contains(&"remove beef force=true".to_owned()));

    let user = ctx.user().unwrap().to_owned();
    assert!(!dir
        .path()
        .join(format!("docker/bootstrap/private/cega/users/{user}.yml"))
        .exists());
}

#[tokio::test]
async fn steps_before_user_is_set_report_missing_user() {
    let dir = tempfile::tempdir().unwrap();
    let (steps, _) = steps(checkout(dir.path()), TestDockerClient::new(0), TestConnector::new());
    let mut ctx = ScenarioContext::new();

    let err = steps.i_have_correct_private_key(&mut ctx).unwrap_err();
    assert_eq!(err.to_string(), "user not set");
    assert!(steps.i_have_an_account_at_central_ega(&mut ctx).await.is_none());
}

#[tokio::test]
async fn password_login_lists_inbox_root() {
    let dir = tempfile::tempdir().unwrap();
    let connector = TestConnector {
        password: Some(("john".to_owned(), "j0hn-s3cret".to_owned())),
        ..TestConnector::new()
    };
    let (steps, _) = steps(checkout(dir.path()), TestDockerClient::new(0), connector);
    let mut ctx = ScenarioContext::new();

    steps.i_have_username_and_password(&mut ctx).await.unwrap();
    assert_eq!(ctx.user().unwrap(), "john");
    assert_eq!(ctx.password().unwrap(), "j0hn-s3cret");

    steps.i_connect_with_password(&mut ctx).await.unwrap();
    assert!(!ctx.authentication_failed());
    steps.the_operation_is_successful(&mut ctx).await.unwrap();
}

#[tokio::test]
async fn wrong_password_leaves_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let connector = TestConnector {
        password: Some(("john".to_owned(), "other".to_owned())),
        ..TestConnector::new()
    };
    let (steps, _) = steps(checkout(dir.path()), TestDockerClient::new(0), connector);
    let mut ctx = ScenarioContext::new();

    steps.i_have_username_and_password(&mut ctx).await.unwrap();
    steps.i_connect_with_password(&mut ctx).await.unwrap();
    assert!(ctx.authentication_failed());

    let err = steps.the_operation_is_successful(&mut ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "session not set");
}

#[tokio::test]
async fn unexpected_root_entry_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let connector = TestConnector {
        password: Some(("john".to_owned(), "j0hn-s3cret".to_owned())),
        root_entries: vec!["outbox".to_owned(), "inbox".to_owned()],
        ..TestConnector::new()
    };
    let (steps, _) = steps(checkout(dir.path()), TestDockerClient::new(0), connector);
    let mut ctx = ScenarioContext::new();

    steps.i_have_username_and_password(&mut ctx).await.unwrap();
    steps.i_connect_with_password(&mut ctx).await.unwrap();
    let err = steps.the_operation_is_successful(&mut ctx).await.unwrap_err();
    assert!(err.to_string().contains("outbox"));
}

#[tokio::test]
async fn missing_trace_file_is_reported_by_database_steps() {
    let dir = tempfile::tempdir().unwrap();
    let config = checkout(dir.path());
    std::fs::remove_file(dir.path().join("docker/private/.trace")).unwrap();
    let (steps, _) = steps(config, TestDockerClient::new(1), TestConnector::new());
    let mut ctx = ScenarioContext::new();

    steps.i_am_a_user(&mut ctx);
    let err = steps.i_am_in_the_local_database(&ctx).await.unwrap_err();
    assert!(matches!(err, StepError::Credentials(_)));
}
