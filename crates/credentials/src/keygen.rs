//! RSA keypair provisioning for Central EGA test accounts.
//!
//! Keys are generated inside a throwaway worker container so the host needs
//! no OpenSSL tooling: the CEGA users directory is bind-mounted into the
//! worker, `openssl` writes the PEM keypair there, and `ssh-keygen` converts
//! the public half to OpenSSH format for the user's YAML record.

use std::path::PathBuf;

use tracing::{info, warn};
use uuid::Uuid;

use lega_e2e_core::types::Bind;
use lega_e2e_docker::{DockerClient, DockerHarness, TemporaryWorker};

use crate::cega::CegaUsers;
use crate::error::CredentialsError;

/// Result of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedAccount {
    pub user: String,
    /// Host path of the PEM private key
    pub private_key: PathBuf,
    /// Host path of the `<user>.yml` record
    pub record: PathBuf,
    /// OpenSSH public key as written to the record
    pub public_key: String,
}

/// Creates CEGA accounts with fresh RSA keypairs.
pub struct KeyProvisioner<D: DockerClient> {
    harness: DockerHarness<D>,
    users: CegaUsers,
    key_bits: u32,
}

impl<D: DockerClient> KeyProvisioner<D> {
    pub fn new(harness: DockerHarness<D>, users: CegaUsers, key_bits: u32) -> Self {
        Self {
            harness,
            users,
            key_bits,
        }
    }

    pub fn users(&self) -> &CegaUsers {
        &self.users
    }

    /// Generates a keypair for `user` and writes its CEGA record.
    ///
    /// `data_folder` names the mount point (`/<data_folder>`) of the users
    /// directory inside the worker. The worker is force-removed whether or
    /// not generation succeeds.
    pub async fn provision(
        &self,
        user: &str,
        data_folder: &str,
    ) -> Result<ProvisionedAccount, CredentialsError> {
        let name = Uuid::new_v4().to_string();
        let bind = Bind::new(self.users.dir(), format!("/{data_folder}"));
        let worker = self.harness.start_temporary_worker(&name, bind).await?;

        let result = self.generate(&worker, user, data_folder).await;
        self.harness.remove_worker(&worker).await;

        match &result {
            Ok(account) => info!(user = %user, key = %account.private_key.display(), "cega account provisioned"),
            Err(e) => warn!(user = %user, error = %e, "cega account provisioning failed"),
        }
        result
    }

    async fn generate(
        &self,
        worker: &TemporaryWorker,
        user: &str,
        data_folder: &str,
    ) -> Result<ProvisionedAccount, CredentialsError> {
        let container = worker.container();
        let sec = format!("/{data_folder}/{user}.sec");
        let public = format!("/{data_folder}/{user}.pub");
        let pass = format!("pass:{}", Uuid::new_v4().simple());
        let bits = self.key_bits.to_string();

        let (sec, public, pass) = (sec.as_str(), public.as_str(), pass.as_str());
        let steps: [&[&str]; 3] = [
            &["openssl", "genrsa", "-out", sec, "-passout", pass, bits.as_str()],
            &[
                "openssl", "rsa", "-in", sec, "-passin", pass, "-pubout", "-out", public,
            ],
            &["chmod", "400", sec],
        ];
        for step in steps {
            self.harness
                .execute_checked(&container, step)
                .await
                .map_err(|e| key_error(user, e))?;
        }

        let public_key = self
            .harness
            .execute_checked(&container, &["ssh-keygen", "-i", "-mPKCS8", "-f", public])
            .await
            .map_err(|e| key_error(user, e))?;
        let public_key = public_key.trim();
        if public_key.is_empty() {
            return Err(key_error(user, "ssh-keygen produced no public key"));
        }

        let record = self.users.write_user(user, public_key).await?;

        Ok(ProvisionedAccount {
            user: user.to_owned(),
            private_key: self.users.private_key_path(user),
            record,
            public_key: public_key.to_owned(),
        })
    }
}

fn key_error(user: &str, reason: impl std::fmt::Display) -> CredentialsError {
    CredentialsError::KeyGeneration {
        user: user.to_owned(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use lega_e2e_core::types::{ContainerInfo, ExecOutput};
    use lega_e2e_docker::{ContainerSpec, DockerError, WorkerSettings};

    const PUBKEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAABAQDx\n";

    /// openssl/ssh-keygen 실행을 흉내 내는 Docker 대역
    #[derive(Default)]
    struct StubDocker {
        /// 이 명령으로 시작하는 exec는 exit 1로 실패
        failing: Option<&'static str>,
        ssh_keygen_stdout: String,
        calls: Mutex<Vec<String>>,
    }

    impl StubDocker {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DockerClient for StubDocker {
        async fn list_containers(&self, _all: bool) -> Result<Vec<ContainerInfo>, DockerError> {
            Ok(Vec::new())
        }

        async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DockerError> {
            let binds: Vec<String> = spec.binds.iter().map(ToString::to_string).collect();
            self.calls
                .lock()
                .unwrap()
                .push(format!("create {} {}", spec.cmd.join(" "), binds.join(",")));
            Ok("feed01".to_owned())
        }

        async fn start_container(&self, _id: &str) -> Result<(), DockerError> {
            Ok(())
        }

        async fn exec(&self, _id: &str, cmd: &[String]) -> Result<ExecOutput, DockerError> {
            let joined = cmd.join(" ");
            self.calls.lock().unwrap().push(format!("exec {joined}"));
            if self.failing.is_some_and(|f| joined.starts_with(f)) {
                return Ok(ExecOutput {
                    stdout: String::new(),
                    stderr: "unable to write key".to_owned(),
                    exit_code: Some(1),
                });
            }
            let stdout = if joined.starts_with("ssh-keygen") {
                self.ssh_keygen_stdout.clone()
            } else {
                String::new()
            };
            Ok(ExecOutput {
                stdout,
                stderr: String::new(),
                exit_code: Some(0),
            })
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

    fn provisioner(
        docker: StubDocker,
        dir: &std::path::Path,
    ) -> (KeyProvisioner<StubDocker>, Arc<StubDocker>) {
        let docker = Arc::new(docker);
        let settings = WorkerSettings {
            image: "nbis/ega:worker".to_owned(),
            gpg_dir: PathBuf::from("/srv/gpg"),
            gpg_mount: "/root/.gnupg".to_owned(),
            keepalive_secs: 1000,
        };
        let harness = DockerHarness::new(Arc::clone(&docker), settings);
        (
            KeyProvisioner::new(harness, CegaUsers::new(dir), 2048),
            docker,
        )
    }

    #[tokio::test]
    async fn provision_generates_keys_and_writes_record() {
        let dir = tempfile::tempdir().unwrap();
        let (p, docker) = provisioner(
            StubDocker {
                ssh_keygen_stdout: PUBKEY.to_owned(),
                ..StubDocker::default()
            },
            dir.path(),
        );

        let account = p.provision("alice", "data").await.unwrap();
        assert_eq!(account.user, "alice");
        assert_eq!(account.private_key, dir.path().join("alice.sec"));
        assert_eq!(account.record, dir.path().join("alice.yml"));
        assert_eq!(account.public_key, PUBKEY.trim());

        let record = p.users().read_user("alice").await.unwrap();
        assert_eq!(record.pubkey.as_deref(), Some(PUBKEY.trim()));

        let calls = docker.calls();
        assert!(calls[0].starts_with("create sleep 1000 "));
        assert!(calls[0].ends_with(":/data"));
        assert!(calls[1].starts_with("exec openssl genrsa -out /data/alice.sec -passout pass:"));
        assert!(calls[1].ends_with(" 2048"));
        assert!(calls[2].contains("-pubout -out /data/alice.pub"));
        assert_eq!(calls[3], "exec chmod 400 /data/alice.sec");
        assert_eq!(calls[4], "exec ssh-keygen -i -mPKCS8 -f /data/alice.pub");
        assert_eq!(calls.last().unwrap(), "remove feed01 force=true");
    }

    #[tokio::test]
    async fn passphrase_is_shared_between_genrsa_and_rsa() {
        let dir = tempfile::tempdir().unwrap();
        let (p, docker) = provisioner(
            StubDocker {
                ssh_keygen_stdout: PUBKEY.to_owned(),
                ..StubDocker::default()
            },
            dir.path(),
        );
        p.provision("bob", "data").await.unwrap();

        let calls = docker.calls();
        let pass_of = |call: &str| {
            call.split_whitespace()
                .find(|t| t.starts_with("pass:"))
                .map(str::to_owned)
        };
        let genrsa = pass_of(&calls[1]).unwrap();
        assert_eq!(Some(genrsa.clone()), pass_of(&calls[2]));
        assert!(genrsa.len() > "pass:".len());
    }

    #[tokio::test]
    async fn failed_step_removes_worker_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (p, docker) = provisioner(
            StubDocker {
                failing: Some("openssl rsa"),
                ..StubDocker::default()
            },
            dir.path(),
        );

        let err = p.provision("alice", "data").await.unwrap_err();
        assert!(matches!(err, CredentialsError::KeyGeneration { ref user, .. } if user == "alice"));
        assert!(!dir.path().join("alice.yml").exists());

        let calls = docker.calls();
        assert!(!calls.iter().any(|c| c.starts_with("exec chmod")));
        assert_eq!(calls.last().unwrap(), "remove feed01 force=true");
    }

    #[tokio::test]
    async fn default_config_binds_absolute_host_paths() {
        let config = lega_e2e_core::config::HarnessConfig::default();
        let docker = Arc::new(StubDocker::default());
        let harness = DockerHarness::new(Arc::clone(&docker), WorkerSettings::from_config(&config));
        let p = KeyProvisioner::new(
            harness.clone(),
            CegaUsers::new(config.paths.cega_users_dir()),
            config.credentials.key_bits,
        );

        // no public key comes back, so nothing is written to the host
        let _ = p.provision("alice", "data").await;
        harness
            .spawn_worker_and_execute(&config.paths.cega_users_dir(), "/data", &["true"])
            .await
            .unwrap();

        let binds: Vec<String> = docker
            .calls()
            .iter()
            .filter_map(|c| c.strip_prefix("create "))
            .flat_map(|c| c.rsplit(' ').next().unwrap_or_default().split(','))
            .map(str::to_owned)
            .collect();
        assert_eq!(binds.len(), 3, "{binds:?}");
        for bind in &binds {
            assert!(bind.starts_with('/'), "relative host path: {bind}");
            assert!(!bind.contains("/../"), "unnormalized host path: {bind}");
        }
    }

    #[tokio::test]
    async fn empty_public_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (p, docker) = provisioner(StubDocker::default(), dir.path());

        let err = p.provision("alice", "data").await.unwrap_err();
        assert!(err.to_string().contains("no public key"));
        assert_eq!(docker.calls().last().unwrap(), "remove feed01 force=true");
    }
}
