//! Docker API abstraction for testability.
//!
//! The [`DockerClient`] trait abstracts the bollard Docker API, allowing
//! production code to use [`BollardDockerClient`] while tests use `MockDockerClient`.
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────┐
//!   │ DockerHarness│
//!   └──────┬───────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │DockerClient │ (trait)
//!   └─────────────┘
//!        │     │
//!        ▼     ▼
//!   ┌───────┐ ┌────┐
//!   │Bollard│ │Mock│
//!   └───┬───┘ └────┘
//!       │
//!       ▼
//!   Docker Daemon
//! ```
//!
//! # Container ID Validation
//!
//! Methods that take a container ID (rather than a name) validate it first:
//! - Must be 1-64 characters
//! - Must contain only ASCII hex digits ([0-9a-fA-F])

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use lega_e2e_core::types::{Bind, ContainerInfo, ExecOutput};

use crate::error::DockerError;

/// Container IDs are 1-64 hex digits.
fn validate_container_id(id: &str) -> Result<(), DockerError> {
    if id.is_empty() || id.len() > 64 {
        return Err(DockerError::DockerApi(format!(
            "invalid container ID: length {} (must be 1-64)",
            id.len()
        )));
    }
    if !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DockerError::DockerApi(
            "invalid container ID: contains non-hex characters".to_owned(),
        ));
    }
    Ok(())
}

/// What to create: image, optional name, command and bind mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name (`None` lets Docker pick one)
    pub name: Option<String>,
    pub image: String,
    pub cmd: Vec<String>,
    pub binds: Vec<Bind>,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = cmd.into_iter().map(Into::into).collect();
        self
    }

    pub fn bind(mut self, bind: Bind) -> Self {
        self.binds.push(bind);
        self
    }
}

/// Trait abstracting the Docker API operations the harness needs.
///
/// The trait is `Send + Sync + 'static`, allowing it to be shared behind an `Arc`.
///
/// # Error Handling
///
/// - **Connection errors**: `DockerError::DockerConnection`
/// - **Exec errors**: `DockerError::ExecFailed`
/// - **Everything else**: `DockerError::DockerApi`
pub trait DockerClient: Send + Sync + 'static {
    /// Lists containers. With `all = false` only running containers are returned.
    fn list_containers(
        &self,
        all: bool,
    ) -> impl Future<Output = Result<Vec<ContainerInfo>, DockerError>> + Send;

    /// Creates a container and returns its ID. The container is not started.
    fn create_container(
        &self,
        spec: &ContainerSpec,
    ) -> impl Future<Output = Result<String, DockerError>> + Send;

    /// Starts a created container.
    fn start_container(&self, id: &str) -> impl Future<Output = Result<(), DockerError>> + Send;

    /// Runs a command inside a running container.
    ///
    /// Both stdout and stderr are attached and collected until the command
    /// exits. A non-zero exit code is reported in [`ExecOutput::exit_code`],
    /// not as an error.
    fn exec(
        &self,
        id: &str,
        cmd: &[String],
    ) -> impl Future<Output = Result<ExecOutput, DockerError>> + Send;

    /// Blocks until the container exits and returns its status code.
    fn wait_container(&self, id: &str) -> impl Future<Output = Result<i64, DockerError>> + Send;

    /// Removes a container. `force` kills it first if it is still running.
    fn remove_container(
        &self,
        id: &str,
        force: bool,
    ) -> impl Future<Output = Result<(), DockerError>> + Send;

    /// Checks Docker daemon connectivity.
    fn ping(&self) -> impl Future<Output = Result<(), DockerError>> + Send;
}

/// Production Docker client implementation using `bollard`.
///
/// Communicates with the Docker daemon via a Unix socket or the platform
/// default. Internally uses `Arc<bollard::Docker>` for cheap sharing.
///
/// # Examples
///
/// ```ignore
/// use lega_e2e_docker::BollardDockerClient;
///
/// let client = BollardDockerClient::connect_local()?;
/// let client = BollardDockerClient::connect_with_socket("/run/docker.sock")?;
/// # Ok::<(), lega_e2e_docker::DockerError>(())
/// ```
#[derive(Clone)]
pub struct BollardDockerClient {
    docker: Arc<bollard::Docker>,
}

impl BollardDockerClient {
    /// Connects to Docker using the default local socket.
    ///
    /// # Errors
    ///
    /// Returns `DockerError::DockerConnection` if the connection fails
    /// (e.g., socket not found, permission denied, daemon not running).
    pub fn connect_local() -> Result<Self, DockerError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            DockerError::DockerConnection(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Connects to Docker using a specific socket path.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, DockerError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    DockerError::DockerConnection(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Connects to `socket` when given, otherwise to the platform default.
    pub fn connect(socket: &str) -> Result<Self, DockerError> {
        if socket.is_empty() {
            Self::connect_local()
        } else {
            Self::connect_with_socket(socket)
        }
    }
}

impl DockerClient for BollardDockerClient {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerInfo>, DockerError> {
        use bollard::container::ListContainersOptions;

        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| DockerError::DockerApi(format!("list containers failed: {e}")))?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerInfo {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DockerError> {
        use bollard::container::{Config, CreateContainerOptions};
        use bollard::models::HostConfig;

        let options = spec.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });
        let binds: Vec<String> = spec.binds.iter().map(ToString::to_string).collect();
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            host_config: Some(HostConfig {
                binds: Some(binds),
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(options, config)
            .await
            .map_err(|e| {
                DockerError::DockerApi(format!("create container from {} failed: {e}", spec.image))
            })?;

        for warning in &response.warnings {
            tracing::warn!(container_id = %response.id, warning = %warning, "docker create warning");
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        validate_container_id(id)?;

        use bollard::container::StartContainerOptions;

        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| DockerError::DockerApi(format!("start container {id} failed: {e}")))
    }

    async fn exec(&self, id: &str, cmd: &[String]) -> Result<ExecOutput, DockerError> {
        validate_container_id(id)?;

        use bollard::container::LogOutput;
        use bollard::exec::{CreateExecOptions, StartExecResults};

        let exec = self
            .docker
            .create_exec(
                id,
                CreateExecOptions::<String> {
                    cmd: Some(cmd.to_vec()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| DockerError::ExecFailed {
                container_id: id.to_owned(),
                reason: format!("create exec failed: {e}"),
            })?;

        let mut result = ExecOutput::default();

        let started = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| DockerError::ExecFailed {
                container_id: id.to_owned(),
                reason: format!("start exec failed: {e}"),
            })?;

        if let StartExecResults::Attached { mut output, .. } = started {
            while let Some(chunk) = output.next().await {
                let chunk = chunk.map_err(|e| DockerError::ExecFailed {
                    container_id: id.to_owned(),
                    reason: format!("reading exec output failed: {e}"),
                })?;
                match chunk {
                    LogOutput::StdOut { message } => {
                        result.stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    LogOutput::StdErr { message } => {
                        result.stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    _ => {}
                }
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| DockerError::ExecFailed {
                container_id: id.to_owned(),
                reason: format!("inspect exec failed: {e}"),
            })?;
        result.exit_code = inspect.exit_code;

        Ok(result)
    }

    async fn wait_container(&self, id: &str) -> Result<i64, DockerError> {
        validate_container_id(id)?;

        use bollard::container::WaitContainerOptions;

        let mut stream = self
            .docker
            .wait_container(id, None::<WaitContainerOptions<String>>);

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports a non-zero exit as an error; the harness only wants the code
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(DockerError::DockerApi(format!(
                "wait container {id} failed: {e}"
            ))),
            None => Err(DockerError::DockerApi(format!(
                "wait container {id}: stream ended without a status"
            ))),
        }
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), DockerError> {
        validate_container_id(id)?;

        use bollard::container::RemoveContainerOptions;

        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| DockerError::DockerApi(format!("remove container {id} failed: {e}")))
    }

    async fn ping(&self) -> Result<(), DockerError> {
        self.docker
            .ping()
            .await
            .map_err(|e| DockerError::DockerConnection(format!("ping failed: {e}")))?;
        Ok(())
    }
}

/// 테스트용 Mock Docker 클라이언트
///
/// 명령별로 미리 설정한 출력을 반환하고, 호출 내역을 기록합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockDockerClient {
    /// list_containers 호출 시 반환할 컨테이너 목록
    pub containers: Vec<ContainerInfo>,
    /// 명령 첫 토큰(또는 전체 명령) → 출력
    pub exec_outputs: std::collections::HashMap<String, ExecOutput>,
    /// wait_container가 반환할 종료 코드
    pub wait_code: i64,
    /// create_container 실패 시뮬레이션
    pub fail_create: bool,
    /// 호출 기록
    pub calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockDockerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers(mut self, containers: Vec<ContainerInfo>) -> Self {
        self.containers = containers;
        self
    }

    pub fn with_exec_output(mut self, key: &str, stdout: &str) -> Self {
        self.exec_outputs.insert(
            key.to_owned(),
            ExecOutput {
                stdout: stdout.to_owned(),
                stderr: String::new(),
                exit_code: Some(0),
            },
        );
        self
    }

    pub fn with_exec_failure(mut self, key: &str, code: i64) -> Self {
        self.exec_outputs.insert(
            key.to_owned(),
            ExecOutput {
                stdout: String::new(),
                stderr: "mock failure".to_owned(),
                exit_code: Some(code),
            },
        );
        self
    }

    pub fn with_failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[cfg(test)]
impl DockerClient for MockDockerClient {
    async fn list_containers(&self, _all: bool) -> Result<Vec<ContainerInfo>, DockerError> {
        self.record("list".to_owned());
        Ok(self.containers.clone())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DockerError> {
        self.record(format!("create {}", spec.image));
        if self.fail_create {
            return Err(DockerError::DockerApi("mock create failure".to_owned()));
        }
        Ok("0123456789ab".to_owned())
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.record(format!("start {id}"));
        Ok(())
    }

    async fn exec(&self, id: &str, cmd: &[String]) -> Result<ExecOutput, DockerError> {
        let joined = cmd.join(" ");
        self.record(format!("exec {id} {joined}"));
        let first = cmd.first().cloned().unwrap_or_default();
        Ok(self
            .exec_outputs
            .get(&joined)
            .or_else(|| self.exec_outputs.get(&first))
            .cloned()
            .unwrap_or_else(|| ExecOutput {
                exit_code: Some(0),
                ..ExecOutput::default()
            }))
    }

    async fn wait_container(&self, id: &str) -> Result<i64, DockerError> {
        self.record(format!("wait {id}"));
        Ok(self.wait_code)
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), DockerError> {
        self.record(format!("remove {id} force={force}"));
        Ok(())
    }

    async fn ping(&self) -> Result<(), DockerError> {
        Ok(())
    }
}
