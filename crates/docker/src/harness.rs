//! 컨테이너 유틸리티 -- 테스트 단계에서 사용하는 Docker 작업 모음
//!
//! [`DockerHarness`]는 이미지/이름으로 컨테이너 찾기, 컨테이너 내부 명령 실행,
//! 일회성 worker 실행, 임시 worker 관리 기능을 제공합니다.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use lega_e2e_core::config::HarnessConfig;
use lega_e2e_core::types::{Bind, ContainerInfo};

use crate::client::{ContainerSpec, DockerClient};
use crate::error::DockerError;

/// worker 컨테이너 생성 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// worker 이미지
    pub image: String,
    /// 호스트 GPG 디렉토리
    pub gpg_dir: std::path::PathBuf,
    /// worker 내부 GPG 마운트 지점
    pub gpg_mount: String,
    /// 임시 worker `sleep` 시간 (초)
    pub keepalive_secs: u64,
}

impl WorkerSettings {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            image: config.docker.worker_image.clone(),
            gpg_dir: config.paths.gpg_dir(),
            gpg_mount: config.docker.gpg_mount.clone(),
            keepalive_secs: config.docker.keepalive_secs,
        }
    }
}

/// 이름으로 생성되어 `sleep`으로 유지되는 임시 worker
///
/// 사용이 끝나면 [`DockerHarness::remove_worker`]로 제거해야 합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryWorker {
    pub id: String,
    pub name: String,
    pub image: String,
}

impl TemporaryWorker {
    /// exec 대상으로 사용할 컨테이너 정보
    pub fn container(&self) -> ContainerInfo {
        ContainerInfo {
            id: self.id.clone(),
            names: vec![format!("/{}", self.name)],
            image: self.image.clone(),
            state: "running".to_owned(),
        }
    }
}

/// Docker 작업 모음
pub struct DockerHarness<D: DockerClient> {
    docker: Arc<D>,
    worker: WorkerSettings,
}

impl<D: DockerClient> Clone for DockerHarness<D> {
    fn clone(&self) -> Self {
        Self {
            docker: Arc::clone(&self.docker),
            worker: self.worker.clone(),
        }
    }
}

impl<D: DockerClient> DockerHarness<D> {
    pub fn new(docker: Arc<D>, worker: WorkerSettings) -> Self {
        Self { docker, worker }
    }

    pub fn docker(&self) -> &Arc<D> {
        &self.docker
    }

    pub fn worker_settings(&self) -> &WorkerSettings {
        &self.worker
    }

    /// 이미지와 이름이 모두 일치하는 실행 중인 컨테이너를 찾습니다.
    ///
    /// # Errors
    ///
    /// 일치하는 컨테이너가 없으면 `DockerError::ContainerNotFound`를 반환합니다.
    pub async fn find_container(&self, image: &str, name: &str) -> Result<ContainerInfo, DockerError> {
        let containers = self.docker.list_containers(false).await?;
        containers
            .into_iter()
            .find(|c| c.image == image && c.has_name(name))
            .ok_or_else(|| DockerError::ContainerNotFound(format!("{name} (image {image})")))
    }

    /// 컨테이너 내부에서 명령을 실행하고 stdout을 반환합니다.
    ///
    /// 종료 코드가 0이 아니어도 출력을 그대로 반환하고 경고만 남깁니다.
    pub async fn execute_within_container(
        &self,
        container: &ContainerInfo,
        command: &[&str],
    ) -> Result<String, DockerError> {
        let cmd: Vec<String> = command.iter().map(|s| (*s).to_owned()).collect();
        debug!(container_id = %container.short_id(), command = %cmd.join(" "), "exec");

        let output = self.docker.exec(&container.id, &cmd).await?;
        if !output.stderr.is_empty() {
            debug!(container_id = %container.short_id(), stderr = %output.stderr.trim_end(), "exec stderr");
        }
        if !output.success() {
            warn!(
                container_id = %container.short_id(),
                exit_code = ?output.exit_code,
                command = %cmd.join(" "),
                "command exited with non-zero status"
            );
        }
        Ok(output.stdout)
    }

    /// [`execute_within_container`](Self::execute_within_container)와 같지만
    /// 종료 코드가 0이 아니면 `DockerError::ExecFailed`를 반환합니다.
    pub async fn execute_checked(
        &self,
        container: &ContainerInfo,
        command: &[&str],
    ) -> Result<String, DockerError> {
        let cmd: Vec<String> = command.iter().map(|s| (*s).to_owned()).collect();
        let output = self.docker.exec(&container.id, &cmd).await?;
        if !output.success() {
            return Err(DockerError::ExecFailed {
                container_id: container.id.clone(),
                reason: format!(
                    "`{}` exited with {:?}: {}",
                    cmd.join(" "),
                    output.exit_code,
                    output.stderr.trim_end()
                ),
            });
        }
        Ok(output.stdout)
    }

    /// worker 컨테이너를 띄워 `from`을 `to`에 마운트하고 명령을 실행합니다.
    ///
    /// GPG 디렉토리는 읽기 전용으로 함께 마운트됩니다. 컨테이너는 종료까지
    /// 기다린 뒤 성공 여부와 관계없이 제거되며, 종료 코드를 반환합니다.
    pub async fn spawn_worker_and_execute(
        &self,
        from: &Path,
        to: &str,
        command: &[&str],
    ) -> Result<i64, DockerError> {
        let spec = ContainerSpec::new(&self.worker.image)
            .cmd(command.iter().copied())
            .bind(Bind::new(from, to))
            .bind(Bind::new(&self.worker.gpg_dir, &self.worker.gpg_mount).read_only());

        let id = self.docker.create_container(&spec).await?;
        info!(container_id = %id, image = %self.worker.image, "spawned worker");

        let result = async {
            self.docker.start_container(&id).await?;
            self.docker.wait_container(&id).await
        }
        .await;

        if let Err(e) = self.docker.remove_container(&id, false).await {
            warn!(container_id = %id, error = %e, "failed to remove worker");
        }

        let code = result?;
        debug!(container_id = %id, exit_code = code, "worker finished");
        Ok(code)
    }

    /// `sleep <keepalive>`로 유지되는 이름 있는 worker를 시작합니다.
    pub async fn start_temporary_worker(
        &self,
        name: &str,
        bind: Bind,
    ) -> Result<TemporaryWorker, DockerError> {
        let keepalive = self.worker.keepalive_secs.to_string();
        let spec = ContainerSpec::new(&self.worker.image)
            .name(name)
            .cmd(["sleep", keepalive.as_str()])
            .bind(bind);

        let id = self.docker.create_container(&spec).await?;
        let worker = TemporaryWorker {
            id,
            name: name.to_owned(),
            image: self.worker.image.clone(),
        };

        if let Err(e) = self.docker.start_container(&worker.id).await {
            self.remove_worker(&worker).await;
            return Err(e);
        }

        info!(container_id = %worker.id, name = %worker.name, "temporary worker started");
        Ok(worker)
    }

    /// 임시 worker를 강제로 제거합니다. 실패는 로그만 남깁니다.
    pub async fn remove_worker(&self, worker: &TemporaryWorker) {
        match self.docker.remove_container(&worker.id, true).await {
            Ok(()) => debug!(container_id = %worker.id, "temporary worker removed"),
            Err(e) => warn!(container_id = %worker.id, error = %e, "failed to remove temporary worker"),
        }
    }
}
